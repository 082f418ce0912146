//! Pattern rules: operate on the raw paragraph text (regex and character
//! scanning), no token stream required.

mod conjunction;
mod era_year;
mod long_vowel;
mod punctuation;


use crate::Rule;

pub(crate) fn rules() -> Vec<Rule> {
    vec![conjunction::rule(), era_year::rule(), long_vowel::rule(), punctuation::rule()]
}
