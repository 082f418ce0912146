//! Document-scoped rules: cross-paragraph consistency checks, run once per
//! pass against the full ordered paragraph list.

mod numeral_style;
mod style_mixing;


use crate::Rule;

pub(crate) fn rules() -> Vec<Rule> {
    vec![style_mixing::rule(), numeral_style::rule()]
}
