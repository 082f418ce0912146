//! Character-class and digit-width helpers shared by the built-in rules.

/// Katakana proper (U+30A1..=U+30FA), iteration marks, middle dot and the
/// long-vowel mark, plus the half-width forms.
pub fn is_katakana(c: char) -> bool {
    matches!(c, '\u{30A1}'..='\u{30FA}' | 'ー' | '・' | 'ヽ' | 'ヾ' | '\u{FF66}'..='\u{FF9D}' | 'ｰ')
}

pub fn is_hiragana(c: char) -> bool {
    matches!(c, '\u{3041}'..='\u{3096}' | 'ゝ' | 'ゞ')
}

pub fn is_fullwidth_digit(c: char) -> bool {
    matches!(c, '０'..='９')
}

/// Parse a run of digits that may mix half-width and full-width forms.
/// Returns `None` on empty input or any non-digit char.
pub fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() {
        return None;
    }
    let mut value: u32 = 0;
    for c in s.chars() {
        let digit = if c.is_ascii_digit() {
            c as u32 - '0' as u32
        } else if is_fullwidth_digit(c) {
            c as u32 - '０' as u32
        } else {
            return None;
        };
        value = value.checked_mul(10)?.checked_add(digit)?;
    }
    Some(value)
}

/// Render `value` in the same digit width as `like`: full-width digits when
/// `like` contains any full-width digit, half-width otherwise.
pub fn format_digits_like(value: u32, like: &str) -> String {
    if like.chars().any(is_fullwidth_digit) {
        value
            .to_string()
            .chars()
            .map(|c| char::from_u32('０' as u32 + (c as u32 - '0' as u32)).unwrap_or(c))
            .collect()
    } else {
        value.to_string()
    }
}

/// Convert a digit run to the requested width, leaving non-digits alone.
pub fn convert_digit_width(s: &str, fullwidth: bool) -> String {
    s.chars()
        .map(|c| {
            if fullwidth && c.is_ascii_digit() {
                char::from_u32('０' as u32 + (c as u32 - '0' as u32)).unwrap_or(c)
            } else if !fullwidth && is_fullwidth_digit(c) {
                char::from_u32('0' as u32 + (c as u32 - '０' as u32)).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}
