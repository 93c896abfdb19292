//! Conversion between ISBN-10 and ISBN-13.
//!
//! The catalog is keyed by ISBN-10 while the precomputed similarity table is
//! keyed by ISBN-13, so identifiers are translated in both directions. Every
//! conversion returns `None` on malformed input instead of failing: sparse or
//! garbage identifiers are expected in the similarity data.

/// The only ISBN-13 prefix that has an ISBN-10 equivalent
const BOOKLAND_PREFIX: &str = "978";

/// Removes hyphens and whitespace
fn normalize(input: &str) -> String {
    input
        .chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .collect()
}

fn is_isbn13_shape(s: &str) -> bool {
    s.len() == 13 && s.bytes().all(|b| b.is_ascii_digit())
}

/// Nine digits followed by a digit or `X` (either case)
fn is_isbn10_shape(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes[..9].iter().all(u8::is_ascii_digit)
        && (bytes[9].is_ascii_digit() || bytes[9] == b'X' || bytes[9] == b'x')
}

fn digit_values(s: &str) -> impl Iterator<Item = u32> + '_ {
    s.bytes().map(|b| u32::from(b - b'0'))
}

/// ISBN-13 check digit over the first 12 digits (weights 1,3,1,3,...)
fn isbn13_check_digit(first_twelve: &str) -> u32 {
    let sum: u32 = digit_values(first_twelve)
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { d } else { d * 3 })
        .sum();
    (10 - sum % 10) % 10
}

/// ISBN-10 check character over the first 9 digits (weights 10 down to 2)
fn isbn10_check_char(core: &str) -> char {
    let sum: u32 = digit_values(core)
        .enumerate()
        .map(|(i, d)| (10 - i as u32) * d)
        .sum();
    match 11 - sum % 11 {
        10 => 'X',
        11 => '0',
        n => char::from_digit(n, 10).unwrap_or('0'),
    }
}

/// Converts an ISBN-10 to its ISBN-13 form.
///
/// A string that is already 13 digits is returned as-is. Returns `None` when
/// the input is not shaped like an ISBN-10. The input check character is not
/// verified, only its shape.
pub fn to_isbn13(input: &str) -> Option<String> {
    let clean = normalize(input);

    if is_isbn13_shape(&clean) {
        return Some(clean);
    }

    if !is_isbn10_shape(&clean) {
        return None;
    }

    let mut isbn13 = format!("{}{}", BOOKLAND_PREFIX, &clean[..9]);
    let check = isbn13_check_digit(&isbn13);
    isbn13.push_str(&check.to_string());
    Some(isbn13)
}

/// Converts an ISBN-13 to its ISBN-10 form.
///
/// Any ten-character input is returned as-is, without checking its shape, so
/// catalog keys stored in that form always pass through. Only `978`-prefixed
/// ISBN-13s map to ISBN-10; anything else (including `979`) yields `None`.
pub fn to_isbn10(input: &str) -> Option<String> {
    let clean = normalize(input);

    if clean.chars().count() == 10 {
        return Some(clean);
    }

    if !is_isbn13_shape(&clean) || !clean.starts_with(BOOKLAND_PREFIX) {
        return None;
    }

    let core = &clean[3..12];
    let mut isbn10 = core.to_string();
    isbn10.push(isbn10_check_char(core));
    Some(isbn10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_isbn13_known_checksum() {
        assert_eq!(to_isbn13("0306406152").as_deref(), Some("9780306406153"));
    }

    #[test]
    fn test_to_isbn10_known_checksum() {
        assert_eq!(to_isbn10("9780306406153").as_deref(), Some("0306406152"));
    }

    #[test]
    fn test_to_isbn13_strips_hyphens_and_spaces() {
        assert_eq!(
            to_isbn13("0-306-40615 2").as_deref(),
            Some("9780306406153")
        );
    }

    #[test]
    fn test_to_isbn13_accepts_x_check_character() {
        // 080442957X -> 9780804429573
        assert_eq!(to_isbn13("080442957X").as_deref(), Some("9780804429573"));
        assert_eq!(to_isbn13("080442957x").as_deref(), Some("9780804429573"));
    }

    #[test]
    fn test_to_isbn10_produces_x_check_character() {
        assert_eq!(to_isbn10("9780804429573").as_deref(), Some("080442957X"));
    }

    #[test]
    fn test_to_isbn10_check_zero_from_eleven() {
        // Weighted sum divisible by 11 gives 11 - 0 = 11, which maps to '0'
        assert_eq!(to_isbn10("9780000000002").as_deref(), Some("0000000000"));
    }

    #[test]
    fn test_round_trip_from_isbn10() {
        for isbn10 in ["0306406152", "080442957X", "0451524934", "0140449132"] {
            let isbn13 = to_isbn13(isbn10).unwrap();
            assert_eq!(to_isbn10(&isbn13).as_deref(), Some(isbn10));
        }
    }

    #[test]
    fn test_round_trip_from_isbn13() {
        for isbn13 in ["9780306406153", "9780451524935", "9780140449136"] {
            let isbn10 = to_isbn10(isbn13).unwrap();
            assert_eq!(to_isbn13(&isbn10).as_deref(), Some(isbn13));
        }
    }

    #[test]
    fn test_to_isbn13_is_idempotent() {
        assert_eq!(to_isbn13("9780306406153").as_deref(), Some("9780306406153"));
        assert_eq!(to_isbn13("9790306406153").as_deref(), Some("9790306406153"));
    }

    #[test]
    fn test_to_isbn10_is_idempotent() {
        assert_eq!(to_isbn10("0306406152").as_deref(), Some("0306406152"));
        assert_eq!(to_isbn10("080442957X").as_deref(), Some("080442957X"));
    }

    #[test]
    fn test_invalid_inputs_yield_none() {
        assert_eq!(to_isbn13("abc"), None);
        assert_eq!(to_isbn13(""), None);
        assert_eq!(to_isbn13("03064O6152"), None);
        assert_eq!(to_isbn13("X306406152"), None);
        assert_eq!(to_isbn13("030640615"), None);
        assert_eq!(to_isbn10(""), None);
        assert_eq!(to_isbn10("978030640615"), None);
        assert_eq!(to_isbn10("97803064061a3"), None);
        assert_eq!(to_isbn10("abc"), None);
    }

    #[test]
    fn test_to_isbn10_passes_any_ten_characters_through() {
        assert_eq!(to_isbn10("abcdefghij").as_deref(), Some("abcdefghij"));
        assert_eq!(to_isbn10("03064-0615 2").as_deref(), Some("0306406152"));
        assert_eq!(to_isbn10("ISBN000001").as_deref(), Some("ISBN000001"));
    }

    #[test]
    fn test_to_isbn10_rejects_979_prefix() {
        assert_eq!(to_isbn10("9790306406153"), None);
    }

    #[test]
    fn test_non_ascii_input_does_not_panic() {
        assert_eq!(to_isbn13("０３０６４０６１５２"), None);
        assert_eq!(to_isbn10("ＩＳＢＮ９７８"), None);
    }
}
