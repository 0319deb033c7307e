// src/models/rut.rs

//! Chilean RUT: numeric body plus a mod-11 check character.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// A validated Chilean RUT.
///
/// The check character is always consistent with the body: both
/// constructors compute it from the digits, and [`Rut::parse`] rejects
/// input whose supplied check character disagrees.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rut {
    body: u32,
    check: char,
}

/// Shape of a full RUT: 1-2 digits, optional dot groups, hyphen, check char.
fn full_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[0-9]{1,2}\.?[0-9]{3}\.?[0-9]{3}-[0-9kK]$").expect("static regex")
    })
}

/// Shape of something that is probably a RUT typed without its check digit.
fn bare_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]{7,9}[0-9k]?$").expect("static regex"))
}

impl Rut {
    /// Parse a RUT from user-supplied text.
    ///
    /// Dots are optional, the hyphen-separated check character is
    /// mandatory and case-insensitive. Returns `None` when the text
    /// does not have the RUT shape or the check character is wrong.
    pub fn parse(text: &str) -> Option<Rut> {
        let text = text.trim();
        if !full_shape().is_match(text) {
            return None;
        }
        let no_dots = text.replace('.', "");
        let (digits, check) = no_dots.split_once('-')?;
        let digits = digits.trim_start_matches('0');
        if digits.is_empty() {
            return None;
        }
        let expected = check_digit(digits);
        let supplied = check.chars().next()?.to_ascii_lowercase();
        if supplied != expected {
            return None;
        }
        Some(Rut {
            body: digits.parse().ok()?,
            check: expected,
        })
    }

    /// Rebuild a RUT from a stored bare body (digits, no check character).
    pub fn from_body(digits: &str) -> Option<Rut> {
        let digits = digits.trim().trim_start_matches('0');
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(Rut {
            body: digits.parse().ok()?,
            check: check_digit(digits),
        })
    }

    /// Rebuild a RUT from a stored numeric body.
    pub fn from_body_number(body: i64) -> Option<Rut> {
        u32::try_from(body).ok().and_then(|b| {
            let digits = b.to_string();
            Some(Rut {
                body: b,
                check: check_digit(&digits),
            })
        })
    }

    /// Whether `text` is probably a RUT typed without its check digit.
    ///
    /// Lets the caller distinguish "add the check digit" from "not a
    /// RUT at all".
    pub fn looks_like(text: &str) -> bool {
        let clean = text.replace('.', "");
        bare_shape().is_match(clean.trim())
    }

    /// Numeric body without the check character.
    pub fn body(&self) -> u32 {
        self.body
    }

    /// Check character: `'0'..='9'` or `'k'`.
    pub fn check(&self) -> char {
        self.check
    }
}

impl fmt::Display for Rut {
    /// Canonical form with dot separators: `12.345.678-9`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.body.to_string();
        let mut grouped = String::with_capacity(digits.len() + 4);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }
        write!(f, "{}-{}", grouped, self.check)
    }
}

/// Compute the check character for a digit string.
///
/// Weighted sum mod 11 with weights cycling 2..=7 from the least
/// significant digit; 10 maps to `'k'`. The algorithm is fixed by the
/// national identifier standard.
pub fn check_digit(digits: &str) -> char {
    let sum: u32 = digits
        .bytes()
        .rev()
        .map(|b| u32::from(b - b'0'))
        .zip((2..=7u32).cycle())
        .map(|(digit, factor)| digit * factor)
        .sum();
    match (11 - sum % 11) % 11 {
        10 => 'k',
        n => char::from_digit(n, 10).unwrap_or('0'),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_digit_known_values() {
        // 12.345.678-5 and 11.111.111-1 are well-known reference pairs.
        assert_eq!(check_digit("12345678"), '5');
        assert_eq!(check_digit("11111111"), '1');
        assert_eq!(check_digit("6"), 'k');
        assert_eq!(check_digit("7654321"), '6');
    }

    #[test]
    fn test_check_digit_range_and_determinism() {
        for body in [1u32, 999, 7654321, 12345678, 99999999, 999999999] {
            let digits = body.to_string();
            let first = check_digit(&digits);
            assert!(first == 'k' || first.is_ascii_digit());
            assert_eq!(first, check_digit(&digits));
        }
    }

    #[test]
    fn test_parse_punctuation_variants_are_equal() {
        let plain = Rut::parse("12345678-5").unwrap();
        let dotted = Rut::parse("12.345.678-5").unwrap();
        assert_eq!(plain, dotted);
        assert_eq!(plain.body(), 12_345_678);
        assert_eq!(plain.check(), '5');
    }

    #[test]
    fn test_parse_check_letter_case_insensitive() {
        let body = 20_000_003u32; // check digit is 'k'
        assert_eq!(check_digit("20000003"), 'k');
        let lower = Rut::parse("20.000.003-k").unwrap();
        let upper = Rut::parse("20.000.003-K").unwrap();
        assert_eq!(lower, upper);
        assert_eq!(lower.body(), body);
        assert_eq!(lower.check(), 'k');
    }

    #[test]
    fn test_parse_rejects_wrong_check_digit() {
        assert!(Rut::parse("12345678-4").is_none());
        assert!(Rut::parse("12.345.678-k").is_none());
    }

    #[test]
    fn test_parse_rejects_non_rut_shapes() {
        assert!(Rut::parse("12345678").is_none()); // no check digit
        assert!(Rut::parse("not a rut").is_none());
        assert!(Rut::parse("1.23.456-7").is_none());
        assert!(Rut::parse("").is_none());
    }

    #[test]
    fn test_looks_like() {
        assert!(Rut::looks_like("12345678"));
        assert!(Rut::looks_like("12.345.678"));
        assert!(Rut::looks_like("123456789"));
        assert!(Rut::looks_like("1234567"));
        assert!(!Rut::looks_like("123456")); // too short
        assert!(!Rut::looks_like("12345678-5")); // already a full rut
        assert!(!Rut::looks_like("hola"));
    }

    #[test]
    fn test_from_body_matches_parse() {
        let parsed = Rut::parse("12345678-5").unwrap();
        let rebuilt = Rut::from_body("12345678").unwrap();
        assert_eq!(parsed, rebuilt);
        let numeric = Rut::from_body_number(12_345_678).unwrap();
        assert_eq!(parsed, numeric);
    }

    #[test]
    fn test_from_body_rejects_garbage() {
        assert!(Rut::from_body("").is_none());
        assert!(Rut::from_body("12a45").is_none());
        assert!(Rut::from_body_number(-1).is_none());
    }

    #[test]
    fn test_display_uses_dot_separators() {
        assert_eq!(Rut::parse("12345678-5").unwrap().to_string(), "12.345.678-5");
        assert_eq!(Rut::from_body("1234567").unwrap().to_string().len(), 11);
    }
}
