//! Phone number cleanup and validation.
//!
//! Numbers written with a leading `+` are checked against the generic E.164
//! shape. Numbers without one only become valid when a default country code
//! is supplied; they are then checked against that country's digit count.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// National significant digit counts per country calling code.
/// Codes missing here fall back to the generic 7–15 digit check.
const COUNTRY_DIGITS: &[(&str, usize, usize)] = &[
    ("1", 10, 10),   // US, Canada
    ("7", 10, 10),   // Russia, Kazakhstan
    ("20", 10, 10),  // Egypt
    ("27", 9, 9),    // South Africa
    ("31", 9, 9),    // Netherlands
    ("33", 9, 9),    // France
    ("34", 9, 9),    // Spain
    ("39", 9, 10),   // Italy
    ("44", 10, 11),  // United Kingdom
    ("49", 10, 11),  // Germany
    ("52", 10, 10),  // Mexico
    ("55", 10, 11),  // Brazil
    ("61", 9, 9),    // Australia
    ("62", 9, 12),   // Indonesia
    ("63", 10, 10),  // Philippines
    ("65", 8, 8),    // Singapore
    ("81", 10, 10),  // Japan
    ("86", 11, 11),  // China
    ("91", 10, 10),  // India
    ("92", 10, 10),  // Pakistan
    ("234", 10, 10), // Nigeria
    ("254", 9, 9),   // Kenya
    ("971", 9, 9),   // United Arab Emirates
];

/// Why a raw phone value could not be imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhoneRejection {
    /// Nothing left after stripping formatting.
    Missing,
    /// No leading `+` and no default country code selected.
    NoCountryCode,
    /// Wrong shape or digit count.
    Invalid,
}

impl fmt::Display for PhoneRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Missing => "missing phone number",
            Self::NoCountryCode => "no country code",
            Self::Invalid => "invalid phone number",
        })
    }
}

fn e164_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+[1-9]\d{6,14}$").expect("static E.164 regex"))
}

/// Generic E.164 check: `+`, non-zero first digit, 7–15 digits in total.
pub fn validate_phone_number(phone: &str) -> bool {
    e164_regex().is_match(phone)
}

/// Keep digits and `+` only, then make sure the result starts with `+`.
pub fn format_phone_number(raw: &str) -> String {
    let cleaned = strip_formatting(raw);
    if cleaned.starts_with('+') {
        cleaned
    } else {
        format!("+{cleaned}")
    }
}

fn strip_formatting(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect()
}

/// `"1"`, `"+1"` or `" +44 "` to `"+1"` / `"+44"`. `None` unless the code
/// is one to three digits.
pub fn normalize_country_code(code: &str) -> Option<String> {
    let digits = code.trim().trim_start_matches('+');
    let valid = (1..=3).contains(&digits.len())
        && digits.chars().all(|c| c.is_ascii_digit())
        && !digits.starts_with('0');
    valid.then(|| format!("+{digits}"))
}

/// Check a full `+<code><national>` number against the digit count table
/// for `country_code`. Unknown codes use [`validate_phone_number`].
pub fn validate_phone_number_for_country(phone: &str, country_code: &str) -> bool {
    let Some(code) = normalize_country_code(country_code) else {
        return false;
    };
    let Some(national) = phone.strip_prefix(code.as_str()) else {
        return false;
    };
    if !national.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }

    match COUNTRY_DIGITS.iter().find(|(c, _, _)| *c == &code[1..]) {
        Some((_, min, max)) => (*min..=*max).contains(&national.len()),
        None => validate_phone_number(phone),
    }
}

/// Clean a raw phone cell into E.164 form.
///
/// With a leading `+` the number is validated as-is. Otherwise the default
/// country code is required: leading trunk zeros are dropped, the code is
/// prefixed, and the per-country digit count applies.
pub fn normalize_phone(raw: &str, default_country: Option<&str>) -> Result<String, PhoneRejection> {
    let cleaned = strip_formatting(raw);
    if cleaned.trim_start_matches('+').is_empty() {
        return Err(PhoneRejection::Missing);
    }

    if cleaned.starts_with('+') {
        return if validate_phone_number(&cleaned) {
            Ok(cleaned)
        } else {
            Err(PhoneRejection::Invalid)
        };
    }
    if cleaned.contains('+') {
        return Err(PhoneRejection::Invalid);
    }

    let code = default_country
        .and_then(normalize_country_code)
        .ok_or(PhoneRejection::NoCountryCode)?;
    let national = cleaned.trim_start_matches('0');
    let phone = format!("{code}{national}");
    if validate_phone_number_for_country(&phone, &code) {
        Ok(phone)
    } else {
        Err(PhoneRejection::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_phone_number_e164() {
        assert!(validate_phone_number("+15551234567"));
        assert!(validate_phone_number("+4930123"));
        assert!(!validate_phone_number("15551234567"));
        assert!(!validate_phone_number("+05551234567"));
        assert!(!validate_phone_number("+123456"));
        assert!(!validate_phone_number("+1234567890123456"));
    }

    #[test]
    fn test_format_phone_number() {
        assert_eq!(format_phone_number("(555) 123-4567"), "+5551234567");
        assert_eq!(format_phone_number("+44 20 7946 0958"), "+442079460958");
    }

    #[test]
    fn test_country_digit_counts() {
        assert!(validate_phone_number_for_country("+15551234567", "+1"));
        assert!(!validate_phone_number_for_country("+155512345", "+1"));
        assert!(validate_phone_number_for_country("+919876543210", "91"));
        assert!(validate_phone_number_for_country("+442079460958", "+44"));
        assert!(validate_phone_number_for_country("+4420794609581", "+44"));
        assert!(!validate_phone_number_for_country("+44207946", "+44"));
    }

    #[test]
    fn test_country_unknown_code_uses_generic() {
        assert!(validate_phone_number_for_country("+3801234567", "+380"));
        assert!(!validate_phone_number_for_country("+38012", "+380"));
    }

    #[test]
    fn test_country_prefix_must_match() {
        assert!(!validate_phone_number_for_country("+445551234567", "+1"));
        assert!(!validate_phone_number_for_country("+15551234567", "abc"));
    }

    #[test]
    fn test_normalize_phone_with_plus() {
        assert_eq!(
            normalize_phone(" +1 (555) 123-4567 ", None).unwrap(),
            "+15551234567"
        );
        assert_eq!(normalize_phone("+12", None), Err(PhoneRejection::Invalid));
    }

    #[test]
    fn test_normalize_phone_needs_country_without_plus() {
        assert_eq!(
            normalize_phone("5551234567", None),
            Err(PhoneRejection::NoCountryCode)
        );
        assert_eq!(
            normalize_phone("555-123-4567", Some("+1")).unwrap(),
            "+15551234567"
        );
        assert_eq!(
            normalize_phone("020 7946 0958", Some("44")).unwrap(),
            "+442079460958"
        );
        assert_eq!(
            normalize_phone("55512345", Some("+1")),
            Err(PhoneRejection::Invalid)
        );
    }

    #[test]
    fn test_normalize_phone_missing() {
        assert_eq!(normalize_phone("  ", Some("+1")), Err(PhoneRejection::Missing));
        assert_eq!(normalize_phone("n/a", None), Err(PhoneRejection::Missing));
    }

    #[test]
    fn test_normalize_country_code() {
        assert_eq!(normalize_country_code("1").as_deref(), Some("+1"));
        assert_eq!(normalize_country_code(" +971 ").as_deref(), Some("+971"));
        assert_eq!(normalize_country_code("+0"), None);
        assert_eq!(normalize_country_code("1234"), None);
        assert_eq!(normalize_country_code(""), None);
    }
}
