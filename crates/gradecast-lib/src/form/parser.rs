//! Field parsing
//!
//! Turns the free text of a single form field into a typed value or a
//! [`FieldIssue`]. Both parsers are pure functions of their input.

use crate::error::FieldIssue;

/// Lowest grade-point average accepted
pub const MIN_GRADE: f64 = 0.0;

/// Highest grade-point average accepted
pub const MAX_GRADE: f64 = 4.0;

/// Outcome of parsing one field: exactly one of value or issue
pub type ParsedValue<T> = Result<T, FieldIssue>;

/// Drop `_` separators, which are only allowed between two digits ("1_000")
fn strip_digit_separators(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    for (i, c) in text.char_indices() {
        if c != '_' {
            out.push(c);
            continue;
        }
        let before = i.checked_sub(1).map(|j| bytes[j]);
        let after = bytes.get(i + 1).copied();
        if !before.is_some_and(|b| b.is_ascii_digit()) || !after.is_some_and(|b| b.is_ascii_digit()) {
            return None;
        }
    }
    Some(out)
}

/// Parse a semester grade-point average
pub fn parse_grade(raw: &str) -> ParsedValue<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FieldIssue::NotEntered);
    }

    let value: f64 = strip_digit_separators(trimmed)
        .and_then(|text| text.parse().ok())
        .ok_or(FieldIssue::NotANumber)?;

    // NaN fails both comparisons and lands here too
    if !(MIN_GRADE..=MAX_GRADE).contains(&value) {
        return Err(FieldIssue::OutOfRange);
    }

    Ok(value)
}

/// Parse a semester credit-hour count.
///
/// Any well-formed non-negative integer is accepted; counts beyond `u64::MAX`
/// saturate. A negative integer of any magnitude is `Negative`.
pub fn parse_credit(raw: &str) -> ParsedValue<u64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FieldIssue::NotEntered);
    }

    let text = strip_digit_separators(trimmed).ok_or(FieldIssue::NotAnInteger)?;
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(&text)),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FieldIssue::NotAnInteger);
    }
    // "-0" is zero
    if negative && digits.bytes().any(|b| b != b'0') {
        return Err(FieldIssue::Negative);
    }

    Ok(digits.bytes().fold(0u64, |acc, b| {
        acc.saturating_mul(10).saturating_add(u64::from(b - b'0'))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_not_entered() {
        assert_eq!(parse_grade(""), Err(FieldIssue::NotEntered));
        assert_eq!(parse_grade("   \t"), Err(FieldIssue::NotEntered));
    }

    #[test]
    fn test_grade_valid_values() {
        assert_eq!(parse_grade("3.50"), Ok(3.5));
        assert_eq!(parse_grade(" 2.75 "), Ok(2.75));
        assert_eq!(parse_grade("4"), Ok(4.0));
        assert_eq!(parse_grade("4.00"), Ok(4.0));
        assert_eq!(parse_grade("0.00"), Ok(0.0));
        assert_eq!(parse_grade("1e0"), Ok(1.0));
    }

    #[test]
    fn test_grade_out_of_range() {
        assert_eq!(parse_grade("4.5"), Err(FieldIssue::OutOfRange));
        assert_eq!(parse_grade("4.0001"), Err(FieldIssue::OutOfRange));
        assert_eq!(parse_grade("-0.01"), Err(FieldIssue::OutOfRange));
        assert_eq!(parse_grade("NaN"), Err(FieldIssue::OutOfRange));
        assert_eq!(parse_grade("inf"), Err(FieldIssue::OutOfRange));
    }

    #[test]
    fn test_grade_not_a_number() {
        assert_eq!(parse_grade("abc"), Err(FieldIssue::NotANumber));
        assert_eq!(parse_grade("3,5"), Err(FieldIssue::NotANumber));
        assert_eq!(parse_grade("3.5.1"), Err(FieldIssue::NotANumber));
    }

    #[test]
    fn test_credit_valid_values() {
        assert_eq!(parse_credit("15"), Ok(15));
        assert_eq!(parse_credit(" 0 "), Ok(0));
        assert_eq!(parse_credit("+18"), Ok(18));
    }

    #[test]
    fn test_credit_errors() {
        assert_eq!(parse_credit(""), Err(FieldIssue::NotEntered));
        assert_eq!(parse_credit("-3"), Err(FieldIssue::Negative));
        assert_eq!(parse_credit("15.0"), Err(FieldIssue::NotAnInteger));
        assert_eq!(parse_credit("fifteen"), Err(FieldIssue::NotAnInteger));
        assert_eq!(parse_credit("1 5"), Err(FieldIssue::NotAnInteger));
        assert_eq!(parse_credit("+"), Err(FieldIssue::NotAnInteger));
        assert_eq!(parse_credit("--3"), Err(FieldIssue::NotAnInteger));
    }

    #[test]
    fn test_credit_large_values() {
        assert_eq!(parse_credit("4294967295"), Ok(u32::MAX as u64));
        assert_eq!(parse_credit("4294967296"), Ok(u32::MAX as u64 + 1));
        assert_eq!(parse_credit("18446744073709551615"), Ok(u64::MAX));
        assert_eq!(parse_credit("99999999999999999999"), Ok(u64::MAX));
    }

    #[test]
    fn test_credit_sign_handling() {
        assert_eq!(parse_credit("-0"), Ok(0));
        assert_eq!(parse_credit("-000"), Ok(0));
        assert_eq!(parse_credit("-99999999999999999999"), Err(FieldIssue::Negative));
        assert_eq!(parse_credit("-4294967296"), Err(FieldIssue::Negative));
    }

    #[test]
    fn test_digit_separators() {
        assert_eq!(parse_credit("1_000"), Ok(1000));
        assert_eq!(parse_credit("1__000"), Err(FieldIssue::NotAnInteger));
        assert_eq!(parse_credit("_15"), Err(FieldIssue::NotAnInteger));
        assert_eq!(parse_credit("15_"), Err(FieldIssue::NotAnInteger));
        assert_eq!(parse_grade("3_0.0e-1"), Ok(3.0));
        assert_eq!(parse_grade("3._5"), Err(FieldIssue::NotANumber));
    }

    #[test]
    fn test_grade_accepts_exactly_closed_interval() {
        for hundredths in 0..=500 {
            let raw = format!("{:.2}", hundredths as f64 / 100.0);
            let parsed = parse_grade(&raw);
            if hundredths <= 400 {
                assert!(parsed.is_ok(), "{} should be accepted", raw);
            } else {
                assert_eq!(parsed, Err(FieldIssue::OutOfRange), "{} should be rejected", raw);
            }
        }
    }
}
