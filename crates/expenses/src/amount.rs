//! Lenient amount parsing.
//!
//! Amounts reach the dashboard either as JSON numbers or as currency
//! formatted strings (`"$1,234.56"`, `"-12.00 USD"`). Parsing never fails:
//! anything that cannot be read as a number counts as `0`.

use api_types::expense::{Amount, ExpenseRecord};

/// Returns the numeric value of an amount.
///
/// Strings keep only ASCII digits, `.` and `-`, then the longest leading
/// `-?digits[.digits]` run is parsed.
///
/// ```rust
/// use api_types::expense::Amount;
/// use expenses::parse_numeric_value;
///
/// assert_eq!(parse_numeric_value(Some(&Amount::from("$1,234.56"))), 1234.56);
/// assert_eq!(parse_numeric_value(None), 0.0);
/// ```
#[must_use]
pub fn parse_numeric_value(value: Option<&Amount>) -> f64 {
    match value {
        Some(Amount::Number(number)) if number.is_finite() => *number,
        Some(Amount::Number(_)) | None => 0.0,
        Some(Amount::Text(text)) => parse_text(text),
    }
}

/// Parsed amount of an expense row.
#[must_use]
pub fn amount_of(expense: &ExpenseRecord) -> f64 {
    parse_numeric_value(expense.amount.as_ref())
}

/// Sum of the parsed amounts.
pub fn sum<'a, I>(expenses: I) -> f64
where
    I: IntoIterator<Item = &'a ExpenseRecord>,
{
    expenses.into_iter().map(amount_of).sum()
}

fn parse_text(text: &str) -> f64 {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    let value = numeric_prefix(&cleaned)
        .and_then(|prefix| prefix.parse::<f64>().ok())
        .unwrap_or(0.0);

    // "-0" and friends collapse to a plain zero.
    if value == 0.0 { 0.0 } else { value }
}

/// Longest prefix of `s` shaped like `-?\d*(\.\d*)?` holding at least one digit.
fn numeric_prefix(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    let mut end = 0;
    let mut digits = 0;

    if bytes.first() == Some(&b'-') {
        end += 1;
    }
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        let dot = end;
        end += 1;
        let mut fraction = 0;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            fraction += 1;
        }
        digits += fraction;
        if fraction == 0 {
            end = dot;
        }
    }

    (digits > 0).then(|| &s[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> f64 {
        parse_numeric_value(Some(&Amount::from(value)))
    }

    #[test]
    fn strips_currency_formatting() {
        assert_eq!(text("$1,234.56"), 1234.56);
        assert_eq!(text("-12.00 USD"), -12.0);
        assert_eq!(text("  42 "), 42.0);
        assert_eq!(text(".5"), 0.5);
    }

    #[test]
    fn numbers_pass_through() {
        assert_eq!(parse_numeric_value(Some(&Amount::Number(-3.25))), -3.25);
        assert_eq!(parse_numeric_value(Some(&Amount::Number(f64::NAN))), 0.0);
    }

    #[test]
    fn unparsable_values_are_zero() {
        assert_eq!(parse_numeric_value(None), 0.0);
        assert_eq!(text(""), 0.0);
        assert_eq!(text("n/a"), 0.0);
        assert_eq!(text("-"), 0.0);
        assert_eq!(text("--5"), 0.0);
    }

    #[test]
    fn stops_at_the_first_malformed_character() {
        assert_eq!(text("1.2.3"), 1.2);
        assert_eq!(text("12-3"), 12.0);
        assert_eq!(text("5."), 5.0);
    }

    #[test]
    fn sum_adds_parsed_amounts() {
        let rows = [
            ExpenseRecord {
                amount: Some(Amount::from("$10.50")),
                ..Default::default()
            },
            ExpenseRecord {
                amount: Some(Amount::Number(4.5)),
                ..Default::default()
            },
            ExpenseRecord::default(),
        ];
        assert_eq!(sum(&rows), 15.0);
    }
}
