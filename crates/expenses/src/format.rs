//! Display formatting for amounts and labels (en-US conventions).

/// Formats `value` with its currency symbol and two decimals.
///
/// ```rust
/// use expenses::format::format_currency;
///
/// assert_eq!(format_currency(1234.5, "USD"), "$1,234.50");
/// assert_eq!(format_currency(-5.0, "EUR"), "-€5.00");
/// assert_eq!(format_currency(10.0, "CHF"), "CHF 10.00");
/// ```
pub fn format_currency(value: f64, currency: &str) -> String {
    let digits = format_number(value.abs(), 2);
    let sign = if value < 0.0 && digits != "0.00" { "-" } else { "" };
    match currency_symbol(currency) {
        Some(symbol) => format!("{sign}{symbol}{digits}"),
        None => format!("{sign}{} {digits}", currency.to_ascii_uppercase()),
    }
}

fn currency_symbol(code: &str) -> Option<&'static str> {
    match code.trim().to_ascii_uppercase().as_str() {
        "USD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "JPY" => Some("¥"),
        "CAD" => Some("CA$"),
        _ => None,
    }
}

/// Thousands-separated number with a fixed number of decimals.
///
/// Halves round away from zero on the shortest decimal form of `value`, so
/// `0.125` and `1.005` become `0.13` and `1.01` at two decimals.
pub fn format_number(value: f64, decimals: usize) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let (int_part, fraction) = round_half_away(value.abs(), decimals);

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let zero = int_part.bytes().chain(fraction.bytes()).all(|b| b == b'0');
    let sign = if value < 0.0 && !zero { "-" } else { "" };
    if fraction.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{fraction}")
    }
}

/// Integer and fraction digits of a finite, non-negative `value` rounded to
/// `decimals` places.
fn round_half_away(value: f64, decimals: usize) -> (String, String) {
    // `Display` for f64 is the shortest round-trip form and never exponential.
    let shortest = value.to_string();
    let (int_part, fraction) = shortest.split_once('.').unwrap_or((shortest.as_str(), ""));

    let mut digits: Vec<u8> = int_part
        .bytes()
        .chain(fraction.bytes().chain(std::iter::repeat(b'0')).take(decimals))
        .map(|b| b - b'0')
        .collect();

    if fraction.as_bytes().get(decimals).is_some_and(|d| *d >= b'5') {
        let mut i = digits.len();
        loop {
            if i == 0 {
                digits.insert(0, 1);
                break;
            }
            i -= 1;
            if digits[i] == 9 {
                digits[i] = 0;
            } else {
                digits[i] += 1;
                break;
            }
        }
    }

    let split = digits.len() - decimals;
    let render = |ds: &[u8]| ds.iter().map(|d| char::from(b'0' + d)).collect::<String>();
    (render(&digits[..split]), render(&digits[split..]))
}

/// `value` is a percentage in the 0-100 range.
pub fn format_percent(value: f64, decimals: usize) -> String {
    format!("{}%", format_number(value, decimals))
}

/// Cuts `text` to `max_len` characters, ending with `...` when shortened.
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_len.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// `FOOD_AND_DRINK` -> `Food And Drink`
pub fn snake_to_title_case(value: &str) -> String {
    value
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Masks all but the last four characters: `•••• 1234`.
pub fn format_account_number(account: &str) -> String {
    let len = account.chars().count();
    if len <= 4 {
        return account.to_string();
    }
    let tail: String = account.chars().skip(len - 4).collect();
    format!("•••• {tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency() {
        assert_eq!(format_currency(0.0, "USD"), "$0.00");
        assert_eq!(format_currency(1234567.891, "usd"), "$1,234,567.89");
        assert_eq!(format_currency(-0.001, "USD"), "$0.00");
        assert_eq!(format_currency(99.5, "GBP"), "£99.50");
    }

    #[test]
    fn numbers_and_percentages() {
        assert_eq!(format_number(1234.0, 0), "1,234");
        assert_eq!(format_number(999.0, 0), "999");
        assert_eq!(format_number(-1234.567, 2), "-1,234.57");
        assert_eq!(format_percent(12.345, 1), "12.3%");
        assert_eq!(format_percent(0.0, 1), "0.0%");
    }

    #[test]
    fn halves_round_away_from_zero() {
        assert_eq!(format_currency(0.125, "USD"), "$0.13");
        assert_eq!(format_currency(-0.125, "USD"), "-$0.13");
        assert_eq!(format_currency(1.005, "USD"), "$1.01");
        assert_eq!(format_currency(999.995, "USD"), "$1,000.00");
        assert_eq!(format_number(9.5, 0), "10");
        assert_eq!(format_number(0.004, 2), "0.00");
        assert_eq!(format_number(f64::NAN, 2), "0.00");
    }

    #[test]
    fn truncation() {
        assert_eq!(truncate_text("short", 20), "short");
        assert_eq!(truncate_text("a fairly long merchant name", 10), "a fairl...");
        assert_eq!(truncate_text("abcdef", 2), "...");
    }

    #[test]
    fn title_case() {
        assert_eq!(snake_to_title_case("FOOD_AND_DRINK"), "Food And Drink");
        assert_eq!(snake_to_title_case("rent"), "Rent");
        assert_eq!(snake_to_title_case(""), "");
    }

    #[test]
    fn account_mask() {
        assert_eq!(format_account_number("1234"), "1234");
        assert_eq!(format_account_number("9876543210"), "•••• 3210");
    }
}
