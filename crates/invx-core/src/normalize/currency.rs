//! Dollar amount parsing and formatting.

use rust_decimal::{Decimal, RoundingStrategy};

/// Format an amount as `$` followed by exactly two decimals.
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("${:.2}", rounded)
}

/// Parse a plain amount such as `42.9`, `1,234.50` or ` 7 `.
///
/// Currency symbols and words are not accepted; callers leave such
/// strings as they are.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    cleaned
        .parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(Decimal::from_str("42.9").unwrap()), "$42.90");
        assert_eq!(format_currency(Decimal::from_str("3").unwrap()), "$3.00");
        assert_eq!(format_currency(Decimal::from_str("1234.5").unwrap()), "$1234.50");
        assert_eq!(format_currency(Decimal::from_str("0.125").unwrap()), "$0.13");
        assert_eq!(format_currency(Decimal::from_str("2.675").unwrap()), "$2.68");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("42.9"), Some(Decimal::from_str("42.9").unwrap()));
        assert_eq!(parse_amount("1,234.50"), Some(Decimal::from_str("1234.50").unwrap()));
        assert_eq!(parse_amount(" 7 "), Some(Decimal::from(7)));
        assert_eq!(parse_amount("N/A"), None);
        assert_eq!(parse_amount("AUD 5"), None);
        assert_eq!(parse_amount(""), None);
    }
}
