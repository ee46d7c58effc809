//! Decimal type utilities for precise financial calculations

pub use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;

/// Price type with high precision
pub type Price = Decimal;

/// Quantity type with high precision
pub type Quantity = Decimal;

/// Amount type with high precision (typically Price * Quantity)
pub type Amount = Decimal;

/// Fractional rate such as a spread or a fee (0.1 == 10%)
pub type Rate = Decimal;

/// Parse a venue-supplied decimal string, reading an empty string as zero.
///
/// Venues report unfilled prices as `""` rather than omitting the field.
pub fn parse_or_zero(raw: &str) -> std::result::Result<Decimal, rust_decimal::Error> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Decimal::ZERO);
    }
    trimmed.parse::<Decimal>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_zero() {
        assert_eq!(parse_or_zero("").unwrap(), Decimal::ZERO);
        assert_eq!(parse_or_zero("  ").unwrap(), Decimal::ZERO);
        assert_eq!(parse_or_zero("27123.5").unwrap(), dec!(27123.5));
        assert!(parse_or_zero("abc").is_err());
    }
}
