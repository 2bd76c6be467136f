// Validation utilities module
// Custom validator functions for catalog and booking payloads

use chrono::NaiveDate;
use rust_decimal::Decimal;
use validator::ValidationError;

/// Rejects empty or whitespace-only text
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("must_not_be_blank"))
    } else {
        Ok(())
    }
}

/// Prices may be zero (promotional loans) but never negative
pub fn validate_non_negative_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() && !price.is_zero() {
        Err(ValidationError::new("price_must_not_be_negative"))
    } else {
        Ok(())
    }
}

/// Inclusive ranges need their start on or before their end
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), ValidationError> {
    if start > end {
        let mut error = ValidationError::new("start_after_end");
        error.message = Some("La fecha de inicio debe ser anterior o igual a la fecha de fin".into());
        Err(error)
    } else {
        Ok(())
    }
}

/// Accepts `#RGB` and `#RRGGBB` hex codes
pub fn validate_hex_code(hex: &str) -> Result<(), ValidationError> {
    let digits = match hex.strip_prefix('#') {
        Some(digits) => digits,
        None => return Err(ValidationError::new("invalid_hex_code")),
    };
    let valid_len = digits.len() == 3 || digits.len() == 6;
    if valid_len && digits.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_hex_code"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_not_blank() {
        assert!(validate_not_blank("Rojo").is_ok());
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank(" \t ").is_err());
    }

    #[test]
    fn test_non_negative_price() {
        assert!(validate_non_negative_price(&dec!(0)).is_ok());
        assert!(validate_non_negative_price(&dec!(-0.00)).is_ok());
        assert!(validate_non_negative_price(&dec!(350.50)).is_ok());
        assert!(validate_non_negative_price(&dec!(-0.01)).is_err());
    }

    #[test]
    fn test_date_range() {
        let a: NaiveDate = "2025-06-01".parse().unwrap();
        let b: NaiveDate = "2025-06-05".parse().unwrap();
        assert!(validate_date_range(a, b).is_ok());
        assert!(validate_date_range(a, a).is_ok());
        assert!(validate_date_range(b, a).is_err());
    }

    #[test]
    fn test_hex_code() {
        assert!(validate_hex_code("#000000").is_ok());
        assert!(validate_hex_code("#fA0").is_ok());
        assert!(validate_hex_code("000000").is_err());
        assert!(validate_hex_code("#00000G").is_err());
        assert!(validate_hex_code("#0000").is_err());
    }
}
