//! # Validation Module
//!
//! Business-rule validation shared by the cart and the transaction engine.
//!
//! ## Validation Strategy
//! ```text
//! ┌────────────────────────────────────────────────────────────────────────┐
//! │                       Validation Layers                                │
//! │                                                                        │
//! │  Layer 1: Presentation (forms)                                        │
//! │  ├── Basic format checks, immediate feedback                          │
//! │           │                                                            │
//! │           ▼                                                            │
//! │  Layer 2: THIS MODULE - business rules, before any transaction        │
//! │           │                                                            │
//! │           ▼                                                            │
//! │  Layer 3: Database (SQLite)                                           │
//! │  ├── NOT NULL / CHECK / foreign key constraints                       │
//! │                                                                        │
//! │  Defense in depth: each layer catches a different class of mistake.   │
//! └────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::Discount;
use crate::MAX_QUANTITY_PER_LINE;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates an entity name (product, customer, supplier).
///
/// ## Rules
/// - Must not be empty after trimming
/// - Maximum 120 characters
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required("name"));
    }

    if name.chars().count() > 120 {
        return Err(ValidationError::OutOfRange {
            field: "name".to_string(),
            min: 1.0,
            max: 120.0,
        });
    }

    Ok(())
}

/// Validates a phone number: required, at most 30 characters.
///
/// The original registry treated phone as a free-form but mandatory field,
/// so no format is imposed beyond length.
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();

    if phone.is_empty() {
        return Err(ValidationError::required("phone"));
    }

    if phone.chars().count() > 30 {
        return Err(ValidationError::OutOfRange {
            field: "phone".to_string(),
            min: 1.0,
            max: 30.0,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale-line quantity.
///
/// ## Rules
/// - Must be finite and strictly positive (fractional is fine: 0.5 lb)
/// - Must not exceed [`MAX_QUANTITY_PER_LINE`]
pub fn validate_quantity(qty: f64) -> ValidationResult<()> {
    if !qty.is_finite() || qty <= 0.0 {
        return Err(ValidationError::must_be_positive("quantity"));
    }

    if qty > MAX_QUANTITY_PER_LINE {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0.0,
            max: MAX_QUANTITY_PER_LINE,
        });
    }

    Ok(())
}

/// Validates a non-negative monetary amount (prices, stock, tendered cash).
pub fn validate_non_negative(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::must_not_be_negative(field));
    }
    Ok(())
}

/// Validates a discount against the ITBIS-inclusive subtotal it applies to.
///
/// ## Rules
/// - Percentage must lie in `[0, 100]`
/// - Fixed amount must lie in `[0, subtotal_incl_itbis]`
pub fn validate_discount(discount: &Discount, subtotal_incl_itbis: f64) -> ValidationResult<()> {
    match *discount {
        Discount::None => Ok(()),
        Discount::Percent(pct) => {
            if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
                return Err(ValidationError::InvalidDiscount {
                    reason: format!("percentage {pct} is outside 0-100"),
                });
            }
            Ok(())
        }
        Discount::Amount(amount) => {
            if !amount.is_finite() || amount < 0.0 {
                return Err(ValidationError::InvalidDiscount {
                    reason: "amount is negative".to_string(),
                });
            }
            if amount > subtotal_incl_itbis {
                return Err(ValidationError::InvalidDiscount {
                    reason: format!(
                        "amount {amount:.2} exceeds the subtotal {subtotal_incl_itbis:.2}"
                    ),
                });
            }
            Ok(())
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Arroz Selecto 5lb").is_ok());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(121)).is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("809-555-0134").is_ok());
        assert!(validate_phone("").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1.0).is_ok());
        assert!(validate_quantity(0.25).is_ok());
        assert!(validate_quantity(0.0).is_err());
        assert!(validate_quantity(-2.0).is_err());
        assert!(validate_quantity(f64::NAN).is_err());
        assert!(validate_quantity(MAX_QUANTITY_PER_LINE + 1.0).is_err());
    }

    #[test]
    fn test_validate_discount_percent_bounds() {
        assert!(validate_discount(&Discount::Percent(0.0), 100.0).is_ok());
        assert!(validate_discount(&Discount::Percent(100.0), 100.0).is_ok());
        assert!(validate_discount(&Discount::Percent(100.1), 100.0).is_err());
        assert!(validate_discount(&Discount::Percent(-5.0), 100.0).is_err());
    }

    #[test]
    fn test_validate_discount_amount_bounds() {
        assert!(validate_discount(&Discount::Amount(0.0), 100.0).is_ok());
        assert!(validate_discount(&Discount::Amount(100.0), 100.0).is_ok());
        assert!(validate_discount(&Discount::Amount(100.01), 100.0).is_err());
        assert!(validate_discount(&Discount::Amount(-1.0), 100.0).is_err());
    }
}
