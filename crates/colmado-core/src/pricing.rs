//! # Pricing Calculator
//!
//! Pure line-level price/ITBIS arithmetic. No side effects, no rounding.
//!
//! ## Where This Runs
//! ```text
//! ┌────────────────────────────────────────────────────────────────────────┐
//! │  compute_line() is called from TWO places                              │
//! │                                                                        │
//! │  1. Cart (advisory)    — against the catalog snapshot the UI holds     │
//! │  2. Engine (binding)   — against the persisted product row, inside     │
//! │                          the checkout transaction                      │
//! │                                                                        │
//! │  The engine NEVER trusts client-supplied prices; it re-derives every   │
//! │  figure from the row it just locked. Same function, so both paths      │
//! │  agree to the last bit.                                                │
//! └────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::ItbisRate;
use crate::validation::validate_quantity;

/// The derived pricing figures for one sale line.
///
/// All values are full precision; rounding happens at persistence/display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinePricing {
    /// ITBIS charged per unit (`base_price × rate`, 0 when exempt).
    pub unit_itbis: f64,
    /// Final per-unit price, ITBIS included.
    pub unit_final_price: f64,
    /// `unit_final_price × quantity` (ITBIS-inclusive).
    pub line_subtotal: f64,
    /// `unit_itbis × quantity`.
    pub line_itbis: f64,
}

/// Computes the pricing for one line.
///
/// ## Arguments
/// * `price_excl_itbis` - base unit price before tax
/// * `rate` - the product's ITBIS rate ([`ItbisRate::Exempt`] when the
///   tax-applicable flag is off)
/// * `quantity` - units sold; fractional for weight/volume goods
///
/// ## Errors
/// * `quantity <= 0` (or non-finite) is an input error, never clamped
/// * negative base price is an input error
pub fn compute_line(
    price_excl_itbis: f64,
    rate: ItbisRate,
    quantity: f64,
) -> Result<LinePricing, ValidationError> {
    if !price_excl_itbis.is_finite() || price_excl_itbis < 0.0 {
        return Err(ValidationError::must_not_be_negative("price"));
    }
    validate_quantity(quantity)?;

    let unit_itbis = price_excl_itbis * rate.as_f64();
    let unit_final_price = price_excl_itbis + unit_itbis;

    Ok(LinePricing {
        unit_itbis,
        unit_final_price,
        line_subtotal: unit_final_price * quantity,
        line_itbis: unit_itbis * quantity,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
