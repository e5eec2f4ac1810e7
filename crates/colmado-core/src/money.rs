//! # Money Module
//!
//! Monetary helpers and the closed set of ITBIS rates.
//!
//! ## Precision Policy
//! ```text
//! ┌────────────────────────────────────────────────────────────────────────┐
//! │  WHERE ROUNDING HAPPENS                                                │
//! │                                                                        │
//! │  Pricing Calculator ──► Cart totals ──► Sale Transaction Engine        │
//! │        full precision      full precision        round2() HERE         │
//! │                                                         │              │
//! │                                                         ▼              │
//! │                                              persisted / displayed     │
//! │                                                                        │
//! │  Rounding to 2 decimals is applied exactly once, at the persistence    │
//! │  and display boundary. Rounding mid-calculation would compound error   │
//! │  across a multi-item cart (e.g. many 0.005 halves all rounding up).    │
//! └────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Amounts are `f64` Dominican pesos; fractional quantities (weight/volume
//! goods) make integer-cents arithmetic a poor fit here.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

// =============================================================================
// Rounding & Display
// =============================================================================

/// Rounds an amount to 2 decimal places.
///
/// Only called at the persistence/display boundary, never mid-calculation.
#[inline]
pub fn round2(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Tolerance for comparing monetary values that went through float math.
pub const MONEY_EPSILON: f64 = 0.005;

/// Compares two amounts within [`MONEY_EPSILON`].
#[inline]
pub fn money_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < MONEY_EPSILON
}

// =============================================================================
// ITBIS Rate
// =============================================================================

/// The Dominican Republic sales-tax (ITBIS) rates a product may carry.
///
/// ## Why a Closed Enum?
/// The legal rates are a fixed set; accepting an arbitrary float invites
/// typos like 0.8 instead of 0.18 flowing straight into prices. Anything
/// outside the set is a [`ValidationError::InvalidItbisRate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItbisRate {
    /// 0% - exempt goods (most staple foods).
    #[default]
    Exempt,
    /// 10% - reduced rate.
    Reduced,
    /// 18% - the standard rate.
    Standard,
    /// 28% - the higher rate for select goods.
    Higher,
}

impl ItbisRate {
    /// Returns the rate as a fraction (0.18 for the standard rate).
    #[inline]
    pub const fn as_f64(&self) -> f64 {
        match self {
            ItbisRate::Exempt => 0.0,
            ItbisRate::Reduced => 0.10,
            ItbisRate::Standard => 0.18,
            ItbisRate::Higher => 0.28,
        }
    }

    /// Returns the rate as a display percentage (18.0 for the standard rate).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.as_f64() * 100.0
    }

    /// Parses a stored fraction back into a rate.
    ///
    /// Stored values went through float round-trips, so the comparison is
    /// tolerant to small drift.
    pub fn from_f64(rate: f64) -> Result<Self, ValidationError> {
        const CANDIDATES: [ItbisRate; 4] = [
            ItbisRate::Exempt,
            ItbisRate::Reduced,
            ItbisRate::Standard,
            ItbisRate::Higher,
        ];
        CANDIDATES
            .into_iter()
            .find(|c| (c.as_f64() - rate).abs() < 1e-9)
            .ok_or(ValidationError::InvalidItbisRate { rate })
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        matches!(self, ItbisRate::Exempt)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(23.599999999999998), 23.6);
        assert_eq!(round2(37.606), 37.61);
        assert_eq!(round2(37.604), 37.6);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn test_itbis_rate_round_trip() {
        for rate in [
            ItbisRate::Exempt,
            ItbisRate::Reduced,
            ItbisRate::Standard,
            ItbisRate::Higher,
        ] {
            assert_eq!(ItbisRate::from_f64(rate.as_f64()).unwrap(), rate);
        }
    }

    #[test]
    fn test_itbis_rate_tolerates_float_drift() {
        assert_eq!(
            ItbisRate::from_f64(0.18000000000000002).unwrap(),
            ItbisRate::Standard
        );
    }

    #[test]
    fn test_itbis_rate_rejects_unknown() {
        assert!(matches!(
            ItbisRate::from_f64(0.16),
            Err(ValidationError::InvalidItbisRate { .. })
        ));
    }

    #[test]
    fn test_money_eq() {
        assert!(money_eq(236.0, 118.0 * 2.0));
        assert!(!money_eq(236.0, 236.01));
    }
}
