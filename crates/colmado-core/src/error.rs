//! # Domain Error Types
//!
//! Typed errors for the pure business-logic layer.
//!
//! ## Error Flow
//! ```text
//! ┌────────────────────────────────────────────────────────────────────────┐
//! │                       Error Propagation                                │
//! │                                                                        │
//! │  ValidationError / CartError (this module)                             │
//! │       │                                                                │
//! │       ▼                                                                │
//! │  CheckoutError (in colmado-db) ← wraps core errors + stock/storage     │
//! │       │                                                                │
//! │       ▼                                                                │
//! │  Presentation layer renders a user-facing message                      │
//! │                                                                        │
//! └────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The old result-dict-with-message pattern is replaced by these enums:
//! callers match on the variant, never on message text.

use serde::Serialize;
use thiserror::Error;

/// Input validation errors.
///
/// Detected before any storage is touched; a validation failure never
/// opens a transaction.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    /// A required field was empty or missing.
    #[error("{field} is required")]
    Required { field: String },

    /// A numeric field must be strictly positive.
    #[error("{field} must be greater than zero")]
    MustBePositive { field: String },

    /// A numeric field must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// A value fell outside its allowed range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: f64, max: f64 },

    /// The ITBIS rate is not one of the legal rates (0%, 10%, 18%, 28%).
    #[error("{rate} is not a valid ITBIS rate")]
    InvalidItbisRate { rate: f64 },

    /// The discount exceeds what the sale allows.
    #[error("invalid discount: {reason}")]
    InvalidDiscount { reason: String },

    /// The cash tendered does not cover the net total.
    #[error("tendered {tendered:.2} is less than the total {required:.2}")]
    InsufficientTender { required: f64, tendered: f64 },

    /// A checkout was attempted with no line items.
    #[error("the sale has no items")]
    EmptySale,
}

impl ValidationError {
    /// Creates a `Required` error for the given field.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Creates a `MustBePositive` error for the given field.
    pub fn must_be_positive(field: impl Into<String>) -> Self {
        ValidationError::MustBePositive {
            field: field.into(),
        }
    }

    /// Creates a `MustNotBeNegative` error for the given field.
    pub fn must_not_be_negative(field: impl Into<String>) -> Self {
        ValidationError::MustNotBeNegative {
            field: field.into(),
        }
    }
}

/// Cart manipulation errors.
///
/// The cart's stock pre-check is advisory only (the Stock Guard inside the
/// transaction is authoritative), so these errors exist for immediate UI
/// feedback, not correctness.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CartError {
    /// Quantity must be strictly positive.
    #[error("quantity must be greater than zero")]
    QuantityNotPositive,

    /// The cumulative requested quantity exceeds the last-known stock.
    #[error("'{name}': requested {requested} but only {available} known in stock")]
    ExceedsKnownStock {
        product_id: i64,
        name: String,
        available: f64,
        requested: f64,
    },

    /// The product is not in the cart.
    #[error("product {product_id} is not in the cart")]
    ProductNotInCart { product_id: i64 },

    /// The cart reached its line limit.
    #[error("cart cannot hold more than {max} distinct products")]
    CartFull { max: usize },

    /// A business-rule check failed (bad discount, bad catalog rate, ...).
    /// For discounts this means the stored discount was reset to zero.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
