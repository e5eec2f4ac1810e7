//! # colmado-core: Pure Business Logic for Colmado POS
//!
//! This crate is the **heart** of Colmado POS. It contains all business
//! logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌────────────────────────────────────────────────────────────────────────┐
//! │                      Colmado POS Architecture                          │
//! │                                                                        │
//! │  ┌──────────────────────────────────────────────────────────────────┐ │
//! │  │                 Presentation (forms, out of scope)               │ │
//! │  │    Catalog UI ──► Cart UI ──► Tender UI ──► Invoice window       │ │
//! │  └─────────────────────────────┬────────────────────────────────────┘ │
//! │                                │                                      │
//! │  ┌─────────────────────────────▼────────────────────────────────────┐ │
//! │  │               ★ colmado-core (THIS CRATE) ★                      │ │
//! │  │                                                                  │ │
//! │  │  ┌─────────┐ ┌─────────┐ ┌──────┐ ┌─────────┐ ┌────────────┐    │ │
//! │  │  │  types  │ │ pricing │ │ cart │ │ invoice │ │ validation │    │ │
//! │  │  └─────────┘ └─────────┘ └──────┘ └─────────┘ └────────────┘    │ │
//! │  │                                                                  │ │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS               │ │
//! │  └─────────────────────────────┬────────────────────────────────────┘ │
//! │                                │                                      │
//! │  ┌─────────────────────────────▼────────────────────────────────────┐ │
//! │  │                 colmado-db (storage layer)                       │ │
//! │  │   Stock Guard, Sale Transaction Engine, repositories, history   │ │
//! │  └──────────────────────────────────────────────────────────────────┘ │
//! └────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, SaleLine, ...)
//! - [`money`] - Rounding policy and the closed ITBIS rate set
//! - [`pricing`] - The Pricing Calculator
//! - [`cart`] - The in-memory cart with advisory stock pre-checks
//! - [`invoice`] - Fixed-width invoice rendering
//! - [`validation`] - Business-rule validation
//! - [`error`] - Typed domain errors
//!
//! ## Design Principles
//!
//! 1. **Pure functions**: same input, same output - the clock and the store
//!    live in `colmado-db`
//! 2. **Explicit records**: the invariants of the data model are enforced at
//!    construction, not re-checked ad hoc
//! 3. **Typed errors**: callers match on enum variants, never on message text
//! 4. **Late rounding**: full precision through the math, `round2` only at
//!    the persistence/display boundary

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod invoice;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine, CartTotals};
pub use error::{CartError, ValidationError};
pub use invoice::{format_invoice, StoreIdentity};
pub use money::{money_eq, round2, ItbisRate};
pub use pricing::{compute_line, LinePricing};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Category assigned when a product is registered without one.
pub const DEFAULT_CATEGORY: &str = "General";

/// Display name for a sale with no customer record attached.
pub const WALK_IN_CUSTOMER: &str = "Walk-in Customer";

/// Maximum distinct products in a single cart.
///
/// Prevents runaway carts; a colmado counter sale never comes close.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity on a single line.
///
/// Catches typos like 1000 instead of 10 before they reach the store.
pub const MAX_QUANTITY_PER_LINE: f64 = 999.0;
