//! # Cart
//!
//! The in-memory cart for one sale in progress.
//!
//! ## Authority Model
//! ```text
//! ┌────────────────────────────────────────────────────────────────────────┐
//! │                 Cart Checks Are ADVISORY Only                          │
//! │                                                                        │
//! │  Catalog snapshot ──► Cart.add() pre-check ──► immediate UI feedback   │
//! │        (stale!)                                                        │
//! │                                                                        │
//! │  CheckoutRequest ──► Sale Transaction Engine ──► Stock Guard           │
//! │                                                  (authoritative,       │
//! │                                                   inside the txn)      │
//! │                                                                        │
//! │  Stock may change between the snapshot and checkout; only the guard    │
//! │  under the transaction's lock decides whether the sale goes through.   │
//! └────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cart belongs to exactly one in-progress checkout. It is never shared
//! across operators and is discarded after `process_sale` returns.

use serde::{Deserialize, Serialize};

use crate::error::CartError;
use crate::money::ItbisRate;
use crate::pricing::compute_line;
use crate::types::{CatalogEntry, CheckoutItem, CheckoutRequest, Discount};
use crate::validation::{validate_discount, validate_quantity};
use crate::MAX_CART_LINES;

/// One line of the in-progress cart.
///
/// Prices here come from the catalog snapshot the caller supplied when the
/// line was added; the engine will re-derive them from the store at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: i64,
    pub name: String,
    /// Base unit price from the snapshot (before ITBIS).
    pub price_excl_itbis: f64,
    /// Rate charged per the snapshot's tax flag.
    pub itbis_rate: ItbisRate,
    pub quantity: f64,
    /// Last-known stock, for the advisory pre-check only.
    pub stock_hint: f64,
}

impl CartLine {
    /// Recomputes the line's derived figures from the snapshot price.
    fn pricing(&self) -> crate::pricing::LinePricing {
        // quantity was validated on the way in
        compute_line(self.price_excl_itbis, self.itbis_rate, self.quantity)
            .expect("cart lines hold validated quantities")
    }
}

/// Cart-level totals, full precision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CartTotals {
    pub subtotal_excl_itbis: f64,
    pub total_itbis: f64,
    pub subtotal_incl_itbis: f64,
    pub discount_amount: f64,
    pub net_total: f64,
}

/// An ordered, in-memory collection of lines for a sale in progress.
///
/// Single-threaded by design; owned exclusively by one checkout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
    discount: Discount,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds a product from the catalog snapshot, merging with an existing
    /// line for the same product.
    ///
    /// ## Advisory Pre-check
    /// The cumulative requested quantity is compared against the snapshot's
    /// stock figure so the operator gets instant feedback; the figure may be
    /// stale, so passing here guarantees nothing about checkout.
    pub fn add(&mut self, entry: &CatalogEntry, quantity: f64) -> Result<(), CartError> {
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(CartError::QuantityNotPositive);
        }

        let cumulative = quantity
            + self
                .lines
                .iter()
                .find(|l| l.product_id == entry.id)
                .map_or(0.0, |l| l.quantity);

        // Same rule the engine applies per line, so a cart that builds
        // cleanly can never be rejected for its quantity cap later - and
        // pricing() can rely on every stored quantity being valid.
        validate_quantity(cumulative)?;

        if cumulative > entry.stock {
            return Err(CartError::ExceedsKnownStock {
                product_id: entry.id,
                name: entry.name.clone(),
                available: entry.stock,
                requested: cumulative,
            });
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == entry.id) {
            line.quantity = cumulative;
            return Ok(());
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CartError::CartFull {
                max: MAX_CART_LINES,
            });
        }

        let rate = if entry.itbis_applies {
            ItbisRate::from_f64(entry.itbis_rate).map_err(CartError::Validation)?
        } else {
            ItbisRate::Exempt
        };

        self.lines.push(CartLine {
            product_id: entry.id,
            name: entry.name.clone(),
            price_excl_itbis: entry.price_excl_itbis,
            itbis_rate: rate,
            quantity,
            stock_hint: entry.stock,
        });
        Ok(())
    }

    /// Removes the line for a product.
    pub fn remove(&mut self, product_id: i64) -> Result<(), CartError> {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        if self.lines.len() == before {
            return Err(CartError::ProductNotInCart { product_id });
        }
        Ok(())
    }

    /// Sets the discount for the sale.
    ///
    /// ## Fail-soft
    /// An out-of-range discount is rejected AND the stored discount is reset
    /// to zero: this is a UI-adjacent convenience figure, so a bad entry
    /// must not silently keep an older discount around.
    pub fn set_discount(&mut self, discount: Discount) -> Result<(), CartError> {
        let subtotal = self.totals_before_discount().1;
        if let Err(e) = validate_discount(&discount, subtotal) {
            self.discount = Discount::None;
            return Err(CartError::Validation(e));
        }
        self.discount = discount;
        Ok(())
    }

    /// The currently applied discount.
    pub fn discount(&self) -> Discount {
        self.discount
    }

    /// The lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Whether the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// (total ITBIS, ITBIS-inclusive subtotal) before discount.
    fn totals_before_discount(&self) -> (f64, f64) {
        let mut itbis = 0.0;
        let mut subtotal_incl = 0.0;
        for line in &self.lines {
            let p = line.pricing();
            itbis += p.line_itbis;
            subtotal_incl += p.line_subtotal;
        }
        (itbis, subtotal_incl)
    }

    /// Derives the cart-level totals.
    ///
    /// The discount is applied to the ITBIS-inclusive subtotal (the behavior
    /// of the current DB-backed generation of this system).
    pub fn totals(&self) -> CartTotals {
        let (total_itbis, subtotal_incl_itbis) = self.totals_before_discount();
        let discount_amount = self.discount.amount_for(subtotal_incl_itbis);
        CartTotals {
            subtotal_excl_itbis: subtotal_incl_itbis - total_itbis,
            total_itbis,
            subtotal_incl_itbis,
            discount_amount,
            net_total: subtotal_incl_itbis - discount_amount,
        }
    }

    /// Converts the cart into the checkout request for the engine.
    ///
    /// Only references and quantities travel; the engine re-derives every
    /// price from the persisted rows.
    pub fn to_checkout_request(&self, customer_id: Option<i64>, tendered: f64) -> CheckoutRequest {
        CheckoutRequest {
            customer_id,
            items: self
                .lines
                .iter()
                .map(|l| CheckoutItem {
                    product_id: l.product_id,
                    quantity: l.quantity,
                })
                .collect(),
            discount: self.discount,
            tendered,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
