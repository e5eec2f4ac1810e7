//! # Domain Types
//!
//! Core domain types used throughout Colmado POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌────────────────────────────────────────────────────────────────────────┐
//! │                          Domain Types                                  │
//! │                                                                        │
//! │  ┌───────────────┐   ┌───────────────┐   ┌───────────────┐            │
//! │  │    Product    │   │     Sale      │   │   SaleLine    │            │
//! │  │  ───────────  │   │  ───────────  │   │  ───────────  │            │
//! │  │  id (i64)     │   │  id (i64)     │   │  sale_id (FK) │            │
//! │  │  prices+stock │   │  totals       │   │  snapshots    │            │
//! │  └───────────────┘   └───────────────┘   └───────────────┘            │
//! │                                                                        │
//! │  ┌───────────────┐   ┌───────────────┐   ┌───────────────┐            │
//! │  │   Customer    │   │   Supplier    │   │  SaleRecord   │            │
//! │  │  id/name/...  │   │  id/name/...  │   │  Sale + lines │            │
//! │  └───────────────┘   └───────────────┘   └───────────────┘            │
//! └────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Ownership
//! A `Sale` exclusively owns its `SaleLine`s (same lifetime, same
//! transaction). A `Product` is only referenced: each line denormalizes the
//! product name and unit price at sale time, so later edits to the product
//! can never alter history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::ItbisRate;
use crate::validation::{validate_name, validate_non_negative};
use crate::DEFAULT_CATEGORY;

// =============================================================================
// Product
// =============================================================================

/// A product on the shelf.
///
/// The derived columns (`itbis_amount`, `final_price`) are computed once at
/// construction from the base price and rate; they are stored rather than
/// recomputed per read so the catalog a cashier sees matches what the
/// invoice will print.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// What the store pays the supplier per unit.
    pub purchase_price: f64,
    /// Sale price before ITBIS.
    pub price_excl_itbis: f64,
    /// Whether ITBIS applies to this product.
    pub itbis_applies: bool,
    /// Stored rate as a fraction (0.18). Use [`Product::effective_itbis_rate`].
    pub itbis_rate: f64,
    /// `price_excl_itbis × itbis_rate` when applicable, else 0.
    pub itbis_amount: f64,
    /// `price_excl_itbis + itbis_amount`.
    pub final_price: f64,
    /// Units on hand; fractional for weight/volume goods. Never negative.
    pub stock: f64,
    pub category: String,
    pub supplier_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// The rate actually charged: [`ItbisRate::Exempt`] when the flag is
    /// off, otherwise the stored rate.
    ///
    /// A stored rate outside the legal set means the row was written by
    /// something other than this crate; surfaced as a validation error.
    pub fn effective_itbis_rate(&self) -> Result<ItbisRate, ValidationError> {
        if !self.itbis_applies {
            return Ok(ItbisRate::Exempt);
        }
        ItbisRate::from_f64(self.itbis_rate)
    }
}

/// Input for registering (or editing) a product.
///
/// Field invariants are enforced here, at construction time, instead of
/// being re-checked ad hoc at every call site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub purchase_price: f64,
    pub price_excl_itbis: f64,
    pub itbis_applies: bool,
    pub itbis_rate: ItbisRate,
    pub stock: f64,
    /// `None` falls back to [`DEFAULT_CATEGORY`].
    pub category: Option<String>,
    pub supplier_id: Option<i64>,
}

impl NewProduct {
    /// Validates the registration input.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name(&self.name)?;
        validate_non_negative("purchase_price", self.purchase_price)?;
        validate_non_negative("price_excl_itbis", self.price_excl_itbis)?;
        validate_non_negative("stock", self.stock)?;
        Ok(())
    }

    /// The rate charged given the tax-applicable flag.
    pub fn effective_rate(&self) -> ItbisRate {
        if self.itbis_applies {
            self.itbis_rate
        } else {
            ItbisRate::Exempt
        }
    }

    /// Derived per-unit ITBIS amount.
    pub fn itbis_amount(&self) -> f64 {
        self.price_excl_itbis * self.effective_rate().as_f64()
    }

    /// Derived final sale price (ITBIS-inclusive).
    pub fn final_price(&self) -> f64 {
        self.price_excl_itbis + self.itbis_amount()
    }

    /// Category with the default applied.
    pub fn category_or_default(&self) -> &str {
        match self.category.as_deref().map(str::trim) {
            Some(c) if !c.is_empty() => c,
            _ => DEFAULT_CATEGORY,
        }
    }
}

/// One entry of the sellable catalog (the `list_sellable_products` read).
///
/// This is what the presentation layer holds while building a cart; it is a
/// snapshot, advisory only. The Stock Guard inside the checkout transaction
/// is the authority on stock and the engine re-reads prices itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CatalogEntry {
    pub id: i64,
    pub name: String,
    pub price_excl_itbis: f64,
    pub itbis_applies: bool,
    pub itbis_rate: f64,
    pub final_price: f64,
    pub stock: f64,
}

impl From<&Product> for CatalogEntry {
    fn from(p: &Product) -> Self {
        CatalogEntry {
            id: p.id,
            name: p.name.clone(),
            price_excl_itbis: p.price_excl_itbis,
            itbis_applies: p.itbis_applies,
            itbis_rate: p.itbis_rate,
            final_price: p.final_price,
            stock: p.stock,
        }
    }
}

// =============================================================================
// Customer / Supplier
// =============================================================================

/// A registered customer. Purchase history is derived from sales, never
/// stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

/// A supplier of products. Same shape as [`Customer`], distinct kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

/// Registration input shared by customers and suppliers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewParty {
    pub name: String,
    pub phone: String,
    pub address: String,
}

// =============================================================================
// Sale
// =============================================================================

/// A completed sale header. Immutable after creation; there is no edit or
/// void path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: i64,
    /// `None` means a walk-in customer.
    pub customer_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub subtotal_excl_itbis: f64,
    pub total_itbis: f64,
    /// `subtotal_excl_itbis + total_itbis`, before discount.
    pub subtotal_incl_itbis: f64,
    pub discount: f64,
    /// `subtotal_incl_itbis - discount`.
    pub net_total: f64,
    pub tendered: f64,
    /// `tendered - net_total`.
    pub change_due: f64,
}

/// One line of a sale, with the product name and unit price frozen at sale
/// time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleLine {
    pub id: i64,
    pub sale_id: i64,
    pub product_id: i64,
    /// Product name at sale time (frozen).
    pub name_snapshot: String,
    pub quantity: f64,
    /// Final ITBIS-inclusive unit price at sale time (frozen).
    pub unit_price: f64,
    /// `quantity × unit_price`.
    pub line_subtotal: f64,
    /// ITBIS portion of this line.
    pub line_itbis: f64,
}

/// The fully materialized result of a successful checkout: header plus
/// lines, ready for invoicing and history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub sale: Sale,
    pub lines: Vec<SaleLine>,
}

// =============================================================================
// Checkout Request
// =============================================================================

/// One requested line of a checkout: just the reference and the quantity.
/// Prices are deliberately absent; the engine derives them from the store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheckoutItem {
    pub product_id: i64,
    pub quantity: f64,
}

/// A discount as entered by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Discount {
    /// No discount.
    #[default]
    None,
    /// Fixed amount in pesos, `[0, subtotal_incl_itbis]`.
    Amount(f64),
    /// Percentage of the ITBIS-inclusive subtotal, `[0, 100]`.
    Percent(f64),
}

impl Discount {
    /// The peso amount this discount takes off the given ITBIS-inclusive
    /// subtotal. Assumes the discount has already been validated.
    pub fn amount_for(&self, subtotal_incl_itbis: f64) -> f64 {
        match *self {
            Discount::None => 0.0,
            Discount::Amount(amount) => amount,
            Discount::Percent(pct) => subtotal_incl_itbis * (pct / 100.0),
        }
    }
}

/// The checkout request the presentation layer hands to the Sale
/// Transaction Engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    /// `None` means a walk-in customer.
    pub customer_id: Option<i64>,
    pub items: Vec<CheckoutItem>,
    pub discount: Discount,
    /// Cash handed over by the customer.
    pub tendered: f64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::money_eq;

    fn taxed_product() -> NewProduct {
        NewProduct {
            name: "Salami Superior 1lb".to_string(),
            description: String::new(),
            purchase_price: 120.0,
            price_excl_itbis: 175.0,
            itbis_applies: true,
            itbis_rate: ItbisRate::Standard,
            stock: 12.0,
            category: None,
            supplier_id: None,
        }
    }

    #[test]
    fn test_new_product_derived_fields() {
        let p = taxed_product();
        assert!(money_eq(p.itbis_amount(), 31.5));
        assert!(money_eq(p.final_price(), 206.5));
    }

    #[test]
    fn test_new_product_exempt_when_flag_off() {
        let mut p = taxed_product();
        p.itbis_applies = false;
        assert_eq!(p.effective_rate(), ItbisRate::Exempt);
        assert_eq!(p.itbis_amount(), 0.0);
        assert_eq!(p.final_price(), p.price_excl_itbis);
    }

    #[test]
    fn test_new_product_category_default() {
        let mut p = taxed_product();
        assert_eq!(p.category_or_default(), DEFAULT_CATEGORY);
        p.category = Some("  ".to_string());
        assert_eq!(p.category_or_default(), DEFAULT_CATEGORY);
        p.category = Some("Embutidos".to_string());
        assert_eq!(p.category_or_default(), "Embutidos");
    }

    #[test]
    fn test_new_product_validation() {
        let mut p = taxed_product();
        assert!(p.validate().is_ok());

        p.name = "  ".to_string();
        assert!(p.validate().is_err());

        let mut p = taxed_product();
        p.stock = -1.0;
        assert!(p.validate().is_err());

        let mut p = taxed_product();
        p.price_excl_itbis = -0.01;
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_discount_amount_for() {
        assert_eq!(Discount::None.amount_for(236.0), 0.0);
        assert!(money_eq(Discount::Amount(20.0).amount_for(236.0), 20.0));
        assert!(money_eq(Discount::Percent(10.0).amount_for(236.0), 23.6));
    }
}
