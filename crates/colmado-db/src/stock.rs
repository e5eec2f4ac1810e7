//! # Stock Guard
//!
//! The single authoritative stock check. Every checkout path routes through
//! here; there is no fast path that skips it.
//!
//! ## Isolation
//! ```text
//! ┌────────────────────────────────────────────────────────────────────────┐
//! │             Why the Guard Is Safe (check-then-act)                     │
//! │                                                                        │
//! │  SQLite has no SELECT ... FOR UPDATE. Instead:                         │
//! │                                                                        │
//! │  1. The enclosing transaction opens with BEGIN IMMEDIATE, taking the   │
//! │     database write lock up front. A competing checkout blocks on its   │
//! │     own BEGIN IMMEDIATE until we commit or roll back.                  │
//! │  2. So the rows read here cannot change under us before our own        │
//! │     decrements commit - the check and the act are one atomic unit.     │
//! │  3. The decrement itself still carries a `stock >= qty` guard as a     │
//! │     compare-and-swap backstop (and the schema CHECKs stock >= 0).      │
//! │                                                                        │
//! │  The loser of the lock race runs after the winner's commit and is      │
//! │  evaluated against the updated stock - exactly the serialization the   │
//! │  engine needs.                                                         │
//! └────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqliteConnection;
use tracing::debug;

use colmado_core::{CheckoutItem, Product};

use crate::error::{CheckoutError, CheckoutResult};

/// A product row read under the transaction's lock, paired with the total
/// quantity the cart requests of it.
#[derive(Debug, Clone)]
pub struct GuardedProduct {
    pub product: Product,
    pub requested: f64,
}

/// Collapses cart lines into one (product, total quantity) request each,
/// preserving first-seen order.
///
/// The cart already merges duplicates, but the guard must not rely on the
/// caller having done so: two lines for one product must be checked against
/// their combined quantity.
pub fn aggregate_requests(items: &[CheckoutItem]) -> Vec<(i64, f64)> {
    let mut out: Vec<(i64, f64)> = Vec::with_capacity(items.len());
    for item in items {
        match out.iter_mut().find(|(id, _)| *id == item.product_id) {
            Some((_, qty)) => *qty += item.quantity,
            None => out.push((item.product_id, item.quantity)),
        }
    }
    out
}

/// Re-reads every requested product inside the caller's transaction and
/// verifies stock sufficiency.
///
/// Fails the whole checkout on the first insufficient line; the caller must
/// already be inside a transaction it can roll back. On success the locked
/// rows are returned so the engine can recompute prices from them instead
/// of trusting anything client-supplied.
pub async fn verify_and_lock(
    conn: &mut SqliteConnection,
    requests: &[(i64, f64)],
) -> CheckoutResult<Vec<GuardedProduct>> {
    let mut guarded = Vec::with_capacity(requests.len());

    for &(product_id, requested) in requests {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, name, description, purchase_price, price_excl_itbis,
                itbis_applies, itbis_rate, itbis_amount, final_price,
                stock, category, supplier_id, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(CheckoutError::ProductNotFound { product_id })?;

        if product.stock < requested {
            debug!(
                product_id,
                available = product.stock,
                requested,
                "Stock guard rejected checkout"
            );
            return Err(CheckoutError::InsufficientStock {
                product_id,
                name: product.name,
                available: product.stock,
                requested,
            });
        }

        guarded.push(GuardedProduct { product, requested });
    }

    Ok(guarded)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_requests_merges_duplicates() {
        let items = [
            CheckoutItem { product_id: 1, quantity: 2.0 },
            CheckoutItem { product_id: 2, quantity: 1.0 },
            CheckoutItem { product_id: 1, quantity: 3.0 },
        ];
        assert_eq!(aggregate_requests(&items), vec![(1, 5.0), (2, 1.0)]);
    }

    #[test]
    fn test_aggregate_requests_preserves_order() {
        let items = [
            CheckoutItem { product_id: 9, quantity: 1.0 },
            CheckoutItem { product_id: 3, quantity: 1.0 },
        ];
        assert_eq!(aggregate_requests(&items), vec![(9, 1.0), (3, 1.0)]);
    }
}
