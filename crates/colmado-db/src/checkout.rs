//! # Sale Transaction Engine
//!
//! Turns a validated checkout request into a committed sale: header, lines,
//! and stock decrements in one SQLite transaction.
//!
//! ## Transaction Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      process_sale, step by step                         │
//! │                                                                         │
//! │  validate request (no transaction yet)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN IMMEDIATE        ← takes the write lock up front                 │
//! │       │                                                                 │
//! │  Stock Guard            ← re-read products, check stock                 │
//! │       │                                                                 │
//! │  recompute prices       ← from the rows just read, never from           │
//! │       │                   anything the client sent                      │
//! │       │                                                                 │
//! │  discount + tender checks                                               │
//! │       │                                                                 │
//! │  INSERT sale header                                                     │
//! │  INSERT sale lines      ← name + unit price frozen into each line       │
//! │  UPDATE stock (guarded decrement, stock >= qty)                         │
//! │       │                                                                 │
//! │  COMMIT ─── any error above ──▶ ROLLBACK (nothing persisted)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Not Idempotent
//! Submitting the same request twice creates two sales. Retry after an
//! error is safe because a failed attempt persists nothing; retry after
//! success is a second sale.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use colmado_core::money::MONEY_EPSILON;
use colmado_core::validation::{validate_discount, validate_non_negative, validate_quantity};
use colmado_core::{compute_line, round2, CheckoutRequest, Sale, SaleLine, SaleRecord, ValidationError};

use crate::error::{CheckoutError, CheckoutResult, DbError};
use crate::repository::sale::{NewSale, NewSaleLine, SaleRepository};
use crate::stock::{self, GuardedProduct};

/// The Sale Transaction Engine.
///
/// Stateless; cheap to construct from the pool per call site via
/// `db.checkout()`.
#[derive(Debug, Clone)]
pub struct CheckoutEngine {
    pool: SqlitePool,
}

impl CheckoutEngine {
    /// Creates a new CheckoutEngine.
    pub fn new(pool: SqlitePool) -> Self {
        CheckoutEngine { pool }
    }

    /// Processes a complete sale.
    ///
    /// On success the sale is durably committed and the returned
    /// [`SaleRecord`] is ready for invoicing. On any error nothing is
    /// persisted and stock is untouched.
    ///
    /// ## Errors
    /// * [`CheckoutError::Validation`] - empty sale, bad quantity, bad
    ///   discount, insufficient cash tendered
    /// * [`CheckoutError::ProductNotFound`] - a requested product id does
    ///   not exist
    /// * [`CheckoutError::InsufficientStock`] - a line asks for more than
    ///   is on hand
    /// * [`CheckoutError::Storage`] - the database itself failed
    pub async fn process_sale(&self, request: &CheckoutRequest) -> CheckoutResult<SaleRecord> {
        // Cheap rejections before taking the write lock.
        if request.items.is_empty() {
            return Err(ValidationError::EmptySale.into());
        }
        for item in &request.items {
            validate_quantity(item.quantity)?;
        }
        validate_non_negative("tendered", request.tendered)?;

        debug!(
            items = request.items.len(),
            customer_id = ?request.customer_id,
            "Starting checkout"
        );

        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;

        // BEGIN IMMEDIATE serializes checkouts: the competing transaction
        // waits on the write lock (up to busy_timeout) instead of reading
        // stale stock.
        sqlx::query("BEGIN IMMEDIATE")
            .execute(&mut *conn)
            .await
            .map_err(DbError::from)?;

        match self.run_transaction(&mut conn, request).await {
            Ok(record) => {
                if let Err(commit_err) = sqlx::query("COMMIT").execute(&mut *conn).await {
                    // The raw BEGIN is invisible to the pool, so the
                    // transaction must be cleared before the connection is
                    // returned, or the next checkout inherits it.
                    if let Err(rollback_err) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                        warn!(error = %rollback_err, "Rollback failed after commit error");
                    }
                    return Err(DbError::from(commit_err).into());
                }
                info!(
                    sale_id = record.sale.id,
                    net_total = record.sale.net_total,
                    lines = record.lines.len(),
                    "Sale committed"
                );
                Ok(record)
            }
            Err(err) => {
                if let Err(rollback_err) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                    warn!(error = %rollback_err, "Rollback failed after checkout error");
                }
                Err(err)
            }
        }
    }

    /// The body of the transaction. Every `?` here unwinds to a ROLLBACK
    /// in the caller.
    async fn run_transaction(
        &self,
        conn: &mut SqliteConnection,
        request: &CheckoutRequest,
    ) -> CheckoutResult<SaleRecord> {
        let requests = stock::aggregate_requests(&request.items);
        let guarded = stock::verify_and_lock(conn, &requests).await?;

        // Price every line from the rows the guard just read. Totals
        // accumulate unrounded; rounding happens once, at persistence.
        let mut new_lines = Vec::with_capacity(request.items.len());
        let mut subtotal_incl = 0.0_f64;
        let mut total_itbis = 0.0_f64;

        for item in &request.items {
            let product = &find_guarded(&guarded, item.product_id)?.product;
            let rate = product.effective_itbis_rate()?;
            let pricing = compute_line(product.price_excl_itbis, rate, item.quantity)?;

            subtotal_incl += pricing.line_subtotal;
            total_itbis += pricing.line_itbis;

            new_lines.push(NewSaleLine {
                product_id: product.id,
                name_snapshot: product.name.clone(),
                quantity: item.quantity,
                unit_price: round2(pricing.unit_final_price),
                line_subtotal: round2(pricing.line_subtotal),
                line_itbis: round2(pricing.line_itbis),
            });
        }

        let subtotal_excl = subtotal_incl - total_itbis;

        validate_discount(&request.discount, subtotal_incl)?;
        let discount_amount = request.discount.amount_for(subtotal_incl);
        let net_total = subtotal_incl - discount_amount;

        if request.tendered + MONEY_EPSILON < net_total {
            return Err(ValidationError::InsufficientTender {
                required: round2(net_total),
                tendered: round2(request.tendered),
            }
            .into());
        }

        let now = Utc::now();
        let header = NewSale {
            customer_id: request.customer_id,
            created_at: now,
            subtotal_excl_itbis: round2(subtotal_excl),
            total_itbis: round2(total_itbis),
            subtotal_incl_itbis: round2(subtotal_incl),
            discount: round2(discount_amount),
            net_total: round2(net_total),
            tendered: round2(request.tendered),
            change_due: round2(request.tendered - net_total),
        };

        let sale_id = SaleRepository::insert_header(conn, &header).await?;

        let mut lines = Vec::with_capacity(new_lines.len());
        for line in &new_lines {
            let line_id = SaleRepository::insert_line(conn, sale_id, line).await?;
            lines.push(SaleLine {
                id: line_id,
                sale_id,
                product_id: line.product_id,
                name_snapshot: line.name_snapshot.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
                line_subtotal: line.line_subtotal,
                line_itbis: line.line_itbis,
            });
        }

        // Guarded decrement. The guard already verified under the write
        // lock, so the `stock >= qty` clause is a compare-and-swap backstop
        // that must always pass here.
        for g in &guarded {
            let result = sqlx::query(
                r#"
                UPDATE products
                SET stock = stock - ?2, updated_at = ?3
                WHERE id = ?1 AND stock >= ?2
                "#,
            )
            .bind(g.product.id)
            .bind(g.requested)
            .bind(now)
            .execute(&mut *conn)
            .await
            .map_err(DbError::from)?;

            if result.rows_affected() == 0 {
                return Err(CheckoutError::InsufficientStock {
                    product_id: g.product.id,
                    name: g.product.name.clone(),
                    available: g.product.stock,
                    requested: g.requested,
                });
            }
        }

        Ok(SaleRecord {
            sale: Sale {
                id: sale_id,
                customer_id: header.customer_id,
                created_at: header.created_at,
                subtotal_excl_itbis: header.subtotal_excl_itbis,
                total_itbis: header.total_itbis,
                subtotal_incl_itbis: header.subtotal_incl_itbis,
                discount: header.discount,
                net_total: header.net_total,
                tendered: header.tendered,
                change_due: header.change_due,
            },
            lines,
        })
    }
}

/// Looks up the guard result for one requested product. The guard was built
/// from the same item list, so a miss is an internal inconsistency, not a
/// user error.
fn find_guarded(guarded: &[GuardedProduct], product_id: i64) -> CheckoutResult<&GuardedProduct> {
    guarded
        .iter()
        .find(|g| g.product.id == product_id)
        .ok_or(CheckoutError::ProductNotFound { product_id })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use colmado_core::{
        money_eq, CheckoutItem, CheckoutRequest, Discount, ItbisRate, NewParty, NewProduct,
    };
    use uuid::Uuid;

    use crate::error::CheckoutError;
    use crate::pool::{Database, DbConfig};

    fn product(name: &str, price_excl: f64, stock: f64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            description: String::new(),
            purchase_price: price_excl * 0.7,
            price_excl_itbis: price_excl,
            itbis_applies: true,
            itbis_rate: ItbisRate::Standard,
            stock,
            category: None,
            supplier_id: None,
        }
    }

    fn request(items: Vec<CheckoutItem>, tendered: f64) -> CheckoutRequest {
        CheckoutRequest {
            customer_id: None,
            items,
            discount: Discount::None,
            tendered,
        }
    }

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory())
            .await
            .expect("in-memory database")
    }

    #[tokio::test]
    async fn test_successful_sale_totals_and_stock() {
        let db = test_db().await;
        let p = db
            .products()
            .register(&product("Refresco Rojo 2L", 100.0, 5.0))
            .await
            .unwrap();

        let record = db
            .checkout()
            .process_sale(&request(
                vec![CheckoutItem { product_id: p.id, quantity: 2.0 }],
                273.60,
            ))
            .await
            .unwrap();

        assert!(money_eq(record.sale.subtotal_excl_itbis, 200.0));
        assert!(money_eq(record.sale.total_itbis, 36.0));
        assert!(money_eq(record.sale.subtotal_incl_itbis, 236.0));
        assert!(money_eq(record.sale.net_total, 236.0));
        assert!(money_eq(record.sale.change_due, 37.60));

        assert_eq!(record.lines.len(), 1);
        assert_eq!(record.lines[0].name_snapshot, "Refresco Rojo 2L");
        assert!(money_eq(record.lines[0].unit_price, 118.0));
        assert!(money_eq(record.lines[0].line_subtotal, 236.0));

        let after = db.products().get_by_id(p.id).await.unwrap();
        assert!(money_eq(after.stock, 3.0));
    }

    #[tokio::test]
    async fn test_percent_discount_applies_to_itbis_inclusive_subtotal() {
        let db = test_db().await;
        let p = db
            .products()
            .register(&product("Galletas Dulces", 100.0, 5.0))
            .await
            .unwrap();

        let mut req = request(vec![CheckoutItem { product_id: p.id, quantity: 2.0 }], 250.0);
        req.discount = Discount::Percent(10.0);

        let record = db.checkout().process_sale(&req).await.unwrap();
        assert!(money_eq(record.sale.discount, 23.60));
        assert!(money_eq(record.sale.net_total, 212.40));
        assert!(money_eq(record.sale.change_due, 37.60));

        let after = db.products().get_by_id(p.id).await.unwrap();
        assert!(money_eq(after.stock, 3.0));
    }

    #[tokio::test]
    async fn test_insufficient_stock_rejected_and_nothing_persisted() {
        let db = test_db().await;
        let p = db
            .products()
            .register(&product("Leche Evaporada", 60.0, 1.0))
            .await
            .unwrap();

        let err = db
            .checkout()
            .process_sale(&request(
                vec![CheckoutItem { product_id: p.id, quantity: 2.0 }],
                500.0,
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::InsufficientStock { available, requested, .. }
            if available == 1.0 && requested == 2.0));
        assert_eq!(db.sales().count().await.unwrap(), 0);
        let after = db.products().get_by_id(p.id).await.unwrap();
        assert!(money_eq(after.stock, 1.0));
    }

    #[tokio::test]
    async fn test_one_bad_line_rolls_back_all_lines() {
        let db = test_db().await;
        let good = db
            .products()
            .register(&product("Pan Sobao", 10.0, 50.0))
            .await
            .unwrap();

        let err = db
            .checkout()
            .process_sale(&request(
                vec![
                    CheckoutItem { product_id: good.id, quantity: 3.0 },
                    CheckoutItem { product_id: 9999, quantity: 1.0 },
                ],
                500.0,
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::ProductNotFound { product_id: 9999 }));
        assert_eq!(db.sales().count().await.unwrap(), 0);
        let after = db.products().get_by_id(good.id).await.unwrap();
        assert!(money_eq(after.stock, 50.0));
    }

    #[tokio::test]
    async fn test_duplicate_lines_checked_against_combined_quantity() {
        let db = test_db().await;
        let p = db
            .products()
            .register(&product("Azúcar Crema 1lb", 30.0, 3.0))
            .await
            .unwrap();

        // 2 + 2 exceeds the 3 on hand even though each line alone fits.
        let err = db
            .checkout()
            .process_sale(&request(
                vec![
                    CheckoutItem { product_id: p.id, quantity: 2.0 },
                    CheckoutItem { product_id: p.id, quantity: 2.0 },
                ],
                500.0,
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::InsufficientStock { requested, .. } if requested == 4.0));
    }

    #[tokio::test]
    async fn test_insufficient_tender_rejected() {
        let db = test_db().await;
        let p = db
            .products()
            .register(&product("Café Molido 1lb", 200.0, 10.0))
            .await
            .unwrap();

        let err = db
            .checkout()
            .process_sale(&request(
                vec![CheckoutItem { product_id: p.id, quantity: 1.0 }],
                200.0, // final price is 236.00
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Validation(_)));
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_exact_tender_accepted_with_zero_change() {
        let db = test_db().await;
        let p = db
            .products()
            .register(&product("Jabón de Cuaba", 50.0, 10.0))
            .await
            .unwrap();

        let record = db
            .checkout()
            .process_sale(&request(
                vec![CheckoutItem { product_id: p.id, quantity: 1.0 }],
                59.0,
            ))
            .await
            .unwrap();
        assert!(money_eq(record.sale.change_due, 0.0));
    }

    #[tokio::test]
    async fn test_connection_clean_after_failed_checkout() {
        // Single-connection pool: a failed checkout must hand the
        // connection back with no transaction left open, or this second
        // sale would fail spuriously on the same connection.
        let db = test_db().await;
        let p = db
            .products()
            .register(&product("Funda de Hielo", 25.0, 1.0))
            .await
            .unwrap();

        let err = db
            .checkout()
            .process_sale(&request(
                vec![CheckoutItem { product_id: p.id, quantity: 2.0 }],
                100.0,
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::InsufficientStock { .. }));

        let record = db
            .checkout()
            .process_sale(&request(
                vec![CheckoutItem { product_id: p.id, quantity: 1.0 }],
                100.0,
            ))
            .await
            .unwrap();
        assert_eq!(record.lines.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_sale_rejected() {
        let db = test_db().await;
        let err = db
            .checkout()
            .process_sale(&request(vec![], 100.0))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Validation(_)));
    }

    #[tokio::test]
    async fn test_sale_records_customer_id() {
        let db = test_db().await;
        let customer = db
            .customers()
            .register(&NewParty {
                name: "Carmen Rosario".to_string(),
                phone: "809-555-0001".to_string(),
                address: String::new(),
            })
            .await
            .unwrap();
        let p = db
            .products()
            .register(&product("Plátano Verde", 15.0, 30.0))
            .await
            .unwrap();

        let mut req = request(vec![CheckoutItem { product_id: p.id, quantity: 6.0 }], 200.0);
        req.customer_id = Some(customer.id);

        let record = db.checkout().process_sale(&req).await.unwrap();
        assert_eq!(record.sale.customer_id, Some(customer.id));

        let reread = db.sales().get_by_id(record.sale.id).await.unwrap();
        assert_eq!(reread.sale.customer_id, Some(customer.id));
    }

    #[tokio::test]
    async fn test_fractional_quantity_sale() {
        let db = test_db().await;
        let p = db
            .products()
            .register(&product("Queso de Freír (lb)", 200.0, 5.0))
            .await
            .unwrap();

        let record = db
            .checkout()
            .process_sale(&request(
                vec![CheckoutItem { product_id: p.id, quantity: 0.5 }],
                200.0,
            ))
            .await
            .unwrap();

        assert!(money_eq(record.sale.net_total, 118.0));
        let after = db.products().get_by_id(p.id).await.unwrap();
        assert!(money_eq(after.stock, 4.5));
    }

    /// Two checkouts race for the last unit. BEGIN IMMEDIATE serializes
    /// them: exactly one commits, the loser sees the updated stock.
    ///
    /// Needs a file-backed database; two pool connections to `:memory:`
    /// would each see their own empty database.
    #[tokio::test]
    async fn test_concurrent_checkouts_oversell_impossible() {
        let path = std::env::temp_dir().join(format!("colmado-test-{}.sqlite", Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path).max_connections(4))
            .await
            .expect("file-backed database");

        let p = db
            .products()
            .register(&product("Última Cerveza", 80.0, 1.0))
            .await
            .unwrap();

        let req = request(vec![CheckoutItem { product_id: p.id, quantity: 1.0 }], 100.0);
        let checkout_a = db.checkout();
        let checkout_b = db.checkout();
        let (a, b) = tokio::join!(
            checkout_a.process_sale(&req),
            checkout_b.process_sale(&req),
        );

        let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(successes, 1, "exactly one of the racing checkouts may commit");

        let after = db.products().get_by_id(p.id).await.unwrap();
        assert!(money_eq(after.stock, 0.0));
        assert_eq!(db.sales().count().await.unwrap(), 1);

        db.close().await;
        let _ = std::fs::remove_file(&path);
    }
}
