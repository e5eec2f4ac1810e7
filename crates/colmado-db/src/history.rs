//! # Sales History Query
//!
//! Read-only views over committed sales: the day's register, per-customer
//! purchase history, and period totals.
//!
//! ## Snapshots, Not Joins to Products
//! Line items render from the name and price frozen at sale time, so a
//! product renamed or repriced later never rewrites history. Customer names
//! ARE joined live (the registry is the source of truth for who someone
//! is), with a display fallback when the row cannot be resolved.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use colmado_core::{Customer, Sale, SaleRecord, WALK_IN_CUSTOMER};

use crate::error::{DbError, DbResult};
use crate::repository::sale::SaleRepository;

/// Display name used when a sale references a customer row that cannot be
/// resolved.
const UNKNOWN_CUSTOMER: &str = "Unknown customer";

/// Filter for [`SalesHistory::query`]. `None` fields do not constrain.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct HistoryFilter {
    /// Include sales at or after this instant.
    pub from: Option<DateTime<Utc>>,
    /// Include sales at or before this instant.
    pub to: Option<DateTime<Utc>>,
    /// Only sales of this registered customer.
    pub customer_id: Option<i64>,
}

impl HistoryFilter {
    pub fn since(from: DateTime<Utc>) -> Self {
        HistoryFilter {
            from: Some(from),
            ..Default::default()
        }
    }

    pub fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        HistoryFilter {
            from: Some(from),
            to: Some(to),
            customer_id: None,
        }
    }

    pub fn for_customer(customer_id: i64) -> Self {
        HistoryFilter {
            customer_id: Some(customer_id),
            ..Default::default()
        }
    }
}

/// One row of the history listing: the full sale record (header plus the
/// snapshot lines it was sold with) and a resolved customer display name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleSummary {
    pub record: SaleRecord,
    pub customer_name: String,
}

/// A registered customer's full purchase history.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerHistory {
    pub customer: Customer,
    /// Newest first, lines included.
    pub sales: Vec<SaleRecord>,
    /// Sum of `net_total` over every sale, lifetime.
    pub lifetime_total: f64,
}

/// Read-only query surface over the sales tables.
#[derive(Debug, Clone)]
pub struct SalesHistory {
    pool: SqlitePool,
}

impl SalesHistory {
    /// Creates a new SalesHistory.
    pub fn new(pool: SqlitePool) -> Self {
        SalesHistory { pool }
    }

    /// Lists sales matching the filter, newest first. An empty result is
    /// an empty vec, never an error.
    pub async fn query(&self, filter: HistoryFilter) -> DbResult<Vec<SaleSummary>> {
        debug!(?filter, "Querying sales history");

        let rows = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT s.id, s.customer_id, s.created_at, s.subtotal_excl_itbis,
                   s.total_itbis, s.subtotal_incl_itbis, s.discount,
                   s.net_total, s.tendered, s.change_due,
                   c.name AS customer_name
            FROM sales s
            LEFT JOIN customers c ON c.id = s.customer_id
            WHERE (?1 IS NULL OR s.created_at >= ?1)
              AND (?2 IS NULL OR s.created_at <= ?2)
              AND (?3 IS NULL OR s.customer_id = ?3)
            ORDER BY s.created_at DESC, s.id DESC
            "#,
        )
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.customer_id)
        .fetch_all(&self.pool)
        .await?;

        // Reattach the denormalized lines: history renders from the
        // snapshots, never from the current product table.
        let sales = SaleRepository::new(self.pool.clone());
        let mut summaries = Vec::with_capacity(rows.len());
        for row in rows {
            let lines = sales.lines_for(row.sale.id).await?;
            let customer_name = row.display_name();
            summaries.push(SaleSummary {
                record: SaleRecord {
                    sale: row.sale,
                    lines,
                },
                customer_name,
            });
        }
        Ok(summaries)
    }

    /// Total revenue (`net_total`) over a period. Zero when no sales fall
    /// inside it.
    pub async fn period_total(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> DbResult<f64> {
        let total: f64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(net_total), 0.0)
            FROM sales
            WHERE created_at >= ?1 AND created_at <= ?2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    /// A registered customer's purchase history with their lifetime total.
    ///
    /// Fails with [`DbError::NotFound`] when the customer does not exist;
    /// a customer with no purchases gets an empty history and a zero total.
    pub async fn customer_history(&self, customer_id: i64) -> DbResult<CustomerHistory> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT id, name, phone, address, created_at FROM customers WHERE id = ?1",
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Customer", customer_id))?;

        let headers = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, customer_id, created_at, subtotal_excl_itbis, total_itbis,
                   subtotal_incl_itbis, discount, net_total, tendered, change_due
            FROM sales
            WHERE customer_id = ?1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        let repo = SaleRepository::new(self.pool.clone());
        let mut sales = Vec::with_capacity(headers.len());
        for sale in headers {
            let lines = repo.lines_for(sale.id).await?;
            sales.push(SaleRecord { sale, lines });
        }

        let lifetime_total = sales.iter().map(|r| r.sale.net_total).sum();

        Ok(CustomerHistory {
            customer,
            sales,
            lifetime_total,
        })
    }
}

/// Internal join row; `customer_name` is NULL for walk-ins and for
/// unresolvable customer ids.
#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    #[sqlx(flatten)]
    sale: Sale,
    customer_name: Option<String>,
}

impl SummaryRow {
    fn display_name(&self) -> String {
        match (&self.sale.customer_id, &self.customer_name) {
            (None, _) => WALK_IN_CUSTOMER.to_string(),
            (Some(_), Some(name)) => name.clone(),
            (Some(_), None) => UNKNOWN_CUSTOMER.to_string(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
