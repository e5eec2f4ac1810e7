//! # Sale Repository
//!
//! Persistence for sale headers and lines.
//!
//! ## Two Kinds of Entry Points
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Writes take `&mut SqliteConnection`:                                   │
//! │    the checkout engine owns the transaction and threads one             │
//! │    connection through header insert, line inserts, and stock            │
//! │    decrements so they commit or roll back as a unit.                    │
//! │                                                                         │
//! │  Reads take the pool:                                                   │
//! │    history and invoice reprints are plain queries with no               │
//! │    transactional needs.                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sales are append-only. There is no update or delete here on purpose.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use colmado_core::{Sale, SaleLine, SaleRecord};

use crate::error::{DbError, DbResult};

/// A sale header ready to insert; everything but the database-assigned id.
/// All money fields are already rounded to centavos by the engine.
#[derive(Debug, Clone)]
pub struct NewSale {
    pub customer_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub subtotal_excl_itbis: f64,
    pub total_itbis: f64,
    pub subtotal_incl_itbis: f64,
    pub discount: f64,
    pub net_total: f64,
    pub tendered: f64,
    pub change_due: f64,
}

/// A sale line ready to insert, with the product name and unit price
/// already frozen.
#[derive(Debug, Clone)]
pub struct NewSaleLine {
    pub product_id: i64,
    pub name_snapshot: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub line_subtotal: f64,
    pub line_itbis: f64,
}

/// Repository for sale reads, plus the transactional write helpers the
/// checkout engine uses.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Inserts a sale header on the caller's transaction connection.
    /// Returns the assigned sale id.
    pub async fn insert_header(conn: &mut SqliteConnection, sale: &NewSale) -> DbResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO sales (
                customer_id, created_at, subtotal_excl_itbis, total_itbis,
                subtotal_incl_itbis, discount, net_total, tendered, change_due
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(sale.customer_id)
        .bind(sale.created_at)
        .bind(sale.subtotal_excl_itbis)
        .bind(sale.total_itbis)
        .bind(sale.subtotal_incl_itbis)
        .bind(sale.discount)
        .bind(sale.net_total)
        .bind(sale.tendered)
        .bind(sale.change_due)
        .execute(&mut *conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Inserts one sale line on the caller's transaction connection.
    /// Returns the assigned line id.
    pub async fn insert_line(
        conn: &mut SqliteConnection,
        sale_id: i64,
        line: &NewSaleLine,
    ) -> DbResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO sale_lines (
                sale_id, product_id, name_snapshot, quantity,
                unit_price, line_subtotal, line_itbis
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(sale_id)
        .bind(line.product_id)
        .bind(&line.name_snapshot)
        .bind(line.quantity)
        .bind(line.unit_price)
        .bind(line.line_subtotal)
        .bind(line.line_itbis)
        .execute(&mut *conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Fetches a complete sale record: header plus lines in insertion order.
    pub async fn get_by_id(&self, id: i64) -> DbResult<SaleRecord> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, customer_id, created_at, subtotal_excl_itbis, total_itbis,
                   subtotal_incl_itbis, discount, net_total, tendered, change_due
            FROM sales
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Sale", id))?;

        let lines = self.lines_for(id).await?;
        Ok(SaleRecord { sale, lines })
    }

    /// Lines of one sale, in insertion order.
    pub async fn lines_for(&self, sale_id: i64) -> DbResult<Vec<SaleLine>> {
        let lines = sqlx::query_as::<_, SaleLine>(
            r#"
            SELECT id, sale_id, product_id, name_snapshot, quantity,
                   unit_price, line_subtotal, line_itbis
            FROM sale_lines
            WHERE sale_id = ?1
            ORDER BY id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(lines)
    }

    /// Counts persisted sales (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
