//! # Product Repository
//!
//! Database operations for products: registration, the sellable catalog,
//! restocking, and the low-stock report.
//!
//! ## Derived Price Columns
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  What Gets Stored vs. Derived                           │
//! │                                                                         │
//! │  Operator enters:  price_excl_itbis = 100.00, rate = 18%                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Repository derives and stores at write time:                           │
//! │     itbis_amount = 18.00                                                │
//! │     final_price  = 118.00                                               │
//! │                                                                         │
//! │  Why store them? The catalog a cashier browses and the invoice the     │
//! │  engine prints must show the same peso figures, even if the rounding    │
//! │  helper ever changes. Writes are rare, reads are constant.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use colmado_core::{round2, CatalogEntry, NewProduct, Product, ValidationError};

use crate::error::{DbError, DbResult};

const PRODUCT_COLUMNS: &str = r#"
    id, name, description, purchase_price, price_excl_itbis,
    itbis_applies, itbis_rate, itbis_amount, final_price,
    stock, category, supplier_id, created_at, updated_at
"#;

/// A supplier's product summary: what they supply and how much of it is
/// currently on the shelf.
#[derive(Debug, Clone, Serialize)]
pub struct SupplierSummary {
    pub supplier_id: i64,
    pub products: Vec<Product>,
    /// Units on hand summed over every supplied product.
    pub total_stock: f64,
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// // Register a product
/// let product = repo.register(&new_product).await?;
///
/// // Browse the sellable catalog
/// let catalog = repo.list_sellable().await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Registers a new product.
    ///
    /// Validates the input, derives `itbis_amount` and `final_price` from
    /// the base price and effective rate, and applies the category default.
    /// Money columns are rounded to centavos at this boundary.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The stored row, id assigned by the database
    /// * `Err(DbError::Duplicate)` - A product with this name already exists
    pub async fn register(&self, input: &NewProduct) -> DbResult<Product> {
        input.validate()?;

        let name = input.name.trim();
        debug!(name = %name, "Registering product");

        if self.name_exists(name, None).await? {
            return Err(DbError::duplicate("Product", name));
        }

        let now = Utc::now();
        let rate = input.effective_rate();
        let result = sqlx::query(
            r#"
            INSERT INTO products (
                name, description, purchase_price, price_excl_itbis,
                itbis_applies, itbis_rate, itbis_amount, final_price,
                stock, category, supplier_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
            "#,
        )
        .bind(name)
        .bind(input.description.trim())
        .bind(round2(input.purchase_price))
        .bind(round2(input.price_excl_itbis))
        .bind(input.itbis_applies)
        .bind(rate.as_f64())
        .bind(round2(input.itbis_amount()))
        .bind(round2(input.final_price()))
        .bind(input.stock)
        .bind(input.category_or_default())
        .bind(input.supplier_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get_by_id(result.last_insert_rowid()).await
    }

    /// Edits an existing product's descriptive and price fields.
    ///
    /// Derived columns are recomputed from the new input. Stock is
    /// deliberately NOT written here: it moves only through [`restock`]
    /// and through checkout, so an edit can never stomp a concurrent sale.
    ///
    /// [`restock`]: ProductRepository::restock
    pub async fn update(&self, id: i64, input: &NewProduct) -> DbResult<Product> {
        input.validate()?;

        let name = input.name.trim();
        debug!(id, name = %name, "Updating product");

        if self.name_exists(name, Some(id)).await? {
            return Err(DbError::duplicate("Product", name));
        }

        let rate = input.effective_rate();
        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                description = ?3,
                purchase_price = ?4,
                price_excl_itbis = ?5,
                itbis_applies = ?6,
                itbis_rate = ?7,
                itbis_amount = ?8,
                final_price = ?9,
                category = ?10,
                supplier_id = ?11,
                updated_at = ?12
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(input.description.trim())
        .bind(round2(input.purchase_price))
        .bind(round2(input.price_excl_itbis))
        .bind(input.itbis_applies)
        .bind(rate.as_f64())
        .bind(round2(input.itbis_amount()))
        .bind(round2(input.final_price()))
        .bind(input.category_or_default())
        .bind(input.supplier_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get_by_id(id).await
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Product> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Lists every product, sorted by name.
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name");
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    /// Lists the sellable catalog: every product with stock on hand,
    /// sorted by name.
    ///
    /// The stock figures here are advisory. A cart built from this snapshot
    /// is still re-verified by the Stock Guard inside the checkout
    /// transaction.
    pub async fn list_sellable(&self) -> DbResult<Vec<CatalogEntry>> {
        let entries = sqlx::query_as::<_, CatalogEntry>(
            r#"
            SELECT id, name, price_excl_itbis, itbis_applies, itbis_rate,
                   final_price, stock
            FROM products
            WHERE stock > 0
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = entries.len(), "Loaded sellable catalog");
        Ok(entries)
    }

    /// Lists products supplied by one supplier, sorted by name.
    pub async fn list_by_supplier(&self, supplier_id: i64) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE supplier_id = ?1 ORDER BY name"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(supplier_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    /// A supplier's shelf footprint: the products they supply plus the
    /// units on hand across all of them. Feeds the reorder conversation
    /// with that supplier.
    pub async fn supplier_summary(&self, supplier_id: i64) -> DbResult<SupplierSummary> {
        let products = self.list_by_supplier(supplier_id).await?;
        let total_stock = products.iter().map(|p| p.stock).sum();
        Ok(SupplierSummary {
            supplier_id,
            products,
            total_stock,
        })
    }

    /// Distinct categories in use, sorted.
    pub async fn categories(&self) -> DbResult<Vec<String>> {
        let categories =
            sqlx::query_scalar::<_, String>("SELECT DISTINCT category FROM products ORDER BY category")
                .fetch_all(&self.pool)
                .await?;
        Ok(categories)
    }

    /// Adds received stock to a product.
    ///
    /// Delta update, not absolute: a restock entered while a sale commits
    /// must not lose either movement.
    pub async fn restock(&self, id: i64, quantity: f64) -> DbResult<Product> {
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(ValidationError::must_be_positive("quantity").into());
        }

        debug!(id, quantity, "Restocking product");

        let result = sqlx::query(
            "UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get_by_id(id).await
    }

    /// Products at or below the given stock threshold, lowest first.
    /// Feeds the reorder report.
    pub async fn low_stock(&self, threshold: f64) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE stock <= ?1 ORDER BY stock, name"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(threshold)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    /// Counts total products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Case-insensitive name collision check, excluding `except_id` so an
    /// edit can keep its own name.
    async fn name_exists(&self, name: &str, except_id: Option<i64>) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM products
            WHERE name = ?1 COLLATE NOCASE
              AND (?2 IS NULL OR id != ?2)
            "#,
        )
        .bind(name)
        .bind(except_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use colmado_core::{money_eq, ItbisRate, NewProduct, DEFAULT_CATEGORY};

    use crate::pool::{Database, DbConfig};

    fn arroz() -> NewProduct {
        NewProduct {
            name: "Arroz Selecto 5lb".to_string(),
            description: "Saco pequeño".to_string(),
            purchase_price: 180.0,
            price_excl_itbis: 100.0,
            itbis_applies: true,
            itbis_rate: ItbisRate::Standard,
            stock: 20.0,
            category: Some("Granos".to_string()),
            supplier_id: None,
        }
    }

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory())
            .await
            .expect("in-memory database")
    }

    #[tokio::test]
    async fn test_register_derives_price_columns() {
        let db = test_db().await;
        let product = db.products().register(&arroz()).await.unwrap();

        assert!(product.id > 0);
        assert!(money_eq(product.itbis_amount, 18.0));
        assert!(money_eq(product.final_price, 118.0));
        assert_eq!(product.category, "Granos");
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_name_case_insensitive() {
        let db = test_db().await;
        db.products().register(&arroz()).await.unwrap();

        let mut dup = arroz();
        dup.name = "ARROZ SELECTO 5LB".to_string();
        let err = db.products().register(&dup).await.unwrap_err();
        assert!(matches!(err, crate::error::DbError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn test_register_applies_category_default() {
        let db = test_db().await;
        let mut input = arroz();
        input.category = None;
        let product = db.products().register(&input).await.unwrap();
        assert_eq!(product.category, DEFAULT_CATEGORY);
    }

    #[tokio::test]
    async fn test_update_recomputes_derived_and_keeps_stock() {
        let db = test_db().await;
        let product = db.products().register(&arroz()).await.unwrap();

        let mut edit = arroz();
        edit.price_excl_itbis = 110.0;
        edit.stock = 999.0; // must be ignored by update
        let updated = db.products().update(product.id, &edit).await.unwrap();

        assert!(money_eq(updated.final_price, 129.8));
        assert!(money_eq(updated.stock, 20.0));
    }

    #[tokio::test]
    async fn test_list_sellable_excludes_out_of_stock() {
        let db = test_db().await;
        db.products().register(&arroz()).await.unwrap();

        let mut empty = arroz();
        empty.name = "Habichuelas Rojas 1lb".to_string();
        empty.stock = 0.0;
        db.products().register(&empty).await.unwrap();

        let catalog = db.products().list_sellable().await.unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].name, "Arroz Selecto 5lb");
    }

    #[tokio::test]
    async fn test_restock_adds_and_rejects_nonpositive() {
        let db = test_db().await;
        let product = db.products().register(&arroz()).await.unwrap();

        let after = db.products().restock(product.id, 5.0).await.unwrap();
        assert!(money_eq(after.stock, 25.0));

        assert!(db.products().restock(product.id, 0.0).await.is_err());
        assert!(db.products().restock(product.id, -3.0).await.is_err());
    }

    #[tokio::test]
    async fn test_supplier_summary_totals_stock() {
        let db = test_db().await;
        let supplier = db
            .suppliers()
            .register(&colmado_core::NewParty {
                name: "Distribuidora Corripio".to_string(),
                phone: "809-555-2001".to_string(),
                address: String::new(),
            })
            .await
            .unwrap();

        let mut a = arroz();
        a.supplier_id = Some(supplier.id);
        db.products().register(&a).await.unwrap();

        let mut b = arroz();
        b.name = "Aceite Crisol 1L".to_string();
        b.stock = 12.0;
        b.supplier_id = Some(supplier.id);
        db.products().register(&b).await.unwrap();

        // Unrelated product must not count toward the summary.
        let mut other = arroz();
        other.name = "Pan Sobao".to_string();
        db.products().register(&other).await.unwrap();

        let summary = db.products().supplier_summary(supplier.id).await.unwrap();
        assert_eq!(summary.products.len(), 2);
        assert_eq!(summary.products[0].name, "Aceite Crisol 1L");
        assert!(money_eq(summary.total_stock, 32.0));

        // A supplier with nothing on the shelf is an empty summary.
        let empty = db.products().supplier_summary(9999).await.unwrap();
        assert!(empty.products.is_empty());
        assert!(money_eq(empty.total_stock, 0.0));
    }

    #[tokio::test]
    async fn test_low_stock_report() {
        let db = test_db().await;
        let mut low = arroz();
        low.stock = 2.0;
        db.products().register(&low).await.unwrap();

        let mut high = arroz();
        high.name = "Aceite Crisol 1L".to_string();
        high.stock = 40.0;
        db.products().register(&high).await.unwrap();

        let report = db.products().low_stock(5.0).await.unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].name, "Arroz Selecto 5lb");
    }
}
