//! # Customer and Supplier Repositories
//!
//! The two registries share one shape (name, phone, address) and one
//! duplicate rule, but live in separate tables and separate repository
//! types so a supplier id can never be handed to a sale.
//!
//! ## Duplicate Rule
//! The same person may appear twice with different phones (home, shop), so
//! identity is the pair (name, phone), with the name compared
//! case-insensitively. One field alone is not enough: "Juan Pérez" is a
//! common name, and a shared shop phone serves several customers.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use colmado_core::validation::{validate_name, validate_phone};
use colmado_core::{Customer, NewParty, Supplier};

use crate::error::{DbError, DbResult};

/// Repository for the customer registry.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Registers a customer.
    ///
    /// ## Returns
    /// * `Ok(Customer)` - The stored row, id assigned by the database
    /// * `Err(DbError::Duplicate)` - Same name (case-insensitive) and phone
    pub async fn register(&self, input: &NewParty) -> DbResult<Customer> {
        let (name, phone, address) = validate_party(input)?;
        debug!(name = %name, "Registering customer");

        if party_exists(&self.pool, "customers", &name, &phone).await? {
            return Err(DbError::duplicate("Customer", format!("{name} / {phone}")));
        }

        let result = sqlx::query(
            "INSERT INTO customers (name, phone, address, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&name)
        .bind(&phone)
        .bind(&address)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.get_by_id(result.last_insert_rowid()).await
    }

    /// Gets a customer by id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Customer> {
        sqlx::query_as::<_, Customer>(
            "SELECT id, name, phone, address, created_at FROM customers WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Lists every customer, sorted by name.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(
            "SELECT id, name, phone, address, created_at FROM customers ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(customers)
    }

    /// Updates a customer's contact details.
    pub async fn update(&self, id: i64, input: &NewParty) -> DbResult<Customer> {
        let (name, phone, address) = validate_party(input)?;
        debug!(id, name = %name, "Updating customer");

        let result = sqlx::query(
            "UPDATE customers SET name = ?2, phone = ?3, address = ?4 WHERE id = ?1",
        )
        .bind(id)
        .bind(&name)
        .bind(&phone)
        .bind(&address)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }
        self.get_by_id(id).await
    }
}

/// Repository for the supplier registry.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    /// Creates a new SupplierRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    /// Registers a supplier. Same duplicate rule as customers.
    pub async fn register(&self, input: &NewParty) -> DbResult<Supplier> {
        let (name, phone, address) = validate_party(input)?;
        debug!(name = %name, "Registering supplier");

        if party_exists(&self.pool, "suppliers", &name, &phone).await? {
            return Err(DbError::duplicate("Supplier", format!("{name} / {phone}")));
        }

        let result = sqlx::query(
            "INSERT INTO suppliers (name, phone, address, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&name)
        .bind(&phone)
        .bind(&address)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.get_by_id(result.last_insert_rowid()).await
    }

    /// Gets a supplier by id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Supplier> {
        sqlx::query_as::<_, Supplier>(
            "SELECT id, name, phone, address, created_at FROM suppliers WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Supplier", id))
    }

    /// Lists every supplier, sorted by name.
    pub async fn list(&self) -> DbResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(
            "SELECT id, name, phone, address, created_at FROM suppliers ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(suppliers)
    }

    /// Updates a supplier's contact details.
    pub async fn update(&self, id: i64, input: &NewParty) -> DbResult<Supplier> {
        let (name, phone, address) = validate_party(input)?;
        debug!(id, name = %name, "Updating supplier");

        let result = sqlx::query(
            "UPDATE suppliers SET name = ?2, phone = ?3, address = ?4 WHERE id = ?1",
        )
        .bind(id)
        .bind(&name)
        .bind(&phone)
        .bind(&address)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }
        self.get_by_id(id).await
    }
}

/// Validates and normalizes registration input; returns trimmed fields.
fn validate_party(input: &NewParty) -> DbResult<(String, String, String)> {
    validate_name(&input.name)?;
    validate_phone(&input.phone)?;
    Ok((
        input.name.trim().to_string(),
        input.phone.trim().to_string(),
        input.address.trim().to_string(),
    ))
}

/// Shared (name, phone) collision check. `table` is one of the two fixed
/// registry tables, never caller input.
async fn party_exists(pool: &SqlitePool, table: &str, name: &str, phone: &str) -> DbResult<bool> {
    let sql = format!(
        "SELECT COUNT(*) FROM {table} WHERE name = ?1 COLLATE NOCASE AND phone = ?2"
    );
    let count: i64 = sqlx::query_scalar(&sql)
        .bind(name)
        .bind(phone)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use colmado_core::NewParty;

    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};

    fn dona_maria() -> NewParty {
        NewParty {
            name: "Doña María".to_string(),
            phone: "809-555-1234".to_string(),
            address: "Calle Duarte #12".to_string(),
        }
    }

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory())
            .await
            .expect("in-memory database")
    }

    #[tokio::test]
    async fn test_register_customer_and_list() {
        let db = test_db().await;
        let customer = db.customers().register(&dona_maria()).await.unwrap();
        assert!(customer.id > 0);
        assert_eq!(customer.name, "Doña María");

        let all = db.customers().list().await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_requires_both_name_and_phone() {
        let db = test_db().await;
        db.customers().register(&dona_maria()).await.unwrap();

        // Exact pair again: rejected.
        let err = db.customers().register(&dona_maria()).await.unwrap_err();
        assert!(matches!(err, DbError::Duplicate { .. }));

        // Same name, different phone: allowed.
        let mut other_phone = dona_maria();
        other_phone.phone = "829-555-9999".to_string();
        assert!(db.customers().register(&other_phone).await.is_ok());

        // Same phone, different name: allowed.
        let mut other_name = dona_maria();
        other_name.name = "Ramón Bodega".to_string();
        assert!(db.customers().register(&other_name).await.is_ok());
    }

    #[tokio::test]
    async fn test_register_rejects_missing_fields() {
        let db = test_db().await;

        let mut no_name = dona_maria();
        no_name.name = "   ".to_string();
        assert!(db.customers().register(&no_name).await.is_err());

        let mut no_phone = dona_maria();
        no_phone.phone = String::new();
        assert!(db.customers().register(&no_phone).await.is_err());
    }

    #[tokio::test]
    async fn test_supplier_registry_is_separate() {
        let db = test_db().await;
        db.suppliers().register(&dona_maria()).await.unwrap();

        // Same pair in customers is fine; the registries do not overlap.
        assert!(db.customers().register(&dona_maria()).await.is_ok());
        assert_eq!(db.suppliers().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_supplier_update() {
        let db = test_db().await;
        let supplier = db.suppliers().register(&dona_maria()).await.unwrap();

        let mut edit = dona_maria();
        edit.address = "Av. Independencia #45".to_string();
        let updated = db.suppliers().update(supplier.id, &edit).await.unwrap();
        assert_eq!(updated.address, "Av. Independencia #45");

        let err = db.suppliers().update(9999, &edit).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
