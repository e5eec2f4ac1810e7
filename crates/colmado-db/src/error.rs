//! # Database Error Types
//!
//! Error types for storage operations and for checkout.
//!
//! ## Error Flow
//! ```text
//! ┌────────────────────────────────────────────────────────────────────────┐
//! │                       Error Propagation                                │
//! │                                                                        │
//! │  SQLite error (sqlx::Error)                                            │
//! │       │                                                                │
//! │       ▼                                                                │
//! │  DbError (this module) ← adds context and categorization               │
//! │       │                                                                │
//! │       ▼                                                                │
//! │  CheckoutError ← the engine's tagged result type                       │
//! │       │                                                                │
//! │       ▼                                                                │
//! │  Presentation renders a precise message (which product, how short)     │
//! └────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Persistence details (lock timeout, constraint text) stay in `DbError`;
//! the caller of `process_sale` sees them collapsed into
//! `CheckoutError::Storage` - a generic "transaction failed", logged here
//! for the operator, never partially applied.

use thiserror::Error;

use colmado_core::ValidationError;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in the database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// An entity with the same identity already exists
    /// (e.g. customer with the same name and phone).
    #[error("duplicate {entity}: '{detail}' already exists")]
    Duplicate { entity: String, detail: String },

    /// Foreign key constraint violation.
    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Database connection failed (missing file, permissions, disk full).
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use) or lock wait timed out.
    #[error("database busy: {0}")]
    Busy(String),

    /// Input rejected before touching the database.
    #[error("invalid input: {0}")]
    Invalid(#[from] ValidationError),

    /// Internal database error.
    #[error("internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a `NotFound` error for a given entity type and id.
    pub fn not_found(entity: impl Into<String>, id: impl std::fmt::Display) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Creates a `Duplicate` error.
    pub fn duplicate(entity: impl Into<String>, detail: impl Into<String>) -> Self {
        DbError::Duplicate {
            entity: entity.into(),
            detail: detail.into(),
        }
    }
}

/// Maps sqlx errors onto the [`DbError`] taxonomy.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message().to_string();
                // SQLite constraint messages:
                //   "UNIQUE constraint failed: <table>.<column>"
                //   "FOREIGN KEY constraint failed"
                //   "database is locked" (SQLITE_BUSY past the busy timeout)
                if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation(msg)
                } else if msg.contains("database is locked") {
                    DbError::Busy(msg)
                } else {
                    DbError::QueryFailed(msg)
                }
            }

            sqlx::Error::PoolTimedOut => DbError::Busy("connection pool exhausted".to_string()),

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for storage operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Checkout Error
// =============================================================================

/// The tagged failure type of `process_sale`.
///
/// Each variant carries enough detail for the presentation layer to render
/// a precise message without string matching.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Rejected before any transaction was opened.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A cart line references a product that does not exist.
    #[error("product {product_id} not found")]
    ProductNotFound { product_id: i64 },

    /// Stock cannot cover the requested quantity. Rolls back the whole
    /// checkout; nothing is partially applied.
    #[error("insufficient stock for '{name}': available {available}, requested {requested}")]
    InsufficientStock {
        product_id: i64,
        name: String,
        available: f64,
        requested: f64,
    },

    /// The store failed mid-transaction (connection loss, lock timeout,
    /// constraint violation). Fully rolled back.
    #[error("transaction failed")]
    Storage(#[source] DbError),
}

impl From<DbError> for CheckoutError {
    fn from(err: DbError) -> Self {
        CheckoutError::Storage(err)
    }
}

impl From<sqlx::Error> for CheckoutError {
    fn from(err: sqlx::Error) -> Self {
        CheckoutError::Storage(DbError::from(err))
    }
}

/// Result type for checkout.
pub type CheckoutResult<T> = Result<T, CheckoutError>;
