//! # colmado-db: Storage and Transaction Layer for Colmado POS
//!
//! This crate provides database access for the colmado point-of-sale
//! system. It uses SQLite for local storage with sqlx for async operations,
//! and hosts the Sale Transaction Engine that turns carts into committed
//! sales.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Colmado POS Data Flow                             │
//! │                                                                         │
//! │  Presentation layer (catalog browse, cart, cash drawer)                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    colmado-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────────┐   ┌────────────────┐   ┌────────────────┐  │   │
//! │  │   │   Database   │   │  Repositories  │   │ CheckoutEngine │  │   │
//! │  │   │  (pool.rs)   │   │ product/party/ │   │  + StockGuard  │  │   │
//! │  │   │              │◄──│     sale       │◄──│  (one txn per  │  │   │
//! │  │   │ SqlitePool   │   │                │   │     sale)      │  │   │
//! │  │   └──────────────┘   └────────────────┘   └────────────────┘  │   │
//! │  │          ▲                                                     │   │
//! │  │          └── migrations (embedded) ── SalesHistory (reads)     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL mode)                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Storage and checkout error types
//! - [`repository`] - Repository implementations (product, party, sale)
//! - [`stock`] - The Stock Guard (authoritative stock check)
//! - [`checkout`] - The Sale Transaction Engine
//! - [`history`] - Read-only sales history queries
//!
//! ## Usage
//!
//! ```rust,ignore
//! use colmado_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/colmado.db")).await?;
//!
//! let catalog = db.products().list_sellable().await?;
//! let record = db.checkout().process_sale(&request).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod history;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod stock;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::CheckoutEngine;
pub use error::{CheckoutError, CheckoutResult, DbError, DbResult};
pub use history::{CustomerHistory, HistoryFilter, SaleSummary, SalesHistory};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::party::{CustomerRepository, SupplierRepository};
pub use repository::product::{ProductRepository, SupplierSummary};
pub use repository::sale::SaleRepository;
