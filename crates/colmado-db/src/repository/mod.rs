//! # Repository Module
//!
//! Database repository implementations for the colmado backend.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Caller (UI shell, seed tool, tests)                                   │
//! │       │                                                                 │
//! │       │  db.products().list_sellable()                                 │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── register(&self, new_product)                                      │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── list_sellable(&self)                                              │
//! │  └── restock(&self, id, qty)                                           │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                        │
//! │  • Easy to test against an in-memory database                          │
//! │  • SQL is isolated in one place                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Product registration, catalog, restock
//! - [`party::CustomerRepository`] / [`party::SupplierRepository`] - Registries
//! - [`sale::SaleRepository`] - Sale header/line persistence and retrieval

pub mod party;
pub mod product;
pub mod sale;
