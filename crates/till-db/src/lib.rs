//! # till-db: Database Layer for Till POS
//!
//! This crate provides persistence for the Till POS system: SQLite via
//! sqlx, plus the TransactionEngine that owns every stock-affecting write.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Till POS Data Flow                               │
//! │                                                                         │
//! │  Caller (checkout / back-office, out of scope)                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     till-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌──────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │   │ TransactionEngine│   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │   │   (engine.rs)    │   │  (embedded)  │  │   │
//! │  │   │               │   │                  │   │              │  │   │
//! │  │   │ SqlitePool    │◄──│ sale / adjust /  │   │ 001_init.sql │  │   │
//! │  │   │ WAL, FKs ON   │   │ purchase writes  │   │              │  │   │
//! │  │   └───────┬───────┘   └──────────────────┘   └──────────────┘  │   │
//! │  │           │                                                     │   │
//! │  │   ┌───────▼──────────────────────────────────────────────────┐ │   │
//! │  │   │ Repositories (read side)                                 │ │   │
//! │  │   │ ProductRepo │ LedgerRepo │ SaleRepo │ PurchaseRepo │ ... │ │   │
//! │  │   └──────────────────────────────────────────────────────────┘ │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (or :memory: in tests)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`engine`] - TransactionEngine: the only stock write path
//! - [`repository`] - Read-side repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use till_db::{Database, DbConfig};
//! use till_core::{PaymentMethod, SaleLineRequest, SaleRequest};
//!
//! let db = Database::new(DbConfig::new("./till.db")).await?;
//!
//! let sale = db
//!     .engine()
//!     .create_sale(
//!         "cashier-uuid",
//!         SaleRequest::simple(
//!             vec![SaleLineRequest { product_id, quantity: 2 }],
//!             PaymentMethod::Card,
//!         ),
//!     )
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod engine;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use engine::{EngineError, TransactionEngine};
pub use error::DbError;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::ledger::LedgerRepository;
pub use repository::product::ProductRepository;
pub use repository::purchase::PurchaseRepository;
pub use repository::report::ReportRepository;
pub use repository::sale::SaleRepository;
