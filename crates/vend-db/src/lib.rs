//! # vend-db: Database Layer for the Vending Machine
//!
//! Ledger storage in SQLite, with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Vend Data Flow                                   │
//! │                                                                         │
//! │  vend-engine (VendingMachine, PurchaseProcessor)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     vend-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │    │               │    │  + seeding   │   │   │
//! │  │   │               │    │ ItemRepo      │    │              │   │   │
//! │  │   │ SqlitePool    │◄───│ ChangeRepo    │    │ 001_init.sql │   │   │
//! │  │   │ handle        │    │ CollectionRepo│    │ cash rows    │   │   │
//! │  │   │               │    │ PurchaseRepo  │    │              │   │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘   │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │                     vending_machine.db                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded migrations and cash table seeding
//! - [`schema`] - Table names and row types
//! - [`error`] - Database error types
//! - [`repository`] - Ledger repositories and the purchase commit
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vend_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("vending_machine.db")).await?;
//!
//! db.change().refill(Denomination::Ten, 20).await?;
//! let items = db.items().list_available().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod schema;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::cash::{ChangeReserveRepository, CollectionBoxRepository};
pub use repository::item::ItemRepository;
pub use repository::purchase::{PurchaseCommit, PurchaseRepository};
