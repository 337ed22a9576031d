//! # vend-core: Pure Business Logic for the Vending Machine
//!
//! This crate contains the rules of the machine as pure functions and types
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Vend Architecture                                │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 UI layer (external, e.g. vend-cli)              │   │
//! │  │     Item list ──► Select ──► Insert cash ──► Receipt            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ tender channel                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        vend-engine: PurchaseProcessor + VendingMachine          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ vend-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌─────────────┐ ┌──────────────┐   │   │
//! │  │   │   cash   │ │  change  │ │ transaction │ │  condition   │   │   │
//! │  │   │  Denom   │ │  greedy  │ │ state mach. │ │ health gate  │   │   │
//! │  │   └──────────┘ └──────────┘ └─────────────┘ └──────────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CHANNELS • PURE FUNCTIONS          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    vend-db (Database Layer)                     │   │
//! │  │         stock / change_box / collection_box ledgers             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Item and Receipt
//! - [`cash`] - Denominations and denomination → count tallies
//! - [`change`] - Greedy change-making against a finite reserve
//! - [`transaction`] - Purchase state machine
//! - [`condition`] - Operating condition monitor
//! - [`validation`] - Admin input checks
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use vend_core::cash::{CashCounts, Denomination};
//! use vend_core::transaction::Transaction;
//! use vend_core::Item;
//!
//! let item = Item::new("Cola", 37, 3).unwrap();
//! let mut txn = Transaction::new(&item);
//! txn.start().unwrap();
//! txn.insert(20).unwrap();
//! txn.insert(20).unwrap();
//!
//! let reserve: CashCounts = [(Denomination::One, 5)].into_iter().collect();
//! let change = txn.compute_change(&reserve).unwrap();
//! assert_eq!(change.get(Denomination::One), 3);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cash;
pub mod change;
pub mod condition;
pub mod error;
pub mod transaction;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cash::{CashCounts, CashEntry, Denomination};
pub use condition::{LedgerSnapshot, OperatingStatus};
pub use error::{CoreError, CoreResult, ValidationError};
pub use transaction::{TenderOutcome, Transaction, TransactionState};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// A collection box slot at or above this count marks the box as full.
pub const COLLECTION_BOX_CAPACITY: i64 = 100;

/// Longest accepted item name, in characters.
pub const MAX_NAME_LEN: usize = 100;

/// Highest price an item may be listed at.
pub const MAX_PRICE: i64 = 10_000;

/// Highest stock a newly added item may start with.
pub const MAX_INITIAL_STOCK: i64 = 1_000;

/// Largest single restock.
pub const MAX_RESTOCK_AMOUNT: i64 = 1_000;

/// Largest single change refill per denomination.
pub const MAX_REFILL_AMOUNT: i64 = 1_000;
