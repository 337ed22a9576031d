//! # vend-engine: Transaction Engine for the Vending Machine
//!
//! Orchestrates purchases over the three ledgers and exposes the machine
//! to an external UI layer.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Engine Architecture                              │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                 VendingMachine (service facade)                  │  │
//! │  │  queries • admin commands • enter_purchase_mode() gate           │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │ PurchaseSession                         │
//! │                               ▼                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                 PurchaseProcessor                                │  │
//! │  │                                                                  │  │
//! │  │  TenderPort ◄── mpsc ──► TenderHandle (caller)                   │  │
//! │  │  Transaction (vend-core state machine)                           │  │
//! │  │  Database::purchases().commit()  (one SQLite transaction)        │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  Single active purchase at a time. No internal locking and no cached   │
//! │  ledger copies; the store is the only source of truth.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//! - [`machine`] - `VendingMachine` and `PurchaseSession`
//! - [`processor`] - Purchase driver and tender channel protocol
//! - [`error`] - `VendError` with machine-readable `ErrorCode`
//!
//! ## Example
//! ```rust,ignore
//! let vm = VendingMachine::new(Database::new(DbConfig::new("vending_machine.db")).await?);
//! let mut session = vm.enter_purchase_mode().await?;
//!
//! let (mut handle, port) = tender_channel(8);
//! let purchase = session.purchase("cola", port);
//! // feed handle.insert(20) ... on every TenderRequired event
//! ```

pub mod error;
pub mod machine;
pub mod processor;

pub use error::{ErrorCode, ErrorReport, VendError, VendResult};
pub use machine::{PurchaseSession, VendingMachine};
pub use processor::{
    tender_channel, PurchaseEvent, PurchaseOutcome, PurchaseProcessor, TenderHandle, TenderInput,
    TenderPort,
};
