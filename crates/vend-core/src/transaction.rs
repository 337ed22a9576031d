//! # Purchase State Machine
//!
//! The pure half of the transaction processor. It owns the state, the tender
//! tally and the change computation; the async driver in `vend-engine` feeds
//! it caller input and ledger snapshots and performs the commit.
//!
//! ## States
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Idle ──start──► AwaitingTender ──total ≥ price──► ComputingChange     │
//! │    │                 │    ▲                              │              │
//! │    │ stock ≤ 0       │    │ invalid value                │ exact change │
//! │    │                 │    └── (rejected, re-prompt)      ▼              │
//! │    │                 │ cancel                        Committing         │
//! │    ▼                 ▼                                   │              │
//! │  Aborted ◄───────────┴──────── insufficient change ──────┤              │
//! │    ▲                                                     ▼              │
//! │    └────────────────── store failure ───────────────  Completed         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here touches a ledger. A transaction that ends in `Aborted` never
//! produced a commit request, so the ledgers stay exactly as they were.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::cash::{CashCounts, Denomination};
use crate::change::make_change;
use crate::error::{CoreError, CoreResult};
use crate::types::{Item, Receipt};

// =============================================================================
// State
// =============================================================================

/// Where a purchase currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TransactionState {
    Idle,
    AwaitingTender,
    ComputingChange,
    Committing,
    Completed,
    Aborted,
}

impl TransactionState {
    /// `Completed` and `Aborted` accept no further input.
    pub fn is_terminal(self) -> bool {
        matches!(self, TransactionState::Completed | TransactionState::Aborted)
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransactionState::Idle => "idle",
            TransactionState::AwaitingTender => "awaiting tender",
            TransactionState::ComputingChange => "computing change",
            TransactionState::Committing => "committing",
            TransactionState::Completed => "completed",
            TransactionState::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

/// What happened to one tendered value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenderOutcome {
    /// Not an accepted denomination; not counted.
    Rejected { value: i64 },

    /// Counted, more tender is needed.
    Accepted {
        denomination: Denomination,
        total: i64,
        remaining: i64,
    },

    /// Counted and the price is covered; the machine moved to
    /// `ComputingChange`.
    Covered {
        denomination: Denomination,
        total: i64,
    },
}

// =============================================================================
// Transaction
// =============================================================================

/// One purchase in flight. Ephemeral: dropped on completion or abort.
#[derive(Debug, Clone)]
pub struct Transaction {
    id: Uuid,
    item: String,
    price: i64,
    stock: i64,
    state: TransactionState,
    tendered: Vec<Denomination>,
    total: i64,
    change_due: i64,
    change: CashCounts,
}

impl Transaction {
    /// Creates an idle transaction for `item`, capturing its price and the
    /// stock seen at selection time.
    pub fn new(item: &Item) -> Self {
        Transaction {
            id: Uuid::new_v4(),
            item: item.name.clone(),
            price: item.price,
            stock: item.stock,
            state: TransactionState::Idle,
            tendered: Vec::new(),
            total: 0,
            change_due: 0,
            change: CashCounts::new(),
        }
    }

    /// `Idle → AwaitingTender`, or `Aborted` with `OutOfStock` when the item
    /// has nothing left.
    pub fn start(&mut self) -> CoreResult<()> {
        self.expect_state(TransactionState::Idle, "start")?;

        if self.stock <= 0 {
            self.state = TransactionState::Aborted;
            return Err(CoreError::OutOfStock(self.item.clone()));
        }

        self.state = TransactionState::AwaitingTender;
        Ok(())
    }

    /// Feeds one tendered value into the tender loop.
    ///
    /// ## Returns
    /// * `Rejected` - value outside `{1,5,10,20,100}`, total unchanged
    /// * `Accepted` - counted, `remaining` still owed
    /// * `Covered` - counted and `total >= price`
    pub fn insert(&mut self, value: i64) -> CoreResult<TenderOutcome> {
        self.expect_state(TransactionState::AwaitingTender, "accept tender")?;

        let Some(denomination) = Denomination::from_value(value) else {
            return Ok(TenderOutcome::Rejected { value });
        };

        self.tendered.push(denomination);
        self.total += denomination.value();

        if self.total >= self.price {
            self.state = TransactionState::ComputingChange;
            return Ok(TenderOutcome::Covered {
                denomination,
                total: self.total,
            });
        }

        Ok(TenderOutcome::Accepted {
            denomination,
            total: self.total,
            remaining: self.remaining(),
        })
    }

    /// Caller-initiated cancel. Allowed from any non-terminal state before
    /// the commit starts.
    pub fn cancel(&mut self) -> CoreResult<()> {
        match self.state {
            TransactionState::Idle
            | TransactionState::AwaitingTender
            | TransactionState::ComputingChange => {
                self.state = TransactionState::Aborted;
                Ok(())
            }
            state => Err(invalid(state, "cancel")),
        }
    }

    /// `ComputingChange → Committing` when exact change can be formed from
    /// `reserve`; otherwise `Aborted` with `InsufficientChange`.
    pub fn compute_change(&mut self, reserve: &CashCounts) -> CoreResult<&CashCounts> {
        self.expect_state(TransactionState::ComputingChange, "compute change")?;

        self.change_due = self.total - self.price;

        match make_change(self.change_due, reserve) {
            Ok(change) => {
                self.change = change;
                self.state = TransactionState::Committing;
                Ok(&self.change)
            }
            Err(err) => {
                self.state = TransactionState::Aborted;
                Err(err)
            }
        }
    }

    /// `Committing → Completed` once the store confirmed the commit.
    pub fn complete(&mut self, completed_at: DateTime<Utc>) -> CoreResult<Receipt> {
        self.expect_state(TransactionState::Committing, "complete")?;
        self.state = TransactionState::Completed;

        Ok(Receipt {
            transaction_id: self.id,
            item: self.item.clone(),
            price: self.price,
            total_tendered: self.total,
            tendered: self.tender_breakdown().entries(),
            change_due: self.change_due,
            change: self.change.entries(),
            completed_at,
        })
    }

    /// Marks the purchase aborted after a failed commit. Terminal states are
    /// left alone.
    pub fn abort(&mut self) {
        if !self.state.is_terminal() {
            self.state = TransactionState::Aborted;
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn item(&self) -> &str {
        &self.item
    }

    pub fn price(&self) -> i64 {
        self.price
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn total(&self) -> i64 {
        self.total
    }

    /// Amount still owed, never negative.
    pub fn remaining(&self) -> i64 {
        (self.price - self.total).max(0)
    }

    /// Accepted tender in insertion order.
    pub fn tendered(&self) -> &[Denomination] {
        &self.tendered
    }

    /// Accepted tender grouped by denomination.
    pub fn tender_breakdown(&self) -> CashCounts {
        self.tendered.iter().map(|d| (*d, 1)).collect()
    }

    pub fn change_due(&self) -> i64 {
        self.change_due
    }

    /// Change computed for this purchase (empty until `Committing`).
    pub fn change(&self) -> &CashCounts {
        &self.change
    }

    fn expect_state(&self, expected: TransactionState, action: &str) -> CoreResult<()> {
        if self.state != expected {
            return Err(invalid(self.state, action));
        }
        Ok(())
    }
}

fn invalid(state: TransactionState, action: &str) -> CoreError {
    CoreError::InvalidTransition {
        state: state.to_string(),
        action: action.to_string(),
    }
}
