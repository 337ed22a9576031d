//! # Operating Condition Monitor
//!
//! Health gate deciding whether the machine may enter purchase mode.
//!
//! ## Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  low_stock            total_items > 0 AND out_of_stock >= total / 2     │
//! │  insufficient_change  any change-reserve count == 0                     │
//! │  collection_box_full  any collection-box count >= 100                   │
//! │                                                                         │
//! │  operational = NOT (low_stock OR insufficient_change OR box_full)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The evaluation is pure and is recomputed from fresh ledger counts every
//! time it is asked for. Admin operations are never gated.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cash::CashCounts;
use crate::types::Item;
use crate::COLLECTION_BOX_CAPACITY;

/// Ledger counts the monitor needs. Mirrors the store's filtered reads
/// (`stock = 0`, `Count = 0`, `Count >= N`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub total_items: i64,
    pub out_of_stock_items: i64,
    pub empty_change_slots: i64,
    pub full_collection_slots: i64,
}

impl LedgerSnapshot {
    /// Builds a snapshot from full ledger reads.
    pub fn from_ledgers(items: &[Item], reserve: &CashCounts, collection: &CashCounts) -> Self {
        LedgerSnapshot {
            total_items: items.len() as i64,
            out_of_stock_items: items.iter().filter(|i| i.stock == 0).count() as i64,
            empty_change_slots: reserve.iter().filter(|(_, c)| *c == 0).count() as i64,
            full_collection_slots: collection
                .iter()
                .filter(|(_, c)| *c >= COLLECTION_BOX_CAPACITY)
                .count() as i64,
        }
    }
}

/// Outcome of the health gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OperatingStatus {
    pub low_stock: bool,
    pub insufficient_change: bool,
    pub collection_box_full: bool,
    pub operational: bool,
}

impl OperatingStatus {
    /// Human-readable list of the failing conditions.
    pub fn reasons(&self) -> Vec<&'static str> {
        let mut reasons = Vec::new();
        if self.low_stock {
            reasons.push("low stock");
        }
        if self.insufficient_change {
            reasons.push("insufficient change");
        }
        if self.collection_box_full {
            reasons.push("collection box full");
        }
        reasons
    }
}

/// Evaluates the gate.
///
/// ## Example
/// ```rust
/// use vend_core::condition::{evaluate, LedgerSnapshot};
///
/// let status = evaluate(&LedgerSnapshot {
///     total_items: 4,
///     out_of_stock_items: 2,
///     ..Default::default()
/// });
/// assert!(status.low_stock);
/// assert!(!status.operational);
/// ```
pub fn evaluate(snapshot: &LedgerSnapshot) -> OperatingStatus {
    let low_stock = snapshot.total_items > 0
        && snapshot.out_of_stock_items >= snapshot.total_items / 2;
    let insufficient_change = snapshot.empty_change_slots > 0;
    let collection_box_full = snapshot.full_collection_slots > 0;

    OperatingStatus {
        low_stock,
        insufficient_change,
        collection_box_full,
        operational: !(low_stock || insufficient_change || collection_box_full),
    }
}
