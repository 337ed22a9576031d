//! # Domain Types
//!
//! Items in the catalog and the receipt handed back after a purchase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::cash::{CashCounts, CashEntry};
use crate::validation::{self, ValidationResult};

// =============================================================================
// Item
// =============================================================================

/// A product slot in the machine.
///
/// `name` is the unique key and is always stored lowercase, so `"Cola"` and
/// `"cola"` are the same item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Item {
    /// Lowercase, trimmed item name.
    pub name: String,

    /// Price in whole baht.
    pub price: i64,

    /// Units left in the machine.
    pub stock: i64,
}

impl Item {
    /// Builds a validated item for the add command.
    ///
    /// ## Rules
    /// - name: non-empty after trimming, at most 100 characters
    /// - price: 1..=10000
    /// - stock: 0..=1000
    pub fn new(name: &str, price: i64, stock: i64) -> ValidationResult<Self> {
        let name = validation::validate_item_name(name)?;
        validation::validate_price(price)?;
        validation::validate_initial_stock(stock)?;

        Ok(Item { name, price, stock })
    }

    #[inline]
    pub fn is_in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Canonical lookup key for an item name.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

// =============================================================================
// Receipt
// =============================================================================

/// Result of a completed purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Receipt {
    /// Correlation id of the purchase (logs only, not persisted).
    #[ts(as = "String")]
    pub transaction_id: Uuid,

    pub item: String,

    pub price: i64,

    /// Sum of all accepted tender.
    pub total_tendered: i64,

    /// Accepted tender grouped by denomination, highest first.
    pub tendered: Vec<CashEntry>,

    /// `total_tendered - price`.
    pub change_due: i64,

    /// Change paid out, highest first. Empty when no change was due.
    pub change: Vec<CashEntry>,

    #[ts(as = "String")]
    pub completed_at: DateTime<Utc>,
}

impl Receipt {
    /// The change breakdown as a tally.
    pub fn change_counts(&self) -> CashCounts {
        CashCounts::from(self.change.as_slice())
    }

    /// The tender breakdown as a tally.
    pub fn tender_counts(&self) -> CashCounts {
        CashCounts::from(self.tendered.as_slice())
    }
}
