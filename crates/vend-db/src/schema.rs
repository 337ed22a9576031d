//! Table names and row types.
//!
//! Schema is defined in `migrations/001_initial_schema.sql`.

use tracing::warn;
use vend_core::cash::{CHANGE_DENOMINATIONS, COLLECTION_DENOMINATIONS};
use vend_core::{CashCounts, Denomination, Item};

pub const STOCK_TABLE: &str = "stock_67011755";
pub const CHANGE_BOX_TABLE: &str = "change_box_67011755";
pub const COLLECTION_BOX_TABLE: &str = "collection_box_67011755";

/// The two cash ledgers. They share a row shape (`THB`, `Count`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CashBox {
    ChangeReserve,
    CollectionBox,
}

impl CashBox {
    pub fn table(self) -> &'static str {
        match self {
            CashBox::ChangeReserve => CHANGE_BOX_TABLE,
            CashBox::CollectionBox => COLLECTION_BOX_TABLE,
        }
    }

    /// Denominations seeded into the table on first use.
    pub fn denominations(self) -> &'static [Denomination] {
        match self {
            CashBox::ChangeReserve => &CHANGE_DENOMINATIONS,
            CashBox::CollectionBox => &COLLECTION_DENOMINATIONS,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            CashBox::ChangeReserve => "Change reserve",
            CashBox::CollectionBox => "Collection box",
        }
    }
}

/// Row type for the stock table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ItemRow {
    pub item_name: String,
    pub price: i64,
    pub stock: i64,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Item {
            name: row.item_name,
            price: row.price,
            stock: row.stock,
        }
    }
}

/// Row type for both cash tables.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CashRow {
    #[sqlx(rename = "THB")]
    pub label: String,
    #[sqlx(rename = "Count")]
    pub count: i64,
}

/// Folds cash rows into a tally. Rows with a label that is not a known
/// denomination are skipped with a warning.
pub fn fold_cash_rows(table: &str, rows: Vec<CashRow>) -> CashCounts {
    let mut counts = CashCounts::new();
    for row in rows {
        match Denomination::from_label(&row.label) {
            Some(denomination) => counts.add(denomination, row.count),
            None => warn!(table = table, label = %row.label, "Skipping unknown denomination"),
        }
    }
    counts
}
