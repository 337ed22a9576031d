//! # Vending Machine Service
//!
//! The surface a UI layer talks to: queries, admin commands and the
//! purchase-mode gate.
//!
//! ## Modes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  VendingMachine                                                         │
//! │   │                                                                     │
//! │   ├── queries      items / available_items / change_reserve /           │
//! │   │                collection_box / operating_status                    │
//! │   │                                                                     │
//! │   ├── admin        add_item / delete_item / restock_item /              │
//! │   │                refill_change / refill_all / collect_money           │
//! │   │                (never gated)                                        │
//! │   │                                                                     │
//! │   └── enter_purchase_mode()                                             │
//! │            │                                                            │
//! │            ├── operational ──► PurchaseSession ──► purchase(name, port) │
//! │            │                                                            │
//! │            └── not ──────────► NotOperational { reasons }               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::{info, warn};

use vend_core::condition::{evaluate, LedgerSnapshot, OperatingStatus};
use vend_core::{CashCounts, CoreError, Denomination, Item, COLLECTION_BOX_CAPACITY};
use vend_db::Database;

use crate::error::VendResult;
use crate::processor::{PurchaseOutcome, PurchaseProcessor, TenderPort};

/// Vending machine facade over the store handle.
#[derive(Debug, Clone)]
pub struct VendingMachine {
    db: Database,
    processor: PurchaseProcessor,
}

impl VendingMachine {
    pub fn new(db: Database) -> Self {
        let processor = PurchaseProcessor::new(db.clone());
        VendingMachine { db, processor }
    }

    /// The underlying store handle.
    pub fn database(&self) -> &Database {
        &self.db
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn items(&self) -> VendResult<Vec<Item>> {
        Ok(self.db.items().list_all().await?)
    }

    /// Items with stock left.
    pub async fn available_items(&self) -> VendResult<Vec<Item>> {
        Ok(self.db.items().list_available().await?)
    }

    pub async fn item(&self, name: &str) -> VendResult<Item> {
        Ok(self.db.items().require(name).await?)
    }

    pub async fn change_reserve(&self) -> VendResult<CashCounts> {
        Ok(self.db.change().counts().await?)
    }

    pub async fn collection_box(&self) -> VendResult<CashCounts> {
        Ok(self.db.collection().counts().await?)
    }

    /// Evaluates the operating gate from fresh filtered counts.
    pub async fn operating_status(&self) -> VendResult<OperatingStatus> {
        let snapshot = LedgerSnapshot {
            total_items: self.db.items().count().await?,
            out_of_stock_items: self.db.items().count_out_of_stock().await?,
            empty_change_slots: self.db.change().count_empty().await?,
            full_collection_slots: self
                .db
                .collection()
                .count_at_least(COLLECTION_BOX_CAPACITY)
                .await?,
        };

        Ok(evaluate(&snapshot))
    }

    // =========================================================================
    // Admin Commands
    // =========================================================================

    /// Adds an item. The name is stored lowercase.
    pub async fn add_item(&self, name: &str, price: i64, stock: i64) -> VendResult<Item> {
        let item = Item::new(name, price, stock)?;
        self.db.items().insert(&item).await?;
        Ok(item)
    }

    pub async fn delete_item(&self, name: &str) -> VendResult<()> {
        Ok(self.db.items().delete(name).await?)
    }

    /// Adds `amount` (0..=1000) to an item's stock.
    pub async fn restock_item(&self, name: &str, amount: i64) -> VendResult<Item> {
        Ok(self.db.items().restock(name, amount).await?)
    }

    /// Adds `amount` (0..=1000) pieces of one change denomination. Returns
    /// the new count.
    pub async fn refill_change(&self, denomination: Denomination, amount: i64) -> VendResult<i64> {
        Ok(self.db.change().refill(denomination, amount).await?)
    }

    /// Refills several change denominations at once. Returns the reserve
    /// afterwards.
    pub async fn refill_all(&self, amounts: &CashCounts) -> VendResult<CashCounts> {
        Ok(self.db.change().refill_all(amounts).await?)
    }

    /// Empties the collection box and returns what was in it.
    pub async fn collect_money(&self) -> VendResult<CashCounts> {
        Ok(self.db.collection().collect().await?)
    }

    // =========================================================================
    // Purchase Mode
    // =========================================================================

    /// Enters purchase mode if the operating gate allows it.
    ///
    /// ## Errors
    /// * `NotOperational` naming every failing condition
    pub async fn enter_purchase_mode(&self) -> VendResult<PurchaseSession<'_>> {
        let status = self.operating_status().await?;

        if !status.operational {
            let reasons = status.reasons().join(", ");
            warn!(reasons = %reasons, "Purchase mode refused");
            return Err(CoreError::NotOperational { reasons }.into());
        }

        info!("Purchase mode entered");
        Ok(PurchaseSession {
            machine: self,
            status,
        })
    }
}

/// Proof that the gate passed. Purchases are only reachable through a
/// session, and `purchase` takes `&mut self`, so one session runs one
/// purchase at a time.
#[derive(Debug)]
pub struct PurchaseSession<'a> {
    machine: &'a VendingMachine,
    status: OperatingStatus,
}

impl<'a> PurchaseSession<'a> {
    /// Gate result at the moment the session was opened.
    pub fn status(&self) -> OperatingStatus {
        self.status
    }

    /// Items a customer can pick from.
    pub async fn menu(&self) -> VendResult<Vec<Item>> {
        self.machine.available_items().await
    }

    /// Runs one purchase, reading tender from `port`.
    pub async fn purchase(&mut self, name: &str, port: TenderPort) -> VendResult<PurchaseOutcome> {
        self.machine.processor.execute(name, port).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use vend_db::DbConfig;

    async fn machine() -> VendingMachine {
        VendingMachine::new(Database::new(DbConfig::in_memory()).await.unwrap())
    }

    #[tokio::test]
    async fn test_fresh_machine_is_not_operational() {
        let vm = machine().await;

        let status = vm.operating_status().await.unwrap();
        assert!(!status.low_stock);
        assert!(status.insufficient_change);
        assert!(!status.operational);

        let err = vm.enter_purchase_mode().await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotOperational);
        assert!(err.to_string().contains("insufficient change"));
    }

    #[tokio::test]
    async fn test_admin_commands_are_not_gated() {
        let vm = machine().await;

        let item = vm.add_item("Cola", 25, 0).await.unwrap();
        assert_eq!(item.name, "cola");

        assert_eq!(vm.restock_item("COLA", 4).await.unwrap().stock, 4);
        assert_eq!(vm.refill_change(Denomination::Five, 9).await.unwrap(), 9);
        assert_eq!(vm.collect_money().await.unwrap().total_value(), 0);

        vm.delete_item("cola").await.unwrap();
        assert!(vm.items().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_item_validation() {
        let vm = machine().await;

        let err = vm.add_item("cola", 0, 1).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        let err = vm.add_item("", 10, 1).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        assert!(vm.items().await.unwrap().is_empty());
    }
}
