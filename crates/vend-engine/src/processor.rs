//! # Purchase Processor
//!
//! Runs one purchase end to end, talking to the caller over a pair of
//! bounded channels.
//!
//! ## Tender Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   Caller (TenderHandle)                 Engine (TenderPort)             │
//! │   ─────────────────────                 ───────────────────             │
//! │                                          get item, stock > 0?           │
//! │        ◄──── TenderRequired {price, total: 0, remaining}                │
//! │   Insert(20) ─────►                                                     │
//! │        ◄──── TenderAccepted {20THB, total: 20}                          │
//! │        ◄──── TenderRequired {price, total: 20, remaining}               │
//! │   Insert(3) ──────►                                                     │
//! │        ◄──── TenderRejected {value: 3}       (not counted)              │
//! │        ◄──── TenderRequired {...}                                       │
//! │   Insert(20) ─────►                                                     │
//! │        ◄──── TenderAccepted {20THB, total: 40}  total >= price          │
//! │                                          read reserve, greedy change    │
//! │                                          atomic commit                  │
//! │        ◄════ PurchaseOutcome::Completed(Receipt)   (return value)       │
//! │                                                                         │
//! │   Cancel, or dropping either end while tender is awaited                │
//! │        ◄════ PurchaseOutcome::Cancelled   (no ledger touched)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The tender loop waits for input indefinitely; there is no timeout.

use chrono::Utc;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use vend_core::{Denomination, Receipt, TenderOutcome, Transaction};
use vend_db::{Database, PurchaseCommit};

use crate::error::{VendError, VendResult};

// =============================================================================
// Protocol Types
// =============================================================================

/// Engine → caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PurchaseEvent {
    /// More money is needed.
    TenderRequired {
        price: i64,
        total: i64,
        remaining: i64,
    },

    /// A denomination was counted.
    TenderAccepted {
        denomination: Denomination,
        total: i64,
    },

    /// The value is not an accepted denomination and was not counted.
    TenderRejected { value: i64 },
}

/// Caller → engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenderInput {
    Insert(i64),
    Cancel,
}

/// How a purchase ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "receipt", rename_all = "snake_case")]
pub enum PurchaseOutcome {
    Completed(Receipt),
    Cancelled,
}

impl PurchaseOutcome {
    pub fn receipt(&self) -> Option<&Receipt> {
        match self {
            PurchaseOutcome::Completed(receipt) => Some(receipt),
            PurchaseOutcome::Cancelled => None,
        }
    }
}

// =============================================================================
// Tender Channel
// =============================================================================

/// Creates the two ends of a tender channel. `buffer` bounds both directions.
pub fn tender_channel(buffer: usize) -> (TenderHandle, TenderPort) {
    let (input_tx, input_rx) = mpsc::channel(buffer);
    let (event_tx, event_rx) = mpsc::channel(buffer);

    (
        TenderHandle { input_tx, event_rx },
        TenderPort { input_rx, event_tx },
    )
}

/// Caller end: feeds denominations in, receives prompts out.
#[derive(Debug)]
pub struct TenderHandle {
    input_tx: mpsc::Sender<TenderInput>,
    event_rx: mpsc::Receiver<PurchaseEvent>,
}

impl TenderHandle {
    /// Inserts a value. Returns `false` once the purchase is over.
    pub async fn insert(&self, value: i64) -> bool {
        self.input_tx.send(TenderInput::Insert(value)).await.is_ok()
    }

    /// Requests cancellation. Returns `false` once the purchase is over.
    pub async fn cancel(&self) -> bool {
        self.input_tx.send(TenderInput::Cancel).await.is_ok()
    }

    /// Next engine event, `None` when the purchase has finished.
    pub async fn next_event(&mut self) -> Option<PurchaseEvent> {
        self.event_rx.recv().await
    }

    /// Sender clone for callers that read input on a separate task.
    pub fn input(&self) -> mpsc::Sender<TenderInput> {
        self.input_tx.clone()
    }
}

/// Engine end, consumed by one purchase.
#[derive(Debug)]
pub struct TenderPort {
    input_rx: mpsc::Receiver<TenderInput>,
    event_tx: mpsc::Sender<PurchaseEvent>,
}

impl TenderPort {
    /// Sends an event. `false` means the caller stopped listening.
    async fn emit(&self, event: PurchaseEvent) -> bool {
        self.event_tx.send(event).await.is_ok()
    }

    /// Waits for input. A closed channel reads as cancel.
    async fn recv(&mut self) -> TenderInput {
        self.input_rx.recv().await.unwrap_or(TenderInput::Cancel)
    }
}

// =============================================================================
// Processor
// =============================================================================

/// Drives the purchase state machine against the store.
///
/// Holds no ledger state of its own. Every count comes fresh from the
/// [`Database`] handle at the step that needs it.
#[derive(Debug, Clone)]
pub struct PurchaseProcessor {
    db: Database,
}

impl PurchaseProcessor {
    pub fn new(db: Database) -> Self {
        PurchaseProcessor { db }
    }

    /// Executes one purchase.
    ///
    /// ## Steps
    /// 1. Look up the item; `ItemNotFound` / `OutOfStock` end it before any
    ///    tender is requested
    /// 2. Tender loop until `total >= price` or cancel
    /// 3. Read the change reserve and compute greedy change; on
    ///    `InsufficientChange` nothing is written
    /// 4. Commit change, tender and stock in one store transaction
    ///
    /// ## Returns
    /// * `Ok(Completed(receipt))` - all three ledgers updated
    /// * `Ok(Cancelled)` - caller cancelled, no ledger touched
    /// * `Err(_)` - typed failure, no ledger touched
    pub async fn execute(&self, name: &str, mut port: TenderPort) -> VendResult<PurchaseOutcome> {
        let item = self.db.items().require(name).await?;
        let mut txn = Transaction::new(&item);

        if let Err(err) = txn.start() {
            info!(txn = %txn.id(), item = %item.name, "Purchase refused: out of stock");
            return Err(err.into());
        }

        info!(txn = %txn.id(), item = %item.name, price = item.price, "Purchase started");

        if !self.collect_tender(&mut txn, &mut port).await? {
            txn.cancel()?;
            info!(txn = %txn.id(), total = txn.total(), "Purchase cancelled");
            return Ok(PurchaseOutcome::Cancelled);
        }

        let reserve = self.db.change().counts().await?;
        if let Err(err) = txn.compute_change(&reserve) {
            warn!(
                txn = %txn.id(),
                change_due = txn.change_due(),
                error = %err,
                "Purchase aborted before commit"
            );
            return Err(err.into());
        }

        let commit = PurchaseCommit {
            item: txn.item().to_string(),
            change: txn.change().clone(),
            tendered: txn.tender_breakdown(),
        };

        let stock = match self.db.purchases().commit(&commit).await {
            Ok(stock) => stock,
            Err(err) => {
                txn.abort();
                let err = VendError::from(err);
                warn!(txn = %txn.id(), error = %err, "Purchase commit failed");
                return Err(err);
            }
        };

        let receipt = txn.complete(Utc::now())?;

        info!(
            txn = %receipt.transaction_id,
            item = %receipt.item,
            total = receipt.total_tendered,
            change_due = receipt.change_due,
            stock_left = stock,
            "Purchase completed"
        );

        Ok(PurchaseOutcome::Completed(receipt))
    }

    /// Runs the tender loop. Returns `false` when the caller cancelled.
    async fn collect_tender(&self, txn: &mut Transaction, port: &mut TenderPort) -> VendResult<bool> {
        loop {
            let prompt = PurchaseEvent::TenderRequired {
                price: txn.price(),
                total: txn.total(),
                remaining: txn.remaining(),
            };
            if !port.emit(prompt).await {
                return Ok(false);
            }

            let value = match port.recv().await {
                TenderInput::Insert(value) => value,
                TenderInput::Cancel => return Ok(false),
            };

            match txn.insert(value)? {
                TenderOutcome::Rejected { value } => {
                    debug!(txn = %txn.id(), value, "Tender rejected");
                    if !port.emit(PurchaseEvent::TenderRejected { value }).await {
                        return Ok(false);
                    }
                }
                TenderOutcome::Accepted {
                    denomination,
                    total,
                    ..
                } => {
                    debug!(txn = %txn.id(), denomination = %denomination, total, "Tender accepted");
                    if !port
                        .emit(PurchaseEvent::TenderAccepted { denomination, total })
                        .await
                    {
                        return Ok(false);
                    }
                }
                TenderOutcome::Covered { denomination, total } => {
                    debug!(txn = %txn.id(), denomination = %denomination, total, "Tender covers price");
                    // The price is covered; a caller that stopped listening
                    // here still gets the purchase.
                    let _ = port
                        .emit(PurchaseEvent::TenderAccepted { denomination, total })
                        .await;
                    return Ok(true);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vend_core::{CoreError, Item};
    use vend_db::DbConfig;

    async fn setup(stock: i64) -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        for d in [
            Denomination::Twenty,
            Denomination::Ten,
            Denomination::Five,
            Denomination::One,
        ] {
            db.change().refill(d, 5).await.unwrap();
        }
        db.items().insert(&Item::new("cola", 37, stock).unwrap()).await.unwrap();
        db
    }

    /// Feeds `values` and collects every event until the engine hangs up.
    async fn drive(mut handle: TenderHandle, values: Vec<i64>) -> Vec<PurchaseEvent> {
        let mut values = values.into_iter();
        let mut events = Vec::new();
        while let Some(event) = handle.next_event().await {
            if matches!(event, PurchaseEvent::TenderRequired { .. }) {
                match values.next() {
                    Some(value) => {
                        handle.insert(value).await;
                    }
                    None => {
                        handle.cancel().await;
                    }
                }
            }
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_event_sequence() {
        let db = setup(3).await;
        let processor = PurchaseProcessor::new(db);
        let (handle, port) = tender_channel(4);

        let (outcome, events) =
            tokio::join!(processor.execute("cola", port), drive(handle, vec![20, 3, 20]));

        assert!(matches!(outcome.unwrap(), PurchaseOutcome::Completed(_)));
        assert_eq!(
            events,
            vec![
                PurchaseEvent::TenderRequired { price: 37, total: 0, remaining: 37 },
                PurchaseEvent::TenderAccepted { denomination: Denomination::Twenty, total: 20 },
                PurchaseEvent::TenderRequired { price: 37, total: 20, remaining: 17 },
                PurchaseEvent::TenderRejected { value: 3 },
                PurchaseEvent::TenderRequired { price: 37, total: 20, remaining: 17 },
                PurchaseEvent::TenderAccepted { denomination: Denomination::Twenty, total: 40 },
            ]
        );
    }

    #[tokio::test]
    async fn test_dropped_handle_cancels() {
        let db = setup(3).await;
        let processor = PurchaseProcessor::new(db.clone());
        let (handle, port) = tender_channel(4);
        drop(handle);

        let outcome = processor.execute("cola", port).await.unwrap();
        assert_eq!(outcome, PurchaseOutcome::Cancelled);
        assert_eq!(db.items().require("cola").await.unwrap().stock, 3);
    }

    #[tokio::test]
    async fn test_out_of_stock_never_prompts() {
        let db = setup(0).await;
        let processor = PurchaseProcessor::new(db);
        let (handle, port) = tender_channel(4);

        let (outcome, events) = tokio::join!(processor.execute("cola", port), drive(handle, vec![]));

        assert!(matches!(
            outcome.unwrap_err(),
            VendError::Domain(CoreError::OutOfStock(_))
        ));
        assert!(events.is_empty());
    }
}
