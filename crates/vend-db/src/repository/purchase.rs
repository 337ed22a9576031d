//! # Purchase Repository
//!
//! The one place that needs a true atomic unit of work: committing a
//! purchase to all three ledgers.
//!
//! ## Commit Unit of Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    │                                                                    │
//! │    ├── (a) change_box:     Count = Count - n  WHERE Count >= n          │
//! │    │        (one UPDATE per change denomination)                        │
//! │    │                                                                    │
//! │    ├── (b) collection_box: Count = Count + n                            │
//! │    │        (one UPDATE per tendered denomination)                      │
//! │    │                                                                    │
//! │    └── (c) stock:          stock = stock - 1  WHERE stock > 0           │
//! │    │                                                                    │
//! │  COMMIT  ← all three visible together                                   │
//! │                                                                         │
//! │  Any guard miss or error: the transaction is dropped and SQLite rolls   │
//! │  back, so none of (a), (b), (c) land.                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use super::cash::{increment_count, read_count};
use super::item::find_item;
use crate::error::{DbError, DbResult};
use crate::schema::{CashBox, STOCK_TABLE};
use vend_core::types::normalize_name;
use vend_core::{CashCounts, CoreError, Denomination};

/// Everything the commit step writes for one purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseCommit {
    /// Item whose stock drops by one.
    pub item: String,

    /// Change paid out of the reserve.
    pub change: CashCounts,

    /// Tender moved into the collection box.
    pub tendered: CashCounts,
}

/// Repository for the atomic purchase commit.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    /// Creates a new PurchaseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// Applies a purchase to the three ledgers in one transaction and returns
    /// the item's remaining stock.
    ///
    /// ## Errors
    /// * `InsufficientReserve` - a change decrement guard missed
    /// * `OutOfStock` / `ItemNotFound` - the stock decrement guard missed
    /// * `TransactionFailed` - COMMIT itself failed
    ///
    /// On any error nothing is written.
    pub async fn commit(&self, purchase: &PurchaseCommit) -> DbResult<i64> {
        let item = normalize_name(&purchase.item);
        debug!(
            item = %item,
            change = purchase.change.total_value(),
            tendered = purchase.tendered.total_value(),
            "Committing purchase"
        );

        let mut tx = self.pool.begin().await?;

        // (a) pay change out of the reserve
        for (denomination, count) in purchase.change.iter().filter(|(_, c)| *c > 0) {
            dispense(&mut tx, denomination, count).await?;
        }

        // (b) move tender into the collection box
        for (denomination, count) in purchase.tendered.iter().filter(|(_, c)| *c > 0) {
            increment_count(&mut tx, CashBox::CollectionBox, denomination, count).await?;
        }

        // (c) one unit leaves the machine
        let remaining = take_one(&mut tx, &item).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(item = %item, stock = remaining, "Purchase committed");
        Ok(remaining)
    }
}

/// Guarded reserve decrement.
async fn dispense(conn: &mut SqliteConnection, denomination: Denomination, count: i64) -> DbResult<()> {
    let sql = format!(
        "UPDATE {} SET Count = Count - ?1 WHERE THB = ?2 AND Count >= ?1",
        CashBox::ChangeReserve.table()
    );
    let result = sqlx::query(&sql)
        .bind(count)
        .bind(denomination.label())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        let available = read_count(conn, CashBox::ChangeReserve, denomination).await?;
        warn!(
            denomination = %denomination,
            available,
            requested = count,
            "Change reserve guard missed during commit"
        );
        return Err(CoreError::InsufficientReserve {
            denomination: denomination.label().to_string(),
            available,
            requested: count,
        }
        .into());
    }
    Ok(())
}

/// Guarded stock decrement. Returns the stock left afterwards.
async fn take_one(conn: &mut SqliteConnection, item: &str) -> DbResult<i64> {
    let sql = format!(
        "UPDATE {table} SET stock = stock - 1 \
         WHERE rowid = (SELECT rowid FROM {table} WHERE item_name = ?1 AND stock > 0 ORDER BY rowid LIMIT 1)",
        table = STOCK_TABLE
    );
    let result = sqlx::query(&sql).bind(item).execute(&mut *conn).await?;

    if result.rows_affected() == 0 {
        return Err(match find_item(conn, item).await? {
            Some(_) => CoreError::OutOfStock(item.to_string()),
            None => CoreError::ItemNotFound(item.to_string()),
        }
        .into());
    }

    let row = find_item(conn, item)
        .await?
        .ok_or_else(|| CoreError::ItemNotFound(item.to_string()))?;
    Ok(row.stock)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use vend_core::Item;

    async fn setup() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        for d in [
            Denomination::Twenty,
            Denomination::Ten,
            Denomination::Five,
            Denomination::One,
        ] {
            db.change().refill(d, 5).await.unwrap();
        }
        db.items().insert(&Item::new("cola", 37, 2).unwrap()).await.unwrap();
        db
    }

    fn counts(pairs: &[(Denomination, i64)]) -> CashCounts {
        pairs.iter().copied().collect()
    }

    #[tokio::test]
    async fn test_commit_touches_all_three_ledgers() {
        let db = setup().await;

        let remaining = db
            .purchases()
            .commit(&PurchaseCommit {
                item: "Cola".to_string(),
                change: counts(&[(Denomination::One, 3)]),
                tendered: counts(&[(Denomination::Twenty, 2)]),
            })
            .await
            .unwrap();

        assert_eq!(remaining, 1);
        assert_eq!(db.change().counts().await.unwrap().get(Denomination::One), 2);
        assert_eq!(
            db.collection().counts().await.unwrap().get(Denomination::Twenty),
            2
        );
        assert_eq!(db.items().require("cola").await.unwrap().stock, 1);
    }

    #[tokio::test]
    async fn test_reserve_guard_miss_rolls_back_everything() {
        let db = setup().await;

        let err = db
            .purchases()
            .commit(&PurchaseCommit {
                item: "cola".to_string(),
                change: counts(&[(Denomination::Ten, 1), (Denomination::One, 6)]),
                tendered: counts(&[(Denomination::Hundred, 1)]),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientReserve {
                available: 5,
                requested: 6,
                ..
            })
        ));

        let reserve = db.change().counts().await.unwrap();
        assert_eq!(reserve.get(Denomination::Ten), 5);
        assert_eq!(reserve.get(Denomination::One), 5);
        assert_eq!(db.collection().counts().await.unwrap().total_value(), 0);
        assert_eq!(db.items().require("cola").await.unwrap().stock, 2);
    }

    #[tokio::test]
    async fn test_stock_guard_miss_rolls_back_cash() {
        let db = setup().await;
        db.items().adjust_stock("cola", -2).await.unwrap();

        let err = db
            .purchases()
            .commit(&PurchaseCommit {
                item: "cola".to_string(),
                change: counts(&[(Denomination::One, 3)]),
                tendered: counts(&[(Denomination::Twenty, 2)]),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Domain(CoreError::OutOfStock(_))));
        assert_eq!(db.change().counts().await.unwrap().get(Denomination::One), 5);
        assert_eq!(db.collection().counts().await.unwrap().total_value(), 0);
    }

    #[tokio::test]
    async fn test_unknown_item() {
        let db = setup().await;

        let err = db
            .purchases()
            .commit(&PurchaseCommit {
                item: "water".to_string(),
                change: CashCounts::new(),
                tendered: counts(&[(Denomination::Ten, 1)]),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Domain(CoreError::ItemNotFound(_))));
        assert_eq!(db.collection().counts().await.unwrap().total_value(), 0);
    }
}
