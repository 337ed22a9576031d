//! # Cash Repositories
//!
//! The two denomination ledgers: the change reserve (`change_box_67011755`)
//! and the collection box (`collection_box_67011755`).
//!
//! ## Money Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Admin refill ──► ┌────────────────────┐ ──► change paid to customer   │
//! │   (20,10,5,1)      │  Change reserve    │     (greedy, 20→10→5→1)       │
//! │                    └────────────────────┘                               │
//! │                                                                         │
//! │   Customer tender ─► ┌────────────────────┐ ──► Admin collect           │
//! │   (100,20,10,5,1)    │  Collection box    │     (snapshot, then all 0)  │
//! │                      └────────────────────┘                             │
//! │                                                                         │
//! │   Tendered money never flows into the change reserve.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::schema::{fold_cash_rows, CashBox, CashRow};
use vend_core::validation::validate_refill;
use vend_core::{CashCounts, CoreError, Denomination, ValidationError};

// =============================================================================
// Change Reserve
// =============================================================================

/// Repository for the change reserve.
#[derive(Debug, Clone)]
pub struct ChangeReserveRepository {
    pool: SqlitePool,
}

impl ChangeReserveRepository {
    const BOX: CashBox = CashBox::ChangeReserve;

    /// Creates a new ChangeReserveRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ChangeReserveRepository { pool }
    }

    /// Reads every denomination count.
    pub async fn counts(&self) -> DbResult<CashCounts> {
        let mut conn = self.pool.acquire().await?;
        read_counts(&mut conn, Self::BOX).await
    }

    /// Adjusts one denomination by a signed delta and returns the new count.
    ///
    /// ## Errors
    /// * `InsufficientReserve` - the result would be negative (nothing written)
    /// * `NotFound` - the table has no row for this denomination
    pub async fn adjust(&self, denomination: Denomination, delta: i64) -> DbResult<i64> {
        let mut tx = self.pool.begin().await?;

        let current = read_count(&mut tx, Self::BOX, denomination).await?;
        let updated = current + delta;
        if updated < 0 {
            return Err(CoreError::InsufficientReserve {
                denomination: denomination.label().to_string(),
                available: current,
                requested: -delta,
            }
            .into());
        }

        write_count(&mut tx, Self::BOX, denomination, updated).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(denomination = %denomination, delta, count = updated, "Change reserve adjusted");
        Ok(updated)
    }

    /// Admin refill of one change denomination.
    ///
    /// ## Rules
    /// - Only 20, 10, 5 and 1 can be refilled
    /// - Amount must be 0..=1000
    pub async fn refill(&self, denomination: Denomination, amount: i64) -> DbResult<i64> {
        validate_refill(denomination, amount).map_err(DbError::validation)?;
        let count = self.adjust(denomination, amount).await?;
        info!(denomination = %denomination, amount, count, "Change refilled");
        Ok(count)
    }

    /// Refills several denominations in one transaction. Every amount is
    /// validated before anything is written. Returns the counts afterwards.
    pub async fn refill_all(&self, amounts: &CashCounts) -> DbResult<CashCounts> {
        for (denomination, amount) in amounts.iter() {
            validate_refill(denomination, amount).map_err(DbError::validation)?;
        }

        let mut tx = self.pool.begin().await?;
        for (denomination, amount) in amounts.iter() {
            let current = read_count(&mut tx, Self::BOX, denomination).await?;
            write_count(&mut tx, Self::BOX, denomination, current + amount).await?;
        }
        let counts = read_counts(&mut tx, Self::BOX).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            refilled = amounts.piece_count(),
            value = amounts.total_value(),
            "Change reserve refilled"
        );
        Ok(counts)
    }

    /// Number of denominations with no coins or notes left.
    pub async fn count_empty(&self) -> DbResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE Count = 0", Self::BOX.table());
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }
}

// =============================================================================
// Collection Box
// =============================================================================

/// Repository for the collection box.
#[derive(Debug, Clone)]
pub struct CollectionBoxRepository {
    pool: SqlitePool,
}

impl CollectionBoxRepository {
    const BOX: CashBox = CashBox::CollectionBox;

    /// Creates a new CollectionBoxRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CollectionBoxRepository { pool }
    }

    /// Reads every denomination count.
    pub async fn counts(&self) -> DbResult<CashCounts> {
        let mut conn = self.pool.acquire().await?;
        read_counts(&mut conn, Self::BOX).await
    }

    /// Adds received money. The box only grows between collections, so a
    /// negative delta is a validation error.
    pub async fn increment(&self, denomination: Denomination, delta: i64) -> DbResult<i64> {
        if delta < 0 {
            return Err(DbError::validation(ValidationError::OutOfRange {
                field: "delta".to_string(),
                min: 0,
                max: i64::MAX,
            }));
        }

        let mut conn = self.pool.acquire().await?;
        increment_count(&mut conn, Self::BOX, denomination, delta).await?;
        read_count(&mut conn, Self::BOX, denomination).await
    }

    /// Admin collect: snapshots the box, then resets every count to 0.
    ///
    /// Both steps run in one transaction, so the returned snapshot is
    /// exactly what was removed.
    pub async fn collect(&self) -> DbResult<CashCounts> {
        let mut tx = self.pool.begin().await?;

        let snapshot = read_counts(&mut tx, Self::BOX).await?;

        let sql = format!("UPDATE {} SET Count = 0", Self::BOX.table());
        sqlx::query(&sql).execute(&mut *tx).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            pieces = snapshot.piece_count(),
            value = snapshot.total_value(),
            "Collection box emptied"
        );
        Ok(snapshot)
    }

    /// Number of denominations holding at least `threshold` pieces.
    pub async fn count_at_least(&self, threshold: i64) -> DbResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE Count >= ?1", Self::BOX.table());
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(threshold)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Shared row helpers (also used by the purchase commit)
// =============================================================================

pub(crate) async fn read_counts(conn: &mut SqliteConnection, cash_box: CashBox) -> DbResult<CashCounts> {
    let sql = format!("SELECT THB, Count FROM {} ORDER BY rowid", cash_box.table());
    let rows: Vec<CashRow> = sqlx::query_as(&sql).fetch_all(&mut *conn).await?;
    Ok(fold_cash_rows(cash_box.table(), rows))
}

pub(crate) async fn read_count(
    conn: &mut SqliteConnection,
    cash_box: CashBox,
    denomination: Denomination,
) -> DbResult<i64> {
    let sql = format!("SELECT Count FROM {} WHERE THB = ?1", cash_box.table());
    let count: Option<i64> = sqlx::query_scalar(&sql)
        .bind(denomination.label())
        .fetch_optional(&mut *conn)
        .await?;

    count.ok_or_else(|| DbError::not_found(cash_box.display_name(), denomination.label()))
}

async fn write_count(
    conn: &mut SqliteConnection,
    cash_box: CashBox,
    denomination: Denomination,
    count: i64,
) -> DbResult<()> {
    let sql = format!("UPDATE {} SET Count = ?1 WHERE THB = ?2", cash_box.table());
    let result = sqlx::query(&sql)
        .bind(count)
        .bind(denomination.label())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found(cash_box.display_name(), denomination.label()));
    }
    Ok(())
}

pub(crate) async fn increment_count(
    conn: &mut SqliteConnection,
    cash_box: CashBox,
    denomination: Denomination,
    delta: i64,
) -> DbResult<()> {
    let sql = format!("UPDATE {} SET Count = Count + ?1 WHERE THB = ?2", cash_box.table());
    let result = sqlx::query(&sql)
        .bind(delta)
        .bind(denomination.label())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found(cash_box.display_name(), denomination.label()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig, DbError};
    use vend_core::{CashCounts, CoreError, Denomination, ValidationError};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_refill_and_adjust() {
        let db = setup().await;

        assert_eq!(db.change().refill(Denomination::Twenty, 5).await.unwrap(), 5);
        assert_eq!(db.change().adjust(Denomination::Twenty, -2).await.unwrap(), 3);

        let err = db.change().adjust(Denomination::Twenty, -4).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientReserve {
                available: 3,
                requested: 4,
                ..
            })
        ));
        assert_eq!(db.change().counts().await.unwrap().get(Denomination::Twenty), 3);
    }

    #[tokio::test]
    async fn test_refill_rejects_hundred_and_bad_amounts() {
        let db = setup().await;

        let err = db.change().refill(Denomination::Hundred, 1).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::NotAllowed { .. }))
        ));

        let err = db.change().refill(Denomination::One, 1001).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));

        let counts = db.change().counts().await.unwrap();
        assert!(counts.iter().all(|(_, c)| c == 0));
    }

    #[tokio::test]
    async fn test_refill_all_is_validated_up_front() {
        let db = setup().await;

        let bad: CashCounts = [(Denomination::Ten, 5), (Denomination::Five, -1)]
            .into_iter()
            .collect();
        assert!(db.change().refill_all(&bad).await.is_err());
        assert_eq!(db.change().count_empty().await.unwrap(), 4);

        let good: CashCounts = [
            (Denomination::Twenty, 5),
            (Denomination::Ten, 5),
            (Denomination::Five, 5),
            (Denomination::One, 5),
        ]
        .into_iter()
        .collect();
        let after = db.change().refill_all(&good).await.unwrap();
        assert_eq!(after, good);
        assert_eq!(db.change().count_empty().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_collect_returns_snapshot_and_resets() {
        let db = setup().await;

        db.collection().increment(Denomination::Hundred, 2).await.unwrap();
        db.collection().increment(Denomination::Five, 3).await.unwrap();

        let snapshot = db.collection().collect().await.unwrap();
        assert_eq!(snapshot.get(Denomination::Hundred), 2);
        assert_eq!(snapshot.get(Denomination::Five), 3);
        assert_eq!(snapshot.total_value(), 215);

        let after = db.collection().counts().await.unwrap();
        assert_eq!(after.len(), 5);
        assert_eq!(after.total_value(), 0);
    }

    #[tokio::test]
    async fn test_collection_box_only_grows() {
        let db = setup().await;

        let err = db.collection().increment(Denomination::One, -1).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

        assert_eq!(db.collection().increment(Denomination::One, 100).await.unwrap(), 100);
        assert_eq!(db.collection().count_at_least(100).await.unwrap(), 1);
        assert_eq!(db.collection().count_at_least(101).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_change_reserve_has_no_hundred_row() {
        let db = setup().await;

        let err = db.change().adjust(Denomination::Hundred, 1).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
