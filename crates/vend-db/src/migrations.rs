//! # Database Migrations
//!
//! Embedded SQL migrations plus first-use seeding of the cash tables.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Database::new()                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  run_migrations()   CREATE TABLE IF NOT EXISTS ... (idempotent)         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  seed_cash_tables() change_box     empty? → 20,10,5,1 at 0              │
//! │                     collection_box empty? → 100,20,10,5,1 at 0          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Databases created by earlier versions of the machine already have the
//! tables; the `IF NOT EXISTS` guards let the migration pass over them.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;
use crate::schema::CashBox;

/// Embedded migrations from the crate's `migrations/` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Runs all pending database migrations.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Seeds each cash table with its denominations at count 0, but only when the
/// table is empty. Returns how many tables were seeded.
pub async fn seed_cash_tables(pool: &SqlitePool) -> DbResult<usize> {
    let mut seeded = 0;

    for cash_box in [CashBox::ChangeReserve, CashBox::CollectionBox] {
        let mut tx = pool.begin().await?;

        let rows: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", cash_box.table()))
            .fetch_one(&mut *tx)
            .await?;

        if rows > 0 {
            continue;
        }

        for denomination in cash_box.denominations() {
            sqlx::query(&format!(
                "INSERT INTO {} (THB, Count) VALUES (?1, 0)",
                cash_box.table()
            ))
            .bind(denomination.label())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!(table = cash_box.table(), "Seeded cash table");
        seeded += 1;
    }

    Ok(seeded)
}

/// Returns (total_migrations, applied_migrations) for diagnostics.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, applied as usize))
}
