//! # Item Repository
//!
//! Inventory ledger: the `stock_67011755` table.
//!
//! ## Name Normalization
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Case-Insensitive Lookup                              │
//! │                                                                         │
//! │  add("Cola", 25, 10)      get_by_name("COLA")     delete(" cola ")      │
//! │       │                         │                       │               │
//! │       ▼                         ▼                       ▼               │
//! │  normalize_name() → "cola" (trim + lowercase, on write AND on lookup)   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌──────────────────────────────────┐                                   │
//! │  │ stock_67011755                   │                                   │
//! │  │ item_name │ price │ stock        │                                   │
//! │  │ cola      │ 25    │ 10           │ ← one row for all three calls     │
//! │  └──────────────────────────────────┘                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The table has no UNIQUE constraint (older databases may not have one
//! either), so uniqueness is enforced here inside a transaction.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::schema::{ItemRow, STOCK_TABLE};
use vend_core::types::normalize_name;
use vend_core::validation::validate_restock_amount;
use vend_core::{CoreError, Item, ValidationError};

/// Repository for the inventory ledger.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.items();
///
/// repo.insert(&Item::new("Cola", 25, 10)?).await?;
/// let cola = repo.get_by_name("COLA").await?;
/// repo.restock("cola", 5).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Lists every item in insertion order.
    pub async fn list_all(&self) -> DbResult<Vec<Item>> {
        let sql = format!(
            "SELECT item_name, price, stock FROM {} ORDER BY rowid",
            STOCK_TABLE
        );
        let rows: Vec<ItemRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        Ok(rows.into_iter().map(Item::from).collect())
    }

    /// Lists items that can currently be bought (`stock > 0`).
    pub async fn list_available(&self) -> DbResult<Vec<Item>> {
        let sql = format!(
            "SELECT item_name, price, stock FROM {} WHERE stock > 0 ORDER BY rowid",
            STOCK_TABLE
        );
        let rows: Vec<ItemRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        Ok(rows.into_iter().map(Item::from).collect())
    }

    /// Gets an item by name (case-insensitive).
    ///
    /// ## Returns
    /// * `Ok(Some(Item))` - Item found
    /// * `Ok(None)` - No item with that name
    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Item>> {
        let mut conn = self.pool.acquire().await?;
        let row = find_item(&mut conn, &normalize_name(name)).await?;
        Ok(row.map(Item::from))
    }

    /// Gets an item by name, failing with `ItemNotFound` when absent.
    pub async fn require(&self, name: &str) -> DbResult<Item> {
        self.get_by_name(name)
            .await?
            .ok_or_else(|| CoreError::ItemNotFound(normalize_name(name)).into())
    }

    /// Total number of items in the catalog.
    pub async fn count(&self) -> DbResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", STOCK_TABLE);
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }

    /// Number of items whose stock is exhausted.
    pub async fn count_out_of_stock(&self) -> DbResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE stock = 0", STOCK_TABLE);
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Inserts a validated item.
    ///
    /// ## Errors
    /// * `Duplicate` validation error if an item with the same normalized
    ///   name already exists. Nothing is written in that case.
    pub async fn insert(&self, item: &Item) -> DbResult<()> {
        let name = normalize_name(&item.name);
        debug!(item = %name, price = item.price, stock = item.stock, "Inserting item");

        let mut tx = self.pool.begin().await?;

        if find_item(&mut tx, &name).await?.is_some() {
            return Err(DbError::validation(ValidationError::duplicate_item(name)));
        }

        let sql = format!(
            "INSERT INTO {} (item_name, price, stock) VALUES (?1, ?2, ?3)",
            STOCK_TABLE
        );
        sqlx::query(&sql)
            .bind(&name)
            .bind(item.price)
            .bind(item.stock)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(item = %name, "Item added");
        Ok(())
    }

    /// Deletes an item by name.
    pub async fn delete(&self, name: &str) -> DbResult<()> {
        let name = normalize_name(name);
        let sql = format!("DELETE FROM {} WHERE item_name = ?1", STOCK_TABLE);

        let result = sqlx::query(&sql).bind(&name).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ItemNotFound(name).into());
        }

        info!(item = %name, "Item deleted");
        Ok(())
    }

    /// Adjusts an item's stock by a signed delta and returns the updated item.
    ///
    /// ## Errors
    /// * `ItemNotFound` - no item with that name
    /// * `NegativeStock` - the result would drop below zero (nothing written)
    pub async fn adjust_stock(&self, name: &str, delta: i64) -> DbResult<Item> {
        let name = normalize_name(name);
        let mut tx = self.pool.begin().await?;

        let row = find_item(&mut tx, &name)
            .await?
            .ok_or_else(|| CoreError::ItemNotFound(name.clone()))?;

        let new_stock = row.stock + delta;
        if new_stock < 0 {
            return Err(CoreError::NegativeStock {
                item: name,
                current: row.stock,
                delta,
            }
            .into());
        }

        let sql = format!(
            "UPDATE {table} SET stock = ?1 \
             WHERE rowid = (SELECT rowid FROM {table} WHERE item_name = ?2 ORDER BY rowid LIMIT 1)",
            table = STOCK_TABLE
        );
        sqlx::query(&sql)
            .bind(new_stock)
            .bind(&name)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(item = %name, delta, stock = new_stock, "Stock adjusted");
        Ok(Item {
            name,
            price: row.price,
            stock: new_stock,
        })
    }

    /// Admin restock: validates the amount, then adds it to the stock.
    pub async fn restock(&self, name: &str, amount: i64) -> DbResult<Item> {
        validate_restock_amount(amount).map_err(DbError::validation)?;
        let item = self.adjust_stock(name, amount).await?;
        info!(item = %item.name, amount, stock = item.stock, "Item restocked");
        Ok(item)
    }
}

/// Looks up the first row for an already-normalized name.
pub(crate) async fn find_item(conn: &mut SqliteConnection, name: &str) -> DbResult<Option<ItemRow>> {
    let sql = format!(
        "SELECT item_name, price, stock FROM {} WHERE item_name = ?1 ORDER BY rowid LIMIT 1",
        STOCK_TABLE
    );
    let row: Option<ItemRow> = sqlx::query_as(&sql)
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}
