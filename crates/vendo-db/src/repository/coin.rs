//! # Coin Repository
//!
//! Persistence for the coin till, one row per denomination.
//!
//! ## Write Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  The till is saved as a whole snapshot, never as deltas:               │
//! │                                                                         │
//! │  CoinInventory::snapshot()                                              │
//! │    [2lv: 4, 1lv: 12, 50st: 10, 20st: 15, 10st: 30]                      │
//! │       │                                                                 │
//! │       ▼  one transaction                                                │
//! │  INSERT ... ON CONFLICT(value) DO UPDATE SET quantity = excluded...     │
//! │                                                                         │
//! │  A crash mid-save leaves the previous snapshot intact.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use vendo_core::{CoinStock, Denominations};

/// Repository for coin till operations.
#[derive(Debug, Clone)]
pub struct CoinRepository {
    pool: SqlitePool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct CoinRow {
    value: i64,
    quantity: i64,
}

impl CoinRow {
    fn into_pair(self) -> DbResult<(u32, u32)> {
        let value =
            u32::try_from(self.value).map_err(|_| DbError::invalid_column("coins.value", self.value))?;
        let quantity = u32::try_from(self.quantity)
            .map_err(|_| DbError::invalid_column("coins.quantity", self.quantity))?;
        Ok((value, quantity))
    }
}

impl CoinRepository {
    /// Creates a new CoinRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CoinRepository { pool }
    }

    /// Loads `(value, quantity)` pairs, largest denomination first.
    pub async fn load_stock(&self) -> DbResult<Vec<(u32, u32)>> {
        let rows = sqlx::query_as::<_, CoinRow>(
            r#"
            SELECT value, quantity
            FROM coins
            ORDER BY value DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Loaded coin stock");
        rows.into_iter().map(CoinRow::into_pair).collect()
    }

    /// Adds an empty row for every configured denomination not yet stored.
    ///
    /// ## Returns
    /// Number of rows created.
    pub async fn ensure_denominations(&self, denominations: &Denominations) -> DbResult<u64> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut created = 0;

        for denomination in denominations.iter() {
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO coins (value, quantity, updated_at)
                VALUES (?1, 0, ?2)
                "#,
            )
            .bind(denomination.stotinki() as i64)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            created += result.rows_affected();
        }

        tx.commit().await?;

        if created > 0 {
            debug!(created, "Created coin rows");
        }
        Ok(created)
    }

    /// Replaces the stored till with `snapshot` in one transaction.
    pub async fn save_stock(&self, snapshot: &[CoinStock]) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        save_stock_in(&mut *tx, snapshot).await?;
        tx.commit().await?;

        debug!(denominations = snapshot.len(), "Saved coin stock");
        Ok(())
    }

    /// Number of stored denominations.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM coins")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Writes a till snapshot on an open connection or transaction.
pub(crate) async fn save_stock_in(conn: &mut SqliteConnection, snapshot: &[CoinStock]) -> DbResult<()> {
    let now = Utc::now();

    for stock in snapshot {
        sqlx::query(
            r#"
            INSERT INTO coins (value, quantity, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(value) DO UPDATE SET
                quantity = excluded.quantity,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(stock.denomination.stotinki() as i64)
        .bind(stock.quantity as i64)
        .bind(now)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use vendo_core::{CoinInventory, Denomination, MachineConfig};

    #[tokio::test]
    async fn test_ensure_denominations_is_idempotent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let denominations = MachineConfig::default().denominations;

        assert_eq!(db.coins().ensure_denominations(&denominations).await.unwrap(), 5);
        assert_eq!(db.coins().ensure_denominations(&denominations).await.unwrap(), 0);
        assert_eq!(db.coins().count().await.unwrap(), 5);

        let stock = db.coins().load_stock().await.unwrap();
        assert_eq!(stock[0], (200, 0));
        assert_eq!(stock[4], (10, 0));
    }

    #[tokio::test]
    async fn test_save_and_load_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let config = MachineConfig::default();

        let mut inventory = CoinInventory::new(&config);
        inventory.deposit(Denomination::new(50), 14).unwrap();
        inventory.deposit(Denomination::new(200), 3).unwrap();
        db.coins().save_stock(&inventory.snapshot()).await.unwrap();

        let loaded = CoinInventory::with_stock(&config, db.coins().load_stock().await.unwrap()).unwrap();
        assert_eq!(loaded, inventory);

        // Saving again overwrites rather than adds
        inventory.withdraw(Denomination::new(50), 4).unwrap();
        db.coins().save_stock(&inventory.snapshot()).await.unwrap();
        let stock = db.coins().load_stock().await.unwrap();
        assert!(stock.contains(&(50, 10)));
    }
}
