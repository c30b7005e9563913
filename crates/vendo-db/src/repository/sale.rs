//! # Sale Repository
//!
//! The sales journal and the atomic write that follows every vend.
//!
//! ## Commit Vend
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  VendReceipt + till snapshot                                            │
//! │       │                                                                 │
//! │       ▼  BEGIN                                                          │
//! │  1. coins     ← whole till snapshot (banked in, change out)             │
//! │  2. products  ← remaining stock of the sold slot                        │
//! │  3. sales     ← journal row (coins as JSON)                             │
//! │       │                                                                 │
//! │       ▼  COMMIT (or nothing at all)                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::coin::save_stock_in;
use crate::repository::product::set_quantity_in;
use vendo_core::{ChangeStatus, CoinBatch, CoinStock, Money, VendReceipt};

/// One journaled sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: String,
    pub product_code: String,
    pub product_name: String,
    pub price: Money,
    pub inserted: Money,
    pub returned: Money,
    pub unpayable: Money,
    pub change_status: ChangeStatus,
    /// Coin values in stotinki, in insertion order.
    pub inserted_coins: Vec<u32>,
    /// Coin values in stotinki, as dispensed.
    pub returned_coins: Vec<u32>,
    pub created_at: DateTime<Utc>,
}

/// Aggregate figures over the whole journal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesTotals {
    pub count: u64,
    pub revenue: Money,
    pub unpayable: Money,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct SaleRow {
    id: String,
    product_code: String,
    product_name: String,
    price_stotinki: i64,
    inserted_stotinki: i64,
    returned_stotinki: i64,
    unpayable_stotinki: i64,
    change_status: ChangeStatus,
    inserted_coins: String,
    returned_coins: String,
    created_at: DateTime<Utc>,
}

fn money(column: &str, value: i64) -> DbResult<Money> {
    u64::try_from(value)
        .map(Money::from_stotinki)
        .map_err(|_| DbError::invalid_column(column, value))
}

fn coin_values(coins: &CoinBatch) -> Vec<u32> {
    coins.iter().map(|d| d.stotinki()).collect()
}

impl TryFrom<SaleRow> for SaleRecord {
    type Error = DbError;

    fn try_from(row: SaleRow) -> Result<Self, Self::Error> {
        Ok(SaleRecord {
            price: money("sales.price_stotinki", row.price_stotinki)?,
            inserted: money("sales.inserted_stotinki", row.inserted_stotinki)?,
            returned: money("sales.returned_stotinki", row.returned_stotinki)?,
            unpayable: money("sales.unpayable_stotinki", row.unpayable_stotinki)?,
            inserted_coins: serde_json::from_str(&row.inserted_coins)?,
            returned_coins: serde_json::from_str(&row.returned_coins)?,
            id: row.id,
            product_code: row.product_code,
            product_name: row.product_name,
            change_status: row.change_status,
            created_at: row.created_at,
        })
    }
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Persists a completed vend in one transaction.
    ///
    /// ## Arguments
    /// * `receipt` - The sale as the coordinator committed it
    /// * `coins` - The till snapshot after the sale
    pub async fn commit_vend(&self, receipt: &VendReceipt, coins: &[CoinStock]) -> DbResult<SaleRecord> {
        let record = SaleRecord {
            id: Uuid::new_v4().to_string(),
            product_code: receipt.product.code.clone(),
            product_name: receipt.product.name.clone(),
            price: receipt.price,
            inserted: receipt.inserted.total(),
            returned: receipt.change.returned_total(),
            unpayable: receipt.change.unpayable,
            change_status: receipt.change.status(),
            inserted_coins: coin_values(&receipt.inserted),
            returned_coins: coin_values(&receipt.change.returned()),
            created_at: Utc::now(),
        };

        let mut tx = self.pool.begin().await?;

        save_stock_in(&mut *tx, coins).await?;
        set_quantity_in(&mut *tx, &record.product_code, receipt.remaining_stock).await?;

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, product_code, product_name,
                price_stotinki, inserted_stotinki, returned_stotinki, unpayable_stotinki,
                change_status, inserted_coins, returned_coins, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&record.id)
        .bind(&record.product_code)
        .bind(&record.product_name)
        .bind(record.price.stotinki() as i64)
        .bind(record.inserted.stotinki() as i64)
        .bind(record.returned.stotinki() as i64)
        .bind(record.unpayable.stotinki() as i64)
        .bind(record.change_status)
        .bind(serde_json::to_string(&record.inserted_coins)?)
        .bind(serde_json::to_string(&record.returned_coins)?)
        .bind(record.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            id = %record.id,
            code = %record.product_code,
            price = %record.price,
            "Sale journaled"
        );
        Ok(record)
    }

    /// Most recent sales first.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<SaleRecord>> {
        let rows = sqlx::query_as::<_, SaleRow>(
            r#"
            SELECT
                id, product_code, product_name,
                price_stotinki, inserted_stotinki, returned_stotinki, unpayable_stotinki,
                change_status, inserted_coins, returned_coins, created_at
            FROM sales
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Loaded recent sales");
        rows.into_iter().map(SaleRecord::try_from).collect()
    }

    /// Count, revenue and change owed but not paid, over all sales.
    pub async fn totals(&self) -> DbResult<SalesTotals> {
        let (count, revenue, unpayable): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(price_stotinki), 0),
                COALESCE(SUM(unpayable_stotinki), 0)
            FROM sales
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(SalesTotals {
            count: u64::try_from(count).map_err(|_| DbError::invalid_column("COUNT(*)", count))?,
            revenue: money("SUM(price_stotinki)", revenue)?,
            unpayable: money("SUM(unpayable_stotinki)", unpayable)?,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use vendo_core::{Denomination, Evaluation, MachineConfig, Product};

    async fn seeded() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let config = MachineConfig::default();
        db.coins()
            .ensure_denominations(&config.denominations)
            .await
            .unwrap();
        let mut inventory = vendo_core::CoinInventory::new(&config);
        inventory.deposit(Denomination::new(50), 11).unwrap();
        db.coins().save_stock(&inventory.snapshot()).await.unwrap();
        db.products()
            .insert(&Product::new("A1", "Water", Money::from_stotinki(150), 2))
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn test_commit_vend_writes_everything() {
        let db = seeded().await;
        let mut machine = db.load_machine(MachineConfig::default()).await.unwrap();

        let mut tx = machine.begin_transaction();
        tx.insert_coin(Denomination::new(100)).unwrap();
        tx.insert_coin(Denomination::new(100)).unwrap();
        tx.proceed().unwrap();
        let Evaluation::Completed(receipt) = tx.select_product("A1").unwrap() else {
            panic!("expected a completed sale");
        };

        let record = db
            .sales()
            .commit_vend(&receipt, &machine.coin_report())
            .await
            .unwrap();
        assert_eq!(record.inserted_coins, vec![100, 100]);
        assert_eq!(record.returned_coins, vec![50]);
        assert_eq!(record.change_status, ChangeStatus::Exact);

        // Reloading gives the same machine back
        let reloaded = db.load_machine(MachineConfig::default()).await.unwrap();
        assert_eq!(reloaded.inventory(), machine.inventory());
        assert_eq!(reloaded.products(), machine.products());

        let recent = db.sales().recent(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, record.id);
        assert_eq!(recent[0].returned_coins, record.returned_coins);
    }

    #[tokio::test]
    async fn test_commit_vend_rolls_back_on_missing_product() {
        let db = seeded().await;
        let mut machine = db.load_machine(MachineConfig::default()).await.unwrap();

        let mut tx = machine.begin_transaction();
        tx.insert_coin(Denomination::new(200)).unwrap();
        tx.proceed().unwrap();
        let Evaluation::Completed(receipt) = tx.select_product("A1").unwrap() else {
            panic!("expected a completed sale");
        };

        // The slot disappears from storage before the journal write
        db.products().delete("A1").await.unwrap();
        let err = db
            .sales()
            .commit_vend(&receipt, &machine.coin_report())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        // Coins were not saved either
        let stock = db.coins().load_stock().await.unwrap();
        assert!(stock.contains(&(200, 0)));
        assert_eq!(db.sales().totals().await.unwrap(), SalesTotals::default());
    }

    #[tokio::test]
    async fn test_totals() {
        let db = seeded().await;
        assert_eq!(db.sales().totals().await.unwrap().count, 0);

        let mut machine = db.load_machine(MachineConfig::default()).await.unwrap();
        let mut tx = machine.begin_transaction();
        tx.insert_coin(Denomination::new(200)).unwrap();
        tx.proceed().unwrap();
        let Evaluation::Completed(receipt) = tx.select_product("A1").unwrap() else {
            panic!("expected a completed sale");
        };
        db.sales()
            .commit_vend(&receipt, &machine.coin_report())
            .await
            .unwrap();

        let totals = db.sales().totals().await.unwrap();
        assert_eq!(totals.count, 1);
        assert_eq!(totals.revenue, Money::from_stotinki(150));
        assert_eq!(totals.unpayable, Money::zero());
    }
}
