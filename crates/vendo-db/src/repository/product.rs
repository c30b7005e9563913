//! # Product Repository
//!
//! Database operations for the machine's product slots.
//!
//! ## Key Operations
//! - List and look up by code
//! - Insert / delete a slot
//! - Price and quantity updates

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use vendo_core::{Money, Product};

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let products = repo.list().await?;
/// let water = repo.get_by_code("A1").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct ProductRow {
    code: String,
    name: String,
    price_stotinki: i64,
    quantity: i64,
}

impl TryFrom<ProductRow> for Product {
    type Error = DbError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = u64::try_from(row.price_stotinki)
            .map_err(|_| DbError::invalid_column("products.price_stotinki", row.price_stotinki))?;
        let quantity = u32::try_from(row.quantity)
            .map_err(|_| DbError::invalid_column("products.quantity", row.quantity))?;

        Ok(Product {
            code: row.code,
            name: row.name,
            price: Money::from_stotinki(price),
            quantity,
        })
    }
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists every product, ordered by code.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT code, name, price_stotinki, quantity
            FROM products
            ORDER BY code
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Listed products");
        rows.into_iter().map(Product::try_from).collect()
    }

    /// Gets a product by its code.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT code, name, price_stotinki, quantity
            FROM products
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// The generated row ID.
    pub async fn insert(&self, product: &Product) -> DbResult<String> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO products (id, code, name, price_stotinki, quantity, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            "#,
        )
        .bind(&id)
        .bind(&product.code)
        .bind(&product.name)
        .bind(product.price.stotinki() as i64)
        .bind(product.quantity as i64)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &product.code),
            other => other,
        })?;

        debug!(code = %product.code, %id, "Inserted product");
        Ok(id)
    }

    /// Updates a product's price.
    pub async fn update_price(&self, code: &str, price: Money) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE products SET price_stotinki = ?2, updated_at = ?3
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .bind(price.stotinki() as i64)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", code));
        }
        Ok(())
    }

    /// Sets a product's quantity.
    pub async fn update_quantity(&self, code: &str, quantity: u32) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        set_quantity_in(&mut *conn, code, quantity).await
    }

    /// Deletes a product.
    pub async fn delete(&self, code: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE code = ?1")
            .bind(code)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", code));
        }

        debug!(%code, "Deleted product");
        Ok(())
    }

    /// Counts stored products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Sets a slot's quantity on an open connection or transaction.
pub(crate) async fn set_quantity_in(
    conn: &mut SqliteConnection,
    code: &str,
    quantity: u32,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE products SET quantity = ?2, updated_at = ?3
        WHERE code = ?1
        "#,
    )
    .bind(code)
    .bind(quantity as i64)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", code));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
