use async_trait::async_trait;
use common::{Money, ProductId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{InventoryError, InventoryPort, Product, Result};

/// Largest value the `products.stock` column can hold.
const MAX_STOCK: i64 = i32::MAX as i64;

/// PostgreSQL-backed inventory.
///
/// Stock adjustments are a single conditional `UPDATE`, so concurrent
/// reservations for the same product serialize on the row lock and can never
/// drive stock below zero.
#[derive(Clone)]
pub struct PostgresInventory {
    pool: PgPool,
}

impl PostgresInventory {
    /// Creates a new PostgreSQL inventory.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Inserts a product row. Used for seeding; catalog editing lives elsewhere.
    pub async fn insert_product(&self, product: &Product) -> Result<()> {
        let stock = i32::try_from(product.stock)
            .map_err(|_| InventoryError::StockOverflow(product.id))?;

        sqlx::query(
            r#"
            INSERT INTO products (id, name, price_cents, stock, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(product.price.cents())
        .bind(stock)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        let id = ProductId::from_uuid(row.try_get::<Uuid, _>("id")?);
        let stock = stock_from_column(&id, row.try_get("stock")?)?;

        Ok(Product {
            id,
            name: row.try_get("name")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            stock,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl InventoryPort for PostgresInventory {
    #[tracing::instrument(skip(self))]
    async fn get_product(&self, product_id: &ProductId) -> Result<Option<Product>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT id, name, price_cents, stock, created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(product_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn adjust_stock(&self, product_id: &ProductId, delta: i64) -> Result<u32> {
        let updated: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET stock = stock + $2, updated_at = NOW()
            WHERE id = $1 AND stock + $2 >= 0 AND stock + $2 <= $3
            RETURNING stock
            "#,
        )
        .bind(product_id.as_uuid())
        .bind(delta)
        .bind(MAX_STOCK)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(stock) = updated {
            return stock_from_column(product_id, stock);
        }

        // The update matched nothing: either the product is missing or the
        // guard rejected it. This read only shapes the error.
        let current: Option<i32> = sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
            .bind(product_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        match current {
            None => Err(InventoryError::ProductNotFound(*product_id)),
            Some(available) => Err(rejected_adjustment(
                *product_id,
                stock_from_column(product_id, available)?,
                delta,
            )),
        }
    }
}

fn stock_from_column(product_id: &ProductId, stock: i32) -> Result<u32> {
    u32::try_from(stock).map_err(|_| {
        InventoryError::Unavailable(format!(
            "negative stock {stock} recorded for product {product_id}"
        ))
    })
}

/// Names the guard that rejected an adjustment: decrements can only fail the
/// lower bound, increments only the upper one.
fn rejected_adjustment(product_id: ProductId, available: u32, delta: i64) -> InventoryError {
    if delta < 0 {
        InventoryError::InsufficientStock {
            product_id,
            requested: u32::try_from(delta.unsigned_abs()).unwrap_or(u32::MAX),
            available,
        }
    } else {
        InventoryError::StockOverflow(product_id)
    }
}
