use crate::error::{DatabaseError, Result};
use bizhub_models::{NewProduct, Product};
use chrono::Utc;
use sqlx::SqlitePool;

/// Tenant-scoped product access. Callers hand in the pool of whichever store
/// the router selected.
#[derive(Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, product: &NewProduct) -> Result<Product> {
        let now = Utc::now();

        sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (sku, name, price_cents, is_active, created_at, updated_at)
            VALUES (?, ?, ?, 1, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&product.sku)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::on_unique(e, "Product", &format!("sku '{}'", product.sku)))
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE is_active = 1 ORDER BY id LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
