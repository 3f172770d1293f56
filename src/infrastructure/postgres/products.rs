use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::aggregates::{Product, ProductFilter};
use crate::ports::{CatalogReader, ProductStore};
use crate::StoreError;

#[derive(Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogReader for PgProductStore {
    async fn get_product(&self, id: &str) -> Result<Product, StoreError> {
        Ok(sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1").bind(id).fetch_one(&self.pool).await?)
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn create(&self, p: Product) -> Result<Product, StoreError> {
        Ok(sqlx::query_as::<_, Product>(
            "INSERT INTO products (id, name, brand, category, description, price, stock, sizes, colors, images, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING *",
        )
        .bind(&p.id).bind(&p.name).bind(&p.brand).bind(&p.category).bind(&p.description)
        .bind(p.price).bind(p.stock).bind(&p.sizes).bind(&p.colors).bind(&p.images)
        .bind(p.created_at).bind(p.updated_at)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update(&self, p: Product) -> Result<Product, StoreError> {
        Ok(sqlx::query_as::<_, Product>(
            "UPDATE products SET name = $2, brand = $3, category = $4, description = $5, price = $6, stock = $7, \
             sizes = $8, colors = $9, images = $10, updated_at = $11 WHERE id = $1 RETURNING *",
        )
        .bind(&p.id).bind(&p.name).bind(&p.brand).bind(&p.category).bind(&p.description)
        .bind(p.price).bind(p.stock).bind(&p.sizes).bind(&p.colors).bind(&p.images)
        .bind(p.updated_at)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, StoreError> {
        Ok(sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE ($1::text IS NULL OR category = $1) AND ($2::text IS NULL OR brand = $2) \
             ORDER BY created_at DESC, id",
        )
        .bind(filter.category.as_deref())
        .bind(filter.brand.as_deref())
        .fetch_all(&self.pool)
        .await?)
    }

    async fn search(&self, query: &str) -> Result<Vec<Product>, StoreError> {
        Ok(sqlx::query_as::<_, Product>(
            "SELECT * FROM products \
             WHERE to_tsvector('simple', name || ' ' || description) @@ plainto_tsquery('simple', $1) \
             ORDER BY ts_rank(to_tsvector('simple', name || ' ' || description), plainto_tsquery('simple', $1)) DESC, id",
        )
        .bind(query)
        .fetch_all(&self.pool)
        .await?)
    }
}
