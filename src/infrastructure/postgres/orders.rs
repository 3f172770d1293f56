use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::aggregates::{NewOrder, Order, OrderItem, OrderPatch, OrderStatus};
use crate::ports::OrderStore;
use crate::StoreError;

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: String,
    user_id: String,
    items: Json<Vec<OrderItem>>,
    total_amount: Decimal,
    status: String,
    shipping_address: String,
    payment_method: String,
    payment_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Order {
            status: row.status.parse::<OrderStatus>().map_err(|e| StoreError::Unavailable(e.to_string()))?,
            id: row.id,
            user_id: row.user_id,
            items: row.items.0,
            total_amount: row.total_amount,
            shipping_address: row.shipping_address,
            payment_method: row.payment_method,
            payment_id: row.payment_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn create(&self, o: NewOrder) -> Result<Order, StoreError> {
        let now = Utc::now();
        sqlx::query_as::<_, OrderRow>(
            "INSERT INTO orders (id, user_id, items, total_amount, status, shipping_address, payment_method, payment_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9) RETURNING *",
        )
        .bind(Uuid::now_v7().to_string()).bind(&o.user_id).bind(Json(&o.items)).bind(o.total_amount)
        .bind(o.status.as_str()).bind(&o.shipping_address).bind(&o.payment_method).bind(&o.payment_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?
        .try_into()
    }

    async fn get(&self, id: &str) -> Result<Order, StoreError> {
        sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1").bind(id).fetch_one(&self.pool).await?.try_into()
    }

    async fn update(&self, id: &str, patch: &OrderPatch) -> Result<Order, StoreError> {
        sqlx::query_as::<_, OrderRow>(
            "UPDATE orders SET shipping_address = COALESCE($2, shipping_address), \
             payment_method = COALESCE($3, payment_method), payment_id = COALESCE($4, payment_id), \
             updated_at = $5 WHERE id = $1 RETURNING *",
        )
        .bind(id).bind(&patch.shipping_address).bind(&patch.payment_method).bind(&patch.payment_id).bind(Utc::now())
        .fetch_one(&self.pool)
        .await?
        .try_into()
    }

    async fn update_status(&self, id: &str, from: OrderStatus, to: OrderStatus) -> Result<Order, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(
            "UPDATE orders SET status = $3, updated_at = $4 WHERE id = $1 AND status = $2 RETURNING *",
        )
        .bind(id).bind(from.as_str()).bind(to.as_str()).bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.try_into(),
            None => {
                let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM orders WHERE id = $1)")
                    .bind(id)
                    .fetch_one(&self.pool)
                    .await?;
                if exists {
                    Err(StoreError::Conflict(format!("order {id} is no longer {from}")))
                } else {
                    Err(StoreError::NotFound)
                }
            }
        }
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Order>, StoreError> {
        sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Order::try_from)
            .collect()
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1").bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
