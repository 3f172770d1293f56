use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::domain::aggregates::{NewUser, User};
use crate::ports::{AccountReader, UserStore};
use crate::StoreError;

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountReader for PgUserStore {
    async fn get_user(&self, id: &str) -> Result<User, StoreError> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1").bind(id).fetch_one(&self.pool).await?)
    }

    async fn attach_order(&self, user_id: &str, order_id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET order_ids = array_append(order_ids, $2), updated_at = $3 WHERE id = $1")
            .bind(user_id)
            .bind(order_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn get_by_email(&self, email: &str) -> Result<User, StoreError> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1").bind(email).fetch_one(&self.pool).await?)
    }

    async fn create(&self, u: NewUser) -> Result<User, StoreError> {
        let now = Utc::now();
        Ok(sqlx::query_as::<_, User>(
            "INSERT INTO users (id, username, email, password_hash, first_name, last_name, phone, shipping_address, \
             registration_date, is_admin, balance, order_ids, created_at, updated_at) \
             VALUES (nextval('user_id_seq')::text, $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, '{}', $11, $11) RETURNING *",
        )
        .bind(&u.username).bind(&u.email).bind(&u.password_hash).bind(&u.first_name).bind(&u.last_name)
        .bind(&u.phone).bind(&u.shipping_address).bind(&u.registration_date).bind(u.is_admin).bind(u.balance)
        .bind(now)
        .fetch_one(&self.pool)
        .await?)
    }

    /// Identity, hash, admin flag, balance and order list are never written here.
    async fn update(&self, u: User) -> Result<User, StoreError> {
        Ok(sqlx::query_as::<_, User>(
            "UPDATE users SET username = $2, first_name = $3, last_name = $4, phone = $5, shipping_address = $6, \
             updated_at = $7 WHERE id = $1 RETURNING *",
        )
        .bind(&u.id).bind(&u.username).bind(&u.first_name).bind(&u.last_name).bind(&u.phone)
        .bind(&u.shipping_address).bind(Utc::now())
        .fetch_one(&self.pool)
        .await?)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
