//! PostgreSQL stores
mod orders;
mod products;
mod users;

pub use orders::PgOrderStore;
pub use products::PgProductStore;
pub use users::PgUserStore;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Open the pool and bring the schema up to date.
pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new().max_connections(max_connections).connect(database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}
