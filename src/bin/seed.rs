//! Fills the catalog with generated shoes
//!
//! `SEED_COUNT` products (default 50) are created through the catalog
//! service, so each one is announced on the bus. Set `SEED_RNG` to an integer
//! for a reproducible catalog.

use std::sync::Arc;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shoeshop::application::seed::{sample_products, seed_catalog};
use shoeshop::application::CatalogService;
use shoeshop::infrastructure::nats::{DisabledPublisher, NatsPublisher};
use shoeshop::infrastructure::postgres::{self, PgProductStore};
use shoeshop::ports::EventPublisher;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "shoeshop=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let count: usize = match std::env::var("SEED_COUNT") {
        Ok(value) => value.parse().with_context(|| format!("SEED_COUNT has invalid value '{value}'"))?,
        Err(_) => 50,
    };
    let mut rng = match std::env::var("SEED_RNG") {
        Ok(value) => StdRng::seed_from_u64(value.parse().with_context(|| format!("SEED_RNG has invalid value '{value}'"))?),
        Err(_) => StdRng::from_entropy(),
    };

    let db = postgres::connect(&database_url, 2).await.context("cannot reach the database")?;
    let nats_url = std::env::var("NATS_URL").unwrap_or_else(|_| "nats://localhost:4222".to_string());
    let nats = match async_nats::connect(&nats_url).await {
        Ok(client) => Some(NatsPublisher::new(client)),
        Err(e) => {
            tracing::warn!(url = %nats_url, error = %e, "event bus unreachable, seeding without events");
            None
        }
    };
    let publisher: Arc<dyn EventPublisher> = match &nats {
        Some(nats) => Arc::new(nats.clone()),
        None => Arc::new(DisabledPublisher),
    };

    let catalog = CatalogService::new(Arc::new(PgProductStore::new(db.clone())), None, publisher);
    let created = seed_catalog(&catalog, sample_products(count, &mut rng)).await;
    tracing::info!(created, requested = count, "seed completed");

    if let Some(nats) = &nats {
        if let Err(e) = nats.flush().await {
            tracing::warn!(error = %e, "failed to flush event bus");
        }
    }
    db.close().await;
    Ok(())
}
