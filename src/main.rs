//! ShoeShop - order placement, catalog and accounts behind one gateway

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shoeshop::api::{self, AppState, GatewayConfig};
use shoeshop::application::{AccountService, CatalogService, OrderService};
use shoeshop::auth::TokenIssuer;
use shoeshop::config::Config;
use shoeshop::infrastructure::cache::MokaProductCache;
use shoeshop::infrastructure::nats::{DisabledPublisher, NatsPublisher};
use shoeshop::infrastructure::postgres::{self, PgOrderStore, PgProductStore, PgUserStore};
use shoeshop::infrastructure::smtp::SmtpNotifier;
use shoeshop::ports::{EventPublisher, Notifier, ProductCache};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "shoeshop=info,tower_http=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let db = postgres::connect(&config.database_url, config.database_max_connections)
        .await
        .context("cannot reach the database")?;

    let nats = match async_nats::connect(&config.nats_url).await {
        Ok(client) => Some(NatsPublisher::new(client)),
        Err(e) => {
            tracing::warn!(url = %config.nats_url, error = %e, "event bus unreachable, events disabled");
            None
        }
    };
    let publisher: Arc<dyn EventPublisher> = match &nats {
        Some(nats) => Arc::new(nats.clone()),
        None => Arc::new(DisabledPublisher),
    };
    let notifier: Arc<dyn Notifier> = Arc::new(SmtpNotifier::new(&config.smtp)?);
    let cache: Arc<dyn ProductCache> = Arc::new(MokaProductCache::new(config.cache_capacity, config.cache_ttl));

    let users = Arc::new(PgUserStore::new(db.clone()));
    let catalog = Arc::new(CatalogService::new(Arc::new(PgProductStore::new(db.clone())), Some(cache), publisher.clone()));
    let accounts = Arc::new(AccountService::new(
        users.clone(),
        notifier.clone(),
        TokenIssuer::new(config.jwt_secret.clone(), config.jwt_expiry_hours),
        config.bcrypt_cost,
    ));
    let orders = Arc::new(OrderService::new(Arc::new(PgOrderStore::new(db.clone())), catalog.clone(), users, publisher, notifier));

    let gateway = GatewayConfig {
        cors_origin: HeaderValue::from_str(&config.cors_origin).context("CORS_ORIGIN is not a valid header value")?,
        request_timeout: config.request_timeout,
    };
    let app = api::router(AppState { accounts, catalog, orders }, gateway);

    let listener = TcpListener::bind(("0.0.0.0", config.port)).await.with_context(|| format!("cannot bind port {}", config.port))?;
    tracing::info!("🚀 ShoeShop listening on 0.0.0.0:{}", config.port);

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                stop_rx.await.ok();
            })
            .await
    });

    tokio::select! {
        result = &mut server => {
            result??;
            return Ok(());
        }
        _ = shutdown_signal() => {}
    }

    tracing::info!(grace_secs = config.shutdown_grace.as_secs(), "shutting down, draining requests");
    let _ = stop_tx.send(());
    match tokio::time::timeout(config.shutdown_grace, &mut server).await {
        Ok(result) => result??,
        Err(_) => {
            tracing::warn!("grace period elapsed, aborting in-flight requests");
            server.abort();
        }
    }

    if let Some(nats) = &nats {
        if let Err(e) = nats.flush().await {
            tracing::warn!(error = %e, "failed to flush event bus");
        }
    }
    db.close().await;
    tracing::info!("✅ Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
