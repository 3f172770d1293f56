//! Service configuration loaded from the environment

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from_email: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    pub database_max_connections: u32,
    pub nats_url: String,
    /// Gateway port
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    /// End-to-end deadline for one gateway request
    pub request_timeout: Duration,
    /// How long in-flight requests may drain after a shutdown signal
    pub shutdown_grace: Duration,
    pub cache_ttl: Duration,
    pub cache_capacity: u64,
    pub bcrypt_cost: u32,
    pub cors_origin: String,
    pub smtp: SmtpConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| var(name).ok_or(ConfigError::Missing(name));
        let or = |name: &str, default: &str| var(name).unwrap_or_else(|| default.to_string());

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database_max_connections: number("DATABASE_MAX_CONNECTIONS", or("DATABASE_MAX_CONNECTIONS", "10"))?,
            nats_url: or("NATS_URL", "nats://localhost:4222"),
            port: number("PORT", or("PORT", "8080"))?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_expiry_hours: number("JWT_EXPIRY_HOURS", or("JWT_EXPIRY_HOURS", "24"))?,
            request_timeout: Duration::from_secs(number("REQUEST_TIMEOUT_SECS", or("REQUEST_TIMEOUT_SECS", "5"))?),
            shutdown_grace: Duration::from_secs(number("SHUTDOWN_GRACE_SECS", or("SHUTDOWN_GRACE_SECS", "10"))?),
            cache_ttl: Duration::from_secs(number("CACHE_TTL_SECS", or("CACHE_TTL_SECS", "3600"))?),
            cache_capacity: number("CACHE_CAPACITY", or("CACHE_CAPACITY", "10000"))?,
            bcrypt_cost: number("BCRYPT_COST", or("BCRYPT_COST", "12"))?,
            cors_origin: or("CORS_ORIGIN", "http://localhost:3000"),
            smtp: SmtpConfig {
                host: required("SMTP_HOST")?,
                port: number("SMTP_PORT", required("SMTP_PORT")?)?,
                user: required("SMTP_USER")?,
                pass: required("SMTP_PASS")?,
                from_email: required("FROM_EMAIL")?,
            },
        })
    }
}

fn number<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid { name, value })
}
