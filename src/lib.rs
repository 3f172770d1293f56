//! ShoeShop Commerce Backend
//!
//! Accounts, product catalog, orders and transactional email behind a
//! single JSON/HTTP gateway.
//!
//! ## Features
//! - Order placement with snapshot pricing and advisory stock checks
//! - Order status machine with monotonic transitions
//! - Product catalog with read-through caching
//! - User registration and login with bcrypt password hashes
//! - Domain events on NATS, confirmation emails over SMTP

pub mod api;
pub mod application;
pub mod auth;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ports;

use thiserror::Error;

use crate::domain::aggregates::OrderStatus;

// =============================================================================
// Error Types
// =============================================================================

/// Failures surfaced by the application services.
///
/// Every variant carries a stable kind string (see [`ShopError::kind`]) so
/// callers can branch on the failure without parsing messages.
#[derive(Error, Debug)]
pub enum ShopError {
    #[error("invalid order: {0}")]
    InvalidOrder(String),

    #[error("user {0} does not exist")]
    ActorUnknown(String),

    #[error("product {0} does not exist")]
    ProductUnknown(String),

    #[error("insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: u32,
        available: i32,
    },

    #[error("cannot change order status from {from} to {to}")]
    BadTransition { from: OrderStatus, to: OrderStatus },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("order storage unavailable: {0}")]
    StoreUnavailable(String),

    #[error("upstream service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Phone number must start with '+'")]
    InvalidPhone,

    #[error("Shipping address must start with 'г.'")]
    InvalidAddress,

    #[error("email {0} is already registered")]
    EmailTaken(String),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("internal error: {0}")]
    Internal(String),
}

impl ShopError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidOrder(_) => "INVALID_ORDER",
            Self::ActorUnknown(_) => "ACTOR_UNKNOWN",
            Self::ProductUnknown(_) => "PRODUCT_UNKNOWN",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::BadTransition { .. } => "BAD_TRANSITION",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::InvalidPhone => "INVALID_PHONE",
            Self::InvalidAddress => "INVALID_ADDRESS",
            Self::EmailTaken(_) => "EMAIL_TAKEN",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound { entity, id: id.into() }
    }
}

pub type Result<T> = std::result::Result<T, ShopError>;

/// Failures reported by a persistence backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("conflicting write: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(db.message().to_string())
            }
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

/// Failure to hand an event to the bus.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("failed to encode event payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("event bus unavailable: {0}")]
    Transport(String),
}

/// Failure to deliver a transactional email.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("failed to build email: {0}")]
    Build(String),

    #[error("failed to send email: {0}")]
    Transport(String),
}
