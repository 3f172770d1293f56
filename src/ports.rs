//! Capability traits at the service seams.
//!
//! The order orchestrator only sees the narrow reader/writer capabilities it
//! needs; the catalog and account services own the full store traits.
//! Implementations live in [`crate::infrastructure`].

use async_trait::async_trait;

use crate::domain::aggregates::{NewOrder, NewUser, Order, OrderPatch, OrderStatus, Product, ProductFilter, User};
use crate::domain::events::DomainEvent;
use crate::{NotifyError, PublishError, StoreError};

/// Price and stock lookups against the catalog.
#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// Current price and stock of one product, `StoreError::NotFound` if absent.
    async fn get_product(&self, id: &str) -> Result<Product, StoreError>;
}

#[async_trait]
pub trait ProductStore: CatalogReader {
    async fn create(&self, product: Product) -> Result<Product, StoreError>;
    async fn update(&self, product: Product) -> Result<Product, StoreError>;
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
    async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, StoreError>;
    /// Free-text search, best match first.
    async fn search(&self, query: &str) -> Result<Vec<Product>, StoreError>;
}

/// Read view of accounts, plus recording which orders a user owns.
#[async_trait]
pub trait AccountReader: Send + Sync {
    async fn get_user(&self, id: &str) -> Result<User, StoreError>;
    async fn attach_order(&self, user_id: &str, order_id: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait UserStore: AccountReader {
    async fn get_by_email(&self, email: &str) -> Result<User, StoreError>;
    /// Issues the next sequential id. `StoreError::Conflict` if the email is taken.
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;
    /// Writes the owner-editable profile fields only.
    async fn update(&self, user: User) -> Result<User, StoreError>;
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Assigns the id and sets both timestamps.
    async fn create(&self, order: NewOrder) -> Result<Order, StoreError>;
    async fn get(&self, id: &str) -> Result<Order, StoreError>;
    /// Writes the patched columns and `updated_at`. Status, items, owner and
    /// total are never touched here.
    async fn update(&self, id: &str, patch: &OrderPatch) -> Result<Order, StoreError>;
    /// Compare-and-set on the current status. `StoreError::Conflict` when the
    /// stored status is no longer `from`.
    async fn update_status(&self, id: &str, from: OrderStatus, to: OrderStatus) -> Result<Order, StoreError>;
    /// Orders of one user, newest first.
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Order>, StoreError>;
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

/// Fire-and-forget publication of domain events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &DomainEvent) -> Result<(), PublishError>;
}

/// Transactional email.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_order_confirmation(&self, to: &str, order: &Order) -> Result<(), NotifyError>;
    async fn send_order_status_update(&self, to: &str, order: &Order) -> Result<(), NotifyError>;
    async fn send_registration_confirmation(&self, user: &User) -> Result<(), NotifyError>;
    async fn send_password_reset(&self, user: &User, token: &str) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
#[error("product cache unavailable: {0}")]
pub struct CacheError(pub String);

/// Read-through product cache in front of a [`ProductStore`].
#[async_trait]
pub trait ProductCache: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<Product>, CacheError>;
    /// Keeps a cached copy whose `updated_at` is newer than `product`'s.
    async fn put(&self, product: &Product) -> Result<(), CacheError>;
    async fn invalidate(&self, id: &str) -> Result<(), CacheError>;
}
