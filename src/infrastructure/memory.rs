//! In-memory adapters
//!
//! Process-local stores and recording collaborators with switchable faults.
//! Used by the test suites; the binary never wires them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::aggregates::{NewOrder, NewUser, Order, OrderPatch, OrderStatus, Product, ProductFilter, User};
use crate::domain::events::DomainEvent;
use crate::ports::{
    AccountReader, CacheError, CatalogReader, EventPublisher, Notifier, OrderStore, ProductCache, ProductStore, UserStore,
};
use crate::{NotifyError, PublishError, StoreError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Switch that makes an adapter fail every call while set.
#[derive(Debug, Default)]
struct Fault(AtomicBool);

impl Fault {
    fn set(&self, on: bool) { self.0.store(on, Ordering::SeqCst) }

    fn check(&self) -> Result<(), StoreError> {
        if self.0.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store switched off".into()));
        }
        Ok(())
    }
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryProductStore {
    products: Mutex<HashMap<String, Product>>,
    fault: Fault,
}

impl MemoryProductStore {
    /// Insert or replace a product as-is.
    pub fn seed(&self, product: Product) {
        lock(&self.products).insert(product.id.clone(), product);
    }

    pub fn set_unavailable(&self, on: bool) { self.fault.set(on) }
}

#[async_trait]
impl CatalogReader for MemoryProductStore {
    async fn get_product(&self, id: &str) -> Result<Product, StoreError> {
        self.fault.check()?;
        lock(&self.products).get(id).cloned().ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn create(&self, product: Product) -> Result<Product, StoreError> {
        self.fault.check()?;
        let mut products = lock(&self.products);
        if products.contains_key(&product.id) {
            return Err(StoreError::Conflict(format!("product {} exists", product.id)));
        }
        products.insert(product.id.clone(), product.clone());
        Ok(product)
    }

    async fn update(&self, product: Product) -> Result<Product, StoreError> {
        self.fault.check()?;
        let mut products = lock(&self.products);
        let slot = products.get_mut(&product.id).ok_or(StoreError::NotFound)?;
        *slot = product.clone();
        Ok(product)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.fault.check()?;
        lock(&self.products).remove(id).map(|_| ()).ok_or(StoreError::NotFound)
    }

    async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, StoreError> {
        self.fault.check()?;
        let mut found: Vec<Product> = lock(&self.products).values().filter(|p| filter.matches(p)).cloned().collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }

    /// Name hits rank above description-only hits.
    async fn search(&self, query: &str) -> Result<Vec<Product>, StoreError> {
        self.fault.check()?;
        let needle = query.to_lowercase();
        let mut ranked: Vec<(u8, Product)> = lock(&self.products)
            .values()
            .filter_map(|p| {
                let rank = if p.name.to_lowercase().contains(&needle) {
                    2
                } else if p.description.to_lowercase().contains(&needle) {
                    1
                } else {
                    return None;
                };
                Some((rank, p.clone()))
            })
            .collect();
        ranked.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.id.cmp(&b.1.id)));
        Ok(ranked.into_iter().map(|(_, p)| p).collect())
    }
}

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Default)]
struct UserTable {
    users: HashMap<String, User>,
    last_id: u64,
}

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    table: Mutex<UserTable>,
    fault: Fault,
}

impl MemoryUserStore {
    pub fn set_unavailable(&self, on: bool) { self.fault.set(on) }
}

#[async_trait]
impl AccountReader for MemoryUserStore {
    async fn get_user(&self, id: &str) -> Result<User, StoreError> {
        self.fault.check()?;
        lock(&self.table).users.get(id).cloned().ok_or(StoreError::NotFound)
    }

    async fn attach_order(&self, user_id: &str, order_id: &str) -> Result<(), StoreError> {
        self.fault.check()?;
        let mut table = lock(&self.table);
        let user = table.users.get_mut(user_id).ok_or(StoreError::NotFound)?;
        user.order_ids.push(order_id.to_string());
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get_by_email(&self, email: &str) -> Result<User, StoreError> {
        self.fault.check()?;
        lock(&self.table).users.values().find(|u| u.email == email).cloned().ok_or(StoreError::NotFound)
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        self.fault.check()?;
        let mut table = lock(&self.table);
        if table.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!("email {} exists", user.email)));
        }
        table.last_id += 1;
        let user = user.into_user(table.last_id.to_string(), Utc::now());
        table.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, StoreError> {
        self.fault.check()?;
        let mut table = lock(&self.table);
        let stored = table.users.get_mut(&user.id).ok_or(StoreError::NotFound)?;
        stored.username = user.username;
        stored.first_name = user.first_name;
        stored.last_name = user.last_name;
        stored.phone = user.phone;
        stored.shipping_address = user.shipping_address;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.fault.check()?;
        lock(&self.table).users.remove(id).map(|_| ()).ok_or(StoreError::NotFound)
    }
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Default)]
struct OrderTable {
    orders: HashMap<String, Order>,
    last_created: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    table: Mutex<OrderTable>,
    fault: Fault,
}

impl MemoryOrderStore {
    pub fn set_unavailable(&self, on: bool) { self.fault.set(on) }

    pub fn len(&self) -> usize { lock(&self.table).orders.len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    /// Creation times are strictly increasing so newest-first listing is total.
    async fn create(&self, order: NewOrder) -> Result<Order, StoreError> {
        self.fault.check()?;
        let mut table = lock(&self.table);
        let mut now = Utc::now();
        if let Some(last) = table.last_created {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        table.last_created = Some(now);
        let order = order.into_order(Uuid::now_v7().to_string(), now);
        table.orders.insert(order.id.clone(), order.clone());
        Ok(order)
    }

    async fn get(&self, id: &str) -> Result<Order, StoreError> {
        self.fault.check()?;
        lock(&self.table).orders.get(id).cloned().ok_or(StoreError::NotFound)
    }

    async fn update(&self, id: &str, patch: &OrderPatch) -> Result<Order, StoreError> {
        self.fault.check()?;
        let mut table = lock(&self.table);
        let stored = table.orders.get_mut(id).ok_or(StoreError::NotFound)?;
        patch.apply(stored);
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn update_status(&self, id: &str, from: OrderStatus, to: OrderStatus) -> Result<Order, StoreError> {
        self.fault.check()?;
        let mut table = lock(&self.table);
        let stored = table.orders.get_mut(id).ok_or(StoreError::NotFound)?;
        if stored.status != from {
            return Err(StoreError::Conflict(format!("order {id} is {}, expected {from}", stored.status)));
        }
        stored.status = to;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Order>, StoreError> {
        self.fault.check()?;
        let mut orders: Vec<Order> = lock(&self.table).orders.values().filter(|o| o.user_id == user_id).cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.fault.check()?;
        lock(&self.table).orders.remove(id).map(|_| ()).ok_or(StoreError::NotFound)
    }
}

// =============================================================================
// Collaborators
// =============================================================================

/// Keeps every published event; can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<DomainEvent>>,
    failing: AtomicBool,
}

impl RecordingPublisher {
    pub fn set_failing(&self, on: bool) { self.failing.store(on, Ordering::SeqCst) }

    pub fn events(&self) -> Vec<DomainEvent> { lock(&self.events).clone() }

    pub fn subjects(&self) -> Vec<&'static str> { lock(&self.events).iter().map(DomainEvent::subject).collect() }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: &DomainEvent) -> Result<(), PublishError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PublishError::Transport("bus switched off".into()));
        }
        event.payload()?;
        lock(&self.events).push(event.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentMail {
    OrderConfirmation { to: String, order_id: String },
    OrderStatusUpdate { to: String, order_id: String, status: OrderStatus },
    Registration { to: String },
    PasswordReset { to: String },
}

/// Keeps every delivery attempt, including failed ones.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    attempts: Mutex<Vec<SentMail>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn set_failing(&self, on: bool) { self.failing.store(on, Ordering::SeqCst) }

    pub fn sent(&self) -> Vec<SentMail> { lock(&self.attempts).clone() }

    fn record(&self, mail: SentMail) -> Result<(), NotifyError> {
        lock(&self.attempts).push(mail);
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Transport("mail relay switched off".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_order_confirmation(&self, to: &str, order: &Order) -> Result<(), NotifyError> {
        self.record(SentMail::OrderConfirmation { to: to.to_string(), order_id: order.id.clone() })
    }

    async fn send_order_status_update(&self, to: &str, order: &Order) -> Result<(), NotifyError> {
        self.record(SentMail::OrderStatusUpdate { to: to.to_string(), order_id: order.id.clone(), status: order.status })
    }

    async fn send_registration_confirmation(&self, user: &User) -> Result<(), NotifyError> {
        self.record(SentMail::Registration { to: user.email.clone() })
    }

    async fn send_password_reset(&self, user: &User, _token: &str) -> Result<(), NotifyError> {
        self.record(SentMail::PasswordReset { to: user.email.clone() })
    }
}

/// Cache that is always down.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableCache;

#[async_trait]
impl ProductCache for UnavailableCache {
    async fn get(&self, _id: &str) -> Result<Option<Product>, CacheError> { Err(CacheError("cache offline".into())) }
    async fn put(&self, _product: &Product) -> Result<(), CacheError> { Err(CacheError("cache offline".into())) }
    async fn invalidate(&self, _id: &str) -> Result<(), CacheError> { Err(CacheError("cache offline".into())) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_status_compare_and_set() {
        let store = MemoryOrderStore::default();
        let order = store.create(NewOrder::pending("u1", vec![], "г.Омск", "card")).await.unwrap();
        store.update_status(&order.id, OrderStatus::Pending, OrderStatus::Paid).await.unwrap();
        let err = store.update_status(&order.id, OrderStatus::Pending, OrderStatus::Canceled).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.get(&order.id).await.unwrap().status, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn test_patch_leaves_status_alone() {
        let store = MemoryOrderStore::default();
        let order = store.create(NewOrder::pending("u1", vec![], "г.Омск", "card")).await.unwrap();
        store.update_status(&order.id, OrderStatus::Pending, OrderStatus::Paid).await.unwrap();
        let patch = OrderPatch { payment_method: Some("cash".into()), ..Default::default() };
        let updated = store.update(&order.id, &patch).await.unwrap();
        assert_eq!(updated.status, OrderStatus::Paid);
        assert_eq!(updated.payment_method, "cash");
        assert_eq!(updated.shipping_address, "г.Омск");
        assert!(matches!(store.update("missing", &patch).await, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn test_creation_times_strictly_increase() {
        let store = MemoryOrderStore::default();
        let mut previous = None;
        for _ in 0..20 {
            let order = store.create(NewOrder::pending("u1", vec![], "г.Омск", "card")).await.unwrap();
            if let Some(prev) = previous {
                assert!(order.created_at > prev);
            }
            previous = Some(order.created_at);
        }
    }

    #[tokio::test]
    async fn test_search_ranks_name_hits_first() {
        let store = MemoryProductStore::default();
        let now = Utc::now();
        let mut by_description = Product {
            id: "a".into(), name: "Trail".into(), brand: "Salomon".into(), category: "hiking".into(),
            description: "waterproof runner".into(), price: Decimal::new(100, 0), stock: 1,
            sizes: vec![], colors: vec![], images: vec![], created_at: now, updated_at: now,
        };
        store.seed(by_description.clone());
        by_description.id = "b".into();
        by_description.name = "Runner X".into();
        by_description.description = String::new();
        store.seed(by_description);

        let found = store.search("runner").await.unwrap();
        assert_eq!(found.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_unavailable_switch() {
        let store = MemoryUserStore::default();
        store.set_unavailable(true);
        assert!(matches!(store.get_user("1").await, Err(StoreError::Unavailable(_))));
    }
}
