//! Catalog service
//!
//! Product CRUD with a read-through cache. Cache failures never fail a
//! request; reads fall back to the store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::aggregates::{Product, ProductFilter, ProductInput};
use crate::domain::events::{DomainEvent, ProductEvent};
use crate::ports::{CatalogReader, EventPublisher, ProductCache, ProductStore};
use crate::{Result, ShopError, StoreError};

pub struct CatalogService {
    store: Arc<dyn ProductStore>,
    cache: Option<Arc<dyn ProductCache>>,
    publisher: Arc<dyn EventPublisher>,
    /// Bumped after every product write; a cache miss only fills the cache
    /// if no write landed while it was reading the store.
    writes: AtomicU64,
}

impl CatalogService {
    pub fn new(store: Arc<dyn ProductStore>, cache: Option<Arc<dyn ProductCache>>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self { store, cache, publisher, writes: AtomicU64::new(0) }
    }

    pub async fn create_product(&self, input: ProductInput) -> Result<Product> {
        input.validate().map_err(|e| ShopError::InvalidInput(e.to_string()))?;
        let product = input.into_product(Uuid::now_v7().to_string(), Utc::now());
        let product = self.store.create(product).await.map_err(|e| ShopError::StoreUnavailable(e.to_string()))?;
        info!(product_id = %product.id, name = %product.name, "product created");

        self.remember(&product).await;
        self.announce(DomainEvent::Product(ProductEvent::Created(product.clone()))).await;
        Ok(product)
    }

    pub async fn get_product(&self, id: &str) -> Result<Product> {
        self.lookup(id).await.map_err(|e| product_store_error(id, e))
    }

    /// Replace the editable attributes of a product. `createdAt` is kept.
    pub async fn update_product(&self, id: &str, input: ProductInput) -> Result<Product> {
        input.validate().map_err(|e| ShopError::InvalidInput(e.to_string()))?;
        let mut product = self.store.get_product(id).await.map_err(|e| product_store_error(id, e))?;
        product.apply(input);
        product.updated_at = Utc::now();

        let product = self.store.update(product).await.map_err(|e| product_store_error(id, e))?;
        info!(product_id = %product.id, "product updated");

        self.writes.fetch_add(1, Ordering::AcqRel);
        self.forget(id).await;
        self.remember(&product).await;
        self.announce(DomainEvent::Product(ProductEvent::Updated(product.clone()))).await;
        Ok(product)
    }

    pub async fn delete_product(&self, id: &str) -> Result<()> {
        self.store.delete(id).await.map_err(|e| product_store_error(id, e))?;
        info!(product_id = %id, "product deleted");

        self.writes.fetch_add(1, Ordering::AcqRel);
        self.forget(id).await;
        self.announce(DomainEvent::Product(ProductEvent::Deleted { product_id: id.to_string() })).await;
        Ok(())
    }

    /// Products matching every set field of the filter; an empty filter lists all.
    pub async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        self.store.list(filter).await.map_err(|e| ShopError::StoreUnavailable(e.to_string()))
    }

    pub async fn search_products(&self, query: &str) -> Result<Vec<Product>> {
        let query = query.trim();
        if query.is_empty() {
            return self.list_products(&ProductFilter::default()).await;
        }
        self.store.search(query).await.map_err(|e| ShopError::StoreUnavailable(e.to_string()))
    }

    async fn lookup(&self, id: &str) -> std::result::Result<Product, StoreError> {
        if let Some(cache) = &self.cache {
            match cache.get(id).await {
                Ok(Some(product)) => return Ok(product),
                Ok(None) => {}
                Err(e) => warn!(product_id = %id, error = %e, "product cache read failed"),
            }
        }
        let seen = self.writes.load(Ordering::Acquire);
        let product = self.store.get_product(id).await?;
        if self.writes.load(Ordering::Acquire) == seen {
            self.remember(&product).await;
        }
        Ok(product)
    }

    async fn remember(&self, product: &Product) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(product).await {
                warn!(product_id = %product.id, error = %e, "product cache write failed");
            }
        }
    }

    async fn forget(&self, id: &str) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.invalidate(id).await {
                warn!(product_id = %id, error = %e, "product cache invalidation failed");
            }
        }
    }

    async fn announce(&self, event: DomainEvent) {
        if let Err(e) = self.publisher.publish(&event).await {
            warn!(subject = event.subject(), product_id = event.entity_id(), error = %e, "failed to publish product event");
        }
    }
}

/// Lets the order orchestrator price through the cache.
#[async_trait]
impl CatalogReader for CatalogService {
    async fn get_product(&self, id: &str) -> std::result::Result<Product, StoreError> {
        self.lookup(id).await
    }
}

fn product_store_error(id: &str, e: StoreError) -> ShopError {
    match e {
        StoreError::NotFound => ShopError::not_found("product", id),
        other => ShopError::StoreUnavailable(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory::{MemoryProductStore, RecordingPublisher, UnavailableCache};
    use crate::infrastructure::cache::MokaProductCache;
    use rust_decimal::Decimal;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::oneshot;

    fn boot(name: &str) -> ProductInput {
        ProductInput { name: name.into(), brand: "Timberland".into(), category: "boots".into(), price: Decimal::new(15000, 2), stock: 3, ..Default::default() }
    }

    #[tokio::test]
    async fn test_update_invalidates_cached_copy() {
        let store = Arc::new(MemoryProductStore::default());
        let cache = Arc::new(MokaProductCache::new(100, Duration::from_secs(60)));
        let publisher = Arc::new(RecordingPublisher::default());
        let catalog = CatalogService::new(store, Some(cache), publisher.clone());

        let created = catalog.create_product(boot("Classic 6-inch")).await.unwrap();
        assert_eq!(catalog.get_product(&created.id).await.unwrap().stock, 3);

        let mut change = boot("Classic 6-inch");
        change.stock = 0;
        let updated = catalog.update_product(&created.id, change).await.unwrap();
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(catalog.get_product(&created.id).await.unwrap().stock, 0);
        assert_eq!(publisher.subjects(), vec!["product.created", "product.updated"]);
    }

    #[tokio::test]
    async fn test_broken_cache_falls_back_to_store() {
        let store = Arc::new(MemoryProductStore::default());
        let catalog = CatalogService::new(store, Some(Arc::new(UnavailableCache)), Arc::new(RecordingPublisher::default()));
        let created = catalog.create_product(boot("Premium")).await.unwrap();
        assert_eq!(catalog.get_product(&created.id).await.unwrap().name, "Premium");
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let catalog = CatalogService::new(Arc::new(MemoryProductStore::default()), None, Arc::new(RecordingPublisher::default()));
        let created = catalog.create_product(boot("Chukka")).await.unwrap();
        catalog.delete_product(&created.id).await.unwrap();
        assert_eq!(catalog.get_product(&created.id).await.unwrap_err().kind(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_rejects_negative_stock() {
        let catalog = CatalogService::new(Arc::new(MemoryProductStore::default()), None, Arc::new(RecordingPublisher::default()));
        let mut input = boot("Broken");
        input.stock = -1;
        assert_eq!(catalog.create_product(input).await.unwrap_err().kind(), "INVALID_INPUT");
    }

    /// Parks the first `get_product` after it has read the row, until released.
    struct GatedStore {
        inner: MemoryProductStore,
        gate: Mutex<Option<(oneshot::Sender<()>, oneshot::Receiver<()>)>>,
    }

    #[async_trait]
    impl CatalogReader for GatedStore {
        async fn get_product(&self, id: &str) -> std::result::Result<Product, StoreError> {
            let product = self.inner.get_product(id).await?;
            let gate = self.gate.lock().unwrap().take();
            if let Some((entered, release)) = gate {
                let _ = entered.send(());
                let _ = release.await;
            }
            Ok(product)
        }
    }

    #[async_trait]
    impl ProductStore for GatedStore {
        async fn create(&self, product: Product) -> std::result::Result<Product, StoreError> { self.inner.create(product).await }
        async fn update(&self, product: Product) -> std::result::Result<Product, StoreError> { self.inner.update(product).await }
        async fn delete(&self, id: &str) -> std::result::Result<(), StoreError> { self.inner.delete(id).await }
        async fn list(&self, filter: &ProductFilter) -> std::result::Result<Vec<Product>, StoreError> { self.inner.list(filter).await }
        async fn search(&self, query: &str) -> std::result::Result<Vec<Product>, StoreError> { self.inner.search(query).await }
    }

    /// A catalog whose first store read stalls, plus the handles to drive it.
    fn stalled_catalog() -> (Arc<CatalogService>, oneshot::Receiver<()>, oneshot::Sender<()>) {
        let inner = MemoryProductStore::default();
        inner.seed(boot("Chelsea").into_product("p1".into(), Utc::now()));
        let (entered_tx, entered_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        let store = Arc::new(GatedStore { inner, gate: Mutex::new(Some((entered_tx, release_rx))) });
        let cache = Arc::new(MokaProductCache::new(100, Duration::from_secs(60)));
        let catalog = Arc::new(CatalogService::new(store, Some(cache), Arc::new(RecordingPublisher::default())));
        (catalog, entered_rx, release_tx)
    }

    #[tokio::test]
    async fn test_slow_miss_does_not_cache_stale_price() {
        let (catalog, entered, release) = stalled_catalog();
        let reader = tokio::spawn({
            let catalog = catalog.clone();
            async move { catalog.get_product("p1").await }
        });
        entered.await.unwrap();

        let mut change = boot("Chelsea");
        change.price = Decimal::new(9900, 2);
        catalog.update_product("p1", change).await.unwrap();
        release.send(()).unwrap();

        assert_eq!(reader.await.unwrap().unwrap().price, Decimal::new(15000, 2));
        assert_eq!(catalog.get_product("p1").await.unwrap().price, Decimal::new(9900, 2));
    }

    #[tokio::test]
    async fn test_slow_miss_does_not_resurrect_deleted_product() {
        let (catalog, entered, release) = stalled_catalog();
        let reader = tokio::spawn({
            let catalog = catalog.clone();
            async move { catalog.get_product("p1").await }
        });
        entered.await.unwrap();

        catalog.delete_product("p1").await.unwrap();
        release.send(()).unwrap();

        assert!(reader.await.unwrap().is_ok());
        assert_eq!(catalog.get_product("p1").await.unwrap_err().kind(), "NOT_FOUND");
    }
}
