//! In-process product cache backed by moka

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use moka::ops::compute::Op;

use crate::domain::aggregates::Product;
use crate::ports::{CacheError, ProductCache};

/// TTL-bounded product cache keyed by product id.
#[derive(Clone)]
pub struct MokaProductCache {
    inner: Cache<String, Product>,
}

impl MokaProductCache {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self { inner: Cache::builder().max_capacity(capacity).time_to_live(ttl).build() }
    }
}

#[async_trait]
impl ProductCache for MokaProductCache {
    async fn get(&self, id: &str) -> Result<Option<Product>, CacheError> {
        Ok(self.inner.get(id).await)
    }

    async fn put(&self, product: &Product) -> Result<(), CacheError> {
        self.inner
            .entry_by_ref(&product.id)
            .and_compute_with(|cached| {
                let op = match cached {
                    Some(entry) if entry.value().updated_at > product.updated_at => Op::Nop,
                    _ => Op::Put(product.clone()),
                };
                std::future::ready(op)
            })
            .await;
        Ok(())
    }

    async fn invalidate(&self, id: &str) -> Result<(), CacheError> {
        self.inner.invalidate(id).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn loafer() -> Product {
        let now = Utc::now();
        Product {
            id: "p1".into(), name: "Penny Loafer".into(), brand: "Bass".into(), category: "formal".into(),
            description: String::new(), price: Decimal::new(8900, 2), stock: 2,
            sizes: vec![41], colors: vec!["brown".into()], images: vec![], created_at: now, updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_put_get_invalidate() {
        let cache = MokaProductCache::new(10, Duration::from_secs(60));
        assert_eq!(cache.get("p1").await.unwrap(), None);
        cache.put(&loafer()).await.unwrap();
        assert_eq!(cache.get("p1").await.unwrap().map(|p| p.name), Some("Penny Loafer".to_string()));
        cache.invalidate("p1").await.unwrap();
        assert_eq!(cache.get("p1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_older_copy_does_not_replace_newer() {
        let cache = MokaProductCache::new(10, Duration::from_secs(60));
        let old = loafer();
        let mut new = loafer();
        new.price = Decimal::new(7900, 2);
        new.updated_at = old.updated_at + chrono::Duration::seconds(1);

        cache.put(&new).await.unwrap();
        cache.put(&old).await.unwrap();
        assert_eq!(cache.get("p1").await.unwrap().map(|p| p.price), Some(Decimal::new(7900, 2)));
    }
}
