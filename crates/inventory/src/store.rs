//! Product storage with per-product exclusive locks.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::ProductId;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::error::{InventoryError, Result};
use crate::product::Product;

/// Persistence seam for products.
///
/// `lock` is the `loadForUpdate` half of the storage contract: it acquires
/// the product's exclusive lock and hands back a guard through which the
/// read-check-write sequence runs. Writes through the guard are durable the
/// moment the guard is dropped. This closes the race between the fail-fast
/// availability check and the reservation, and between concurrent orders
/// competing for the same product.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Adds a product. Replaces any existing record with the same key.
    async fn insert(&self, product: Product) -> Result<()>;

    /// Reads a product without locking it. The returned value is a snapshot
    /// and may be stale by the time it is inspected.
    async fn get(&self, product_id: &ProductId) -> Result<Option<Product>>;

    /// Acquires the product's exclusive lock for a read-check-write
    /// sequence. Fails if the product does not exist.
    async fn lock(&self, product_id: &ProductId) -> Result<OwnedMutexGuard<Product>>;
}

/// In-memory product store for tests and the demo binary.
#[derive(Clone, Default)]
pub struct InMemoryProductStore {
    products: Arc<RwLock<HashMap<ProductId, Arc<Mutex<Product>>>>>,
}

impl InMemoryProductStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of products in the store.
    pub async fn product_count(&self) -> usize {
        self.products.read().await.len()
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn insert(&self, product: Product) -> Result<()> {
        self.products
            .write()
            .await
            .insert(product.product_id.clone(), Arc::new(Mutex::new(product)));
        Ok(())
    }

    async fn get(&self, product_id: &ProductId) -> Result<Option<Product>> {
        let slot = {
            let products = self.products.read().await;
            products.get(product_id).cloned()
        };
        match slot {
            Some(slot) => Ok(Some(slot.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn lock(&self, product_id: &ProductId) -> Result<OwnedMutexGuard<Product>> {
        let slot = {
            let products = self.products.read().await;
            products.get(product_id).cloned()
        };
        match slot {
            Some(slot) => Ok(slot.lock_owned().await),
            None => Err(InventoryError::ProductNotFound(product_id.clone())),
        }
    }
}
