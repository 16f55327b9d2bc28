//! Product catalog store.

use std::sync::Arc;

use pedidoflex_core::{Product, ProductId};
use tokio::sync::RwLock;
use tokio::sync::broadcast::error::RecvError;

use super::{StoreError, decode, encode};
use crate::persist::{ChangeEvent, SharedStore, collections};

/// The shared product catalog backing browsing and search.
///
/// Upserts preserve the position of existing products; new products are
/// inserted most-recent-first.
#[derive(Clone)]
pub struct CatalogStore {
    products: Arc<RwLock<Vec<Product>>>,
    persist: SharedStore,
}

impl CatalogStore {
    /// Create an empty store over the given backend.
    #[must_use]
    pub fn new(persist: SharedStore) -> Self {
        Self {
            products: Arc::new(RwLock::new(Vec::new())),
            persist,
        }
    }

    /// Load the catalog from the backend, replacing in-memory state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or a record cannot be decoded.
    pub async fn hydrate(&self) -> Result<usize, StoreError> {
        let records = self.persist.load_all(collections::PRODUCTS).await?;
        let mut products = Vec::with_capacity(records.len());
        for record in records {
            products.push(decode::<Product>(collections::PRODUCTS, record)?);
        }
        let count = products.len();
        *self.products.write().await = products;
        Ok(count)
    }

    /// All products, in display order.
    pub async fn all(&self) -> Vec<Product> {
        self.products.read().await.clone()
    }

    /// Look up a product by id.
    pub async fn get(&self, id: &ProductId) -> Option<Product> {
        self.products
            .read()
            .await
            .iter()
            .find(|p| &p.id == id)
            .cloned()
    }

    /// Case-insensitive substring search on the product name.
    ///
    /// An empty (or whitespace-only) term matches everything.
    pub async fn search(&self, term: &str) -> Vec<Product> {
        let needle = term.trim().to_lowercase();
        let products = self.products.read().await;
        if needle.is_empty() {
            return products.clone();
        }
        products
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    /// Insert or replace a product.
    ///
    /// Replacement keeps the product's position; an unknown id is inserted
    /// at the front.
    ///
    /// # Errors
    ///
    /// Returns an error if the write-through to the backend fails.
    pub async fn upsert(&self, product: Product) -> Result<(), StoreError> {
        let record = encode(collections::PRODUCTS, &product)?;
        let mut products = self.products.write().await;
        self.persist
            .save(collections::PRODUCTS, product.id.as_str(), record)
            .await?;
        match products.iter_mut().find(|p| p.id == product.id) {
            Some(slot) => *slot = product,
            None => products.insert(0, product),
        }
        Ok(())
    }

    /// Apply upserts one at a time, in sequence order.
    ///
    /// Later entries win on id collision within the same batch.
    ///
    /// # Errors
    ///
    /// Returns the first backend failure; earlier entries in the batch
    /// remain applied.
    pub async fn bulk_upsert(&self, products: Vec<Product>) -> Result<usize, StoreError> {
        let count = products.len();
        for product in products {
            self.upsert(product).await?;
        }
        Ok(count)
    }

    /// Start merging remote change events, if the backend pushes them.
    pub fn start_sync(&self) {
        let Some(mut rx) = self.persist.subscribe(collections::PRODUCTS) else {
            return;
        };
        let store = self.clone();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => store.apply_remote(event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "catalog change feed lagged, rehydrating");
                        if let Err(e) = store.hydrate().await {
                            tracing::error!(error = %e, "catalog rehydrate failed");
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }

    /// Merge one remote change, last-writer-wins by id.
    async fn apply_remote(&self, event: ChangeEvent) {
        let mut products = self.products.write().await;
        match event.record {
            Some(record) => match decode::<Product>(collections::PRODUCTS, record) {
                Ok(product) => match products.iter_mut().find(|p| p.id == product.id) {
                    Some(slot) => *slot = product,
                    None => products.insert(0, product),
                },
                Err(e) => tracing::warn!(id = %event.id, error = %e, "ignoring bad catalog event"),
            },
            None => products.retain(|p| p.id.as_str() != event.id),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pedidoflex_core::Money;
    use rust_decimal::Decimal;

    use super::*;
    use crate::persist::MemoryStore;

    fn product(id: &str, name: &str, cents: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_owned(),
            unit_price: Money::brl(Decimal::new(cents, 2)),
            stock: 10,
            image_url: String::new(),
            category: "Bebidas".to_owned(),
        }
    }

    fn store() -> CatalogStore {
        CatalogStore::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_upsert_new_goes_first_replace_stays_put() {
        let catalog = store();
        catalog.upsert(product("1", "Suco", 1250)).await.unwrap();
        catalog.upsert(product("2", "Granola", 2200)).await.unwrap();

        let names: Vec<_> = catalog.all().await.into_iter().map(|p| p.name).collect();
        assert_eq!(names, ["Granola", "Suco"]);

        catalog
            .upsert(product("1", "Suco Integral", 1300))
            .await
            .unwrap();
        let names: Vec<_> = catalog.all().await.into_iter().map(|p| p.name).collect();
        assert_eq!(names, ["Granola", "Suco Integral"]);
    }

    #[tokio::test]
    async fn test_bulk_upsert_last_entry_wins() {
        let catalog = store();
        catalog.upsert(product("1", "Suco", 500)).await.unwrap();

        catalog
            .bulk_upsert(vec![
                product("1", "Suco", 999),
                product("1", "Suco", 750),
            ])
            .await
            .unwrap();

        let all = catalog.all().await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].unit_price.amount, Decimal::new(750, 2));
    }

    #[tokio::test]
    async fn test_search() {
        let catalog = store();
        catalog.upsert(product("1", "Suco Natural", 1250)).await.unwrap();
        catalog.upsert(product("2", "Granola", 2200)).await.unwrap();

        assert_eq!(catalog.search("suco").await.len(), 1);
        assert_eq!(catalog.search("NATURAL").await.len(), 1);
        assert_eq!(catalog.search("").await.len(), 2);
        assert_eq!(catalog.search("  ").await.len(), 2);
        assert!(catalog.search("picanha").await.is_empty());
    }

    #[tokio::test]
    async fn test_hydrate_roundtrip() {
        let persist: SharedStore = Arc::new(MemoryStore::new());
        let catalog = CatalogStore::new(Arc::clone(&persist));
        catalog.upsert(product("1", "Suco", 1250)).await.unwrap();

        let rehydrated = CatalogStore::new(persist);
        assert_eq!(rehydrated.hydrate().await.unwrap(), 1);
        assert_eq!(rehydrated.all().await.len(), 1);
    }
}
