//! Billing-entity store.

use std::sync::Arc;

use pedidoflex_core::{BillingEntity, EntityId};
use tokio::sync::RwLock;
use tokio::sync::broadcast::error::RecvError;

use super::{StoreError, decode, encode};
use crate::persist::{ChangeEvent, SharedStore, collections};

/// The registered billing entities (CNPJ records).
///
/// Entities are created and edited through upsert only; there is no
/// in-band delete. Which entities a given user may see is derived by
/// [`crate::services::visibility`], never here.
#[derive(Clone)]
pub struct BillingEntityStore {
    entities: Arc<RwLock<Vec<BillingEntity>>>,
    persist: SharedStore,
}

impl BillingEntityStore {
    /// Create an empty store over the given backend.
    #[must_use]
    pub fn new(persist: SharedStore) -> Self {
        Self {
            entities: Arc::new(RwLock::new(Vec::new())),
            persist,
        }
    }

    /// Load entities from the backend, replacing in-memory state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or a record cannot be decoded.
    pub async fn hydrate(&self) -> Result<usize, StoreError> {
        let records = self.persist.load_all(collections::ENTITIES).await?;
        let mut entities = Vec::with_capacity(records.len());
        for record in records {
            entities.push(decode::<BillingEntity>(collections::ENTITIES, record)?);
        }
        let count = entities.len();
        *self.entities.write().await = entities;
        Ok(count)
    }

    /// All entities, in display order.
    pub async fn all(&self) -> Vec<BillingEntity> {
        self.entities.read().await.clone()
    }

    /// Look up an entity by id.
    pub async fn get(&self, id: &EntityId) -> Option<BillingEntity> {
        self.entities
            .read()
            .await
            .iter()
            .find(|e| &e.id == id)
            .cloned()
    }

    /// Insert or replace an entity.
    ///
    /// Replacement keeps the entity's position; an unknown id is inserted
    /// at the front.
    ///
    /// # Errors
    ///
    /// Returns an error if the write-through to the backend fails.
    pub async fn upsert(&self, entity: BillingEntity) -> Result<(), StoreError> {
        let record = encode(collections::ENTITIES, &entity)?;
        let mut entities = self.entities.write().await;
        self.persist
            .save(collections::ENTITIES, entity.id.as_str(), record)
            .await?;
        match entities.iter_mut().find(|e| e.id == entity.id) {
            Some(slot) => *slot = entity,
            None => entities.insert(0, entity),
        }
        Ok(())
    }

    /// Start merging remote change events, if the backend pushes them.
    pub fn start_sync(&self) {
        let Some(mut rx) = self.persist.subscribe(collections::ENTITIES) else {
            return;
        };
        let store = self.clone();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => store.apply_remote(event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "entity change feed lagged, rehydrating");
                        if let Err(e) = store.hydrate().await {
                            tracing::error!(error = %e, "entity rehydrate failed");
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }

    async fn apply_remote(&self, event: ChangeEvent) {
        let mut entities = self.entities.write().await;
        match event.record {
            Some(record) => match decode::<BillingEntity>(collections::ENTITIES, record) {
                Ok(entity) => match entities.iter_mut().find(|e| e.id == entity.id) {
                    Some(slot) => *slot = entity,
                    None => entities.insert(0, entity),
                },
                Err(e) => tracing::warn!(id = %event.id, error = %e, "ignoring bad entity event"),
            },
            None => entities.retain(|e| e.id.as_str() != event.id),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pedidoflex_core::TaxId;

    use super::*;
    use crate::persist::MemoryStore;

    fn entity(id: &str, name: &str) -> BillingEntity {
        BillingEntity {
            id: EntityId::new(id),
            name: name.to_owned(),
            legal_name: None,
            tax_number: TaxId::parse("11.222.333/0001-81").unwrap(),
            responsible_cpf: None,
            distributor: "Distribuidora Norte".to_owned(),
            contact_email: None,
            phone: None,
            address: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let store = BillingEntityStore::new(Arc::new(MemoryStore::new()));
        store.upsert(entity("c1", "Lanches Mirante")).await.unwrap();
        store.upsert(entity("c2", "Empório Niklaus")).await.unwrap();

        assert_eq!(store.all().await.len(), 2);
        let found = store.get(&EntityId::new("c1")).await.unwrap();
        assert_eq!(found.name, "Lanches Mirante");

        store
            .upsert(entity("c1", "Lanches Mirante LTDA"))
            .await
            .unwrap();
        let found = store.get(&EntityId::new("c1")).await.unwrap();
        assert_eq!(found.name, "Lanches Mirante LTDA");
        assert_eq!(store.all().await.len(), 2);
    }
}
