//! In-process backend with a live change feed.
//!
//! Plays the role of the hosted document store: every `save`/`delete`
//! fans out a [`ChangeEvent`] to subscribers on that collection. Also the
//! backend used by the test suites.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::{ChangeEvent, DocumentStore, PersistError, position_of};

/// Capacity of each collection's change channel. A lagging subscriber
/// resyncs via `load_all`, so a modest buffer is enough.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// In-memory backend with push-based change events.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<serde_json::Value>>>,
    channels: Mutex<HashMap<String, broadcast::Sender<ChangeEvent>>>,
}

impl MemoryStore {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a collection's contents without emitting change events.
    ///
    /// Used by tests and seeding to establish a starting state.
    pub fn preload(&self, collection: &str, records: Vec<serde_json::Value>) {
        if let Ok(mut collections) = self.collections.lock() {
            collections.insert(collection.to_owned(), records);
        }
    }

    fn publish(&self, event: ChangeEvent) {
        let Ok(channels) = self.channels.lock() else {
            return;
        };
        if let Some(sender) = channels.get(&event.collection) {
            // A send error only means nobody is subscribed right now.
            let _ = sender.send(event);
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn load_all(&self, collection: &str) -> Result<Vec<serde_json::Value>, PersistError> {
        let collections = self.collections.lock().map_err(poisoned(collection))?;
        Ok(collections.get(collection).cloned().unwrap_or_default())
    }

    async fn save(
        &self,
        collection: &str,
        id: &str,
        record: serde_json::Value,
    ) -> Result<(), PersistError> {
        {
            let mut collections = self.collections.lock().map_err(poisoned(collection))?;
            let records = collections.entry(collection.to_owned()).or_default();
            match position_of(records, id) {
                Some(index) => {
                    if let Some(slot) = records.get_mut(index) {
                        slot.clone_from(&record);
                    }
                }
                None => records.insert(0, record.clone()),
            }
        }

        self.publish(ChangeEvent {
            collection: collection.to_owned(),
            id: id.to_owned(),
            record: Some(record),
        });
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), PersistError> {
        let removed = {
            let mut collections = self.collections.lock().map_err(poisoned(collection))?;
            let records = collections.entry(collection.to_owned()).or_default();
            position_of(records, id).map(|index| records.remove(index))
        };

        if removed.is_some() {
            self.publish(ChangeEvent {
                collection: collection.to_owned(),
                id: id.to_owned(),
                record: None,
            });
        }
        Ok(())
    }

    fn subscribe(&self, collection: &str) -> Option<broadcast::Receiver<ChangeEvent>> {
        let mut channels = self.channels.lock().ok()?;
        let sender = channels
            .entry(collection.to_owned())
            .or_insert_with(|| broadcast::channel(CHANGE_CHANNEL_CAPACITY).0);
        Some(sender.subscribe())
    }
}

fn poisoned<T>(collection: &str) -> impl FnOnce(T) -> PersistError {
    let collection = collection.to_owned();
    move |_| PersistError::Corrupt {
        collection,
        detail: "collection lock poisoned".to_owned(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::persist::collections;

    #[tokio::test]
    async fn test_save_orders_most_recent_first() {
        let store = MemoryStore::new();
        store
            .save(collections::ENTITIES, "c1", json!({"id": "c1"}))
            .await
            .unwrap();
        store
            .save(collections::ENTITIES, "c2", json!({"id": "c2"}))
            .await
            .unwrap();

        let records = store.load_all(collections::ENTITIES).await.unwrap();
        assert_eq!(records[0]["id"], "c2");
        assert_eq!(records[1]["id"], "c1");
    }

    #[tokio::test]
    async fn test_subscribe_receives_changes() {
        let store = MemoryStore::new();
        let mut rx = store.subscribe(collections::PRODUCTS).unwrap();

        store
            .save(collections::PRODUCTS, "p1", json!({"id": "p1"}))
            .await
            .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.collection, collections::PRODUCTS);
        assert_eq!(event.id, "p1");
        assert!(event.record.is_some());

        store.delete(collections::PRODUCTS, "p1").await.unwrap();
        let event = rx.recv().await.unwrap();
        assert!(event.record.is_none());
    }

    #[tokio::test]
    async fn test_delete_absent_id_is_noop() {
        let store = MemoryStore::new();
        store.delete(collections::NEWS, "ghost").await.unwrap();
        assert!(store.load_all(collections::NEWS).await.unwrap().is_empty());
    }
}
