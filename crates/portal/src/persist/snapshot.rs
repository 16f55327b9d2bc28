//! Durable JSON-snapshot backend.
//!
//! One file per collection under a data directory, each holding the full
//! record array in display order. Writes go through a temp file and an
//! atomic rename so a crash mid-write never leaves a half-written
//! collection behind.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::{Mutex, broadcast};

use super::{ChangeEvent, DocumentStore, PersistError, position_of};

/// Snapshot-per-collection backend.
///
/// Collections are cached in memory after first load; every mutation
/// rewrites the collection's file.
pub struct SnapshotStore {
    dir: PathBuf,
    cache: Mutex<HashMap<String, Vec<serde_json::Value>>>,
}

impl SnapshotStore {
    /// Create a backend rooted at `dir`. The directory is created on first
    /// write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// The data directory this backend writes to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{collection}.json"))
    }

    async fn read_collection(
        &self,
        collection: &str,
    ) -> Result<Vec<serde_json::Value>, PersistError> {
        let path = self.collection_path(collection);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(PersistError::Io {
                    collection: collection.to_owned(),
                    source,
                });
            }
        };

        serde_json::from_slice(&bytes).map_err(|e| PersistError::Corrupt {
            collection: collection.to_owned(),
            detail: e.to_string(),
        })
    }

    async fn write_collection(
        &self,
        collection: &str,
        records: &[serde_json::Value],
    ) -> Result<(), PersistError> {
        let io_err = |source| PersistError::Io {
            collection: collection.to_owned(),
            source,
        };

        tokio::fs::create_dir_all(&self.dir).await.map_err(io_err)?;

        let bytes = serde_json::to_vec_pretty(records).map_err(|e| PersistError::Corrupt {
            collection: collection.to_owned(),
            detail: e.to_string(),
        })?;

        let path = self.collection_path(collection);
        let tmp = self.dir.join(format!("{collection}.json.tmp"));
        tokio::fs::write(&tmp, bytes).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &path).await.map_err(io_err)?;

        Ok(())
    }

    /// Run `mutate` against the cached collection and persist the result.
    async fn update_collection<F>(&self, collection: &str, mutate: F) -> Result<(), PersistError>
    where
        F: FnOnce(&mut Vec<serde_json::Value>),
    {
        let mut cache = self.cache.lock().await;
        if !cache.contains_key(collection) {
            let records = self.read_collection(collection).await?;
            cache.insert(collection.to_owned(), records);
        }
        let records = cache.entry(collection.to_owned()).or_default();
        mutate(records);
        let snapshot = records.clone();
        self.write_collection(collection, &snapshot).await
    }
}

#[async_trait]
impl DocumentStore for SnapshotStore {
    async fn load_all(&self, collection: &str) -> Result<Vec<serde_json::Value>, PersistError> {
        let mut cache = self.cache.lock().await;
        if let Some(records) = cache.get(collection) {
            return Ok(records.clone());
        }
        let records = self.read_collection(collection).await?;
        cache.insert(collection.to_owned(), records.clone());
        Ok(records)
    }

    async fn save(
        &self,
        collection: &str,
        id: &str,
        record: serde_json::Value,
    ) -> Result<(), PersistError> {
        self.update_collection(collection, |records| match position_of(records, id) {
            Some(index) => {
                if let Some(slot) = records.get_mut(index) {
                    *slot = record;
                }
            }
            None => records.insert(0, record),
        })
        .await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), PersistError> {
        self.update_collection(collection, |records| {
            if let Some(index) = position_of(records, id) {
                records.remove(index);
            }
        })
        .await
    }

    fn subscribe(&self, _collection: &str) -> Option<broadcast::Receiver<ChangeEvent>> {
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::persist::collections;

    #[tokio::test]
    async fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());

        store
            .save(collections::PRODUCTS, "p1", json!({"id": "p1", "name": "Granola"}))
            .await
            .unwrap();
        store
            .save(collections::PRODUCTS, "p2", json!({"id": "p2", "name": "Suco"}))
            .await
            .unwrap();

        // A fresh store over the same directory sees the persisted records,
        // newest first.
        let reopened = SnapshotStore::new(dir.path());
        let records = reopened.load_all(collections::PRODUCTS).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["id"], "p2");
        assert_eq!(records[1]["id"], "p1");
    }

    #[tokio::test]
    async fn test_save_replaces_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());

        store
            .save(collections::PRODUCTS, "p1", json!({"id": "p1", "v": 1}))
            .await
            .unwrap();
        store
            .save(collections::PRODUCTS, "p2", json!({"id": "p2", "v": 1}))
            .await
            .unwrap();
        store
            .save(collections::PRODUCTS, "p1", json!({"id": "p1", "v": 2}))
            .await
            .unwrap();

        let records = store.load_all(collections::PRODUCTS).await.unwrap();
        assert_eq!(records.len(), 2);
        // p1 was updated, not moved.
        assert_eq!(records[1]["id"], "p1");
        assert_eq!(records[1]["v"], 2);
    }

    #[tokio::test]
    async fn test_delete_and_missing_collection() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());

        assert!(store.load_all(collections::USERS).await.unwrap().is_empty());

        store
            .save(collections::USERS, "u1", json!({"id": "u1"}))
            .await
            .unwrap();
        store.delete(collections::USERS, "u1").await.unwrap();
        store.delete(collections::USERS, "ghost").await.unwrap();

        assert!(store.load_all(collections::USERS).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_subscription() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        assert!(store.subscribe(collections::ORDERS).is_none());
    }
}
