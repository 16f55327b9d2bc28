//! Persistence adapter for the portal's collections.
//!
//! The portal went through two storage generations: a durable snapshot per
//! collection, and a live-subscribed document store. Both are modeled by
//! the single [`DocumentStore`] trait here; the stores and the submission
//! workflow never know which backend is active.
//!
//! A backend exposes, per collection: `load_all`, `save`, `delete`, and
//! optionally `subscribe` for push-based change events. A backend without
//! `subscribe` (load-once, manual save) must behave identically from the
//! caller's perspective - the in-memory stores simply never receive remote
//! events.

mod memory;
mod snapshot;

pub use memory::MemoryStore;
pub use snapshot::SnapshotStore;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

/// Collection names shared by every backend.
pub mod collections {
    pub const PRODUCTS: &str = "products";
    pub const ENTITIES: &str = "entities";
    pub const ORDERS: &str = "orders";
    pub const USERS: &str = "users";
    pub const NEWS: &str = "news";
}

/// Errors surfaced by a persistence backend.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Reading or writing the backing storage failed.
    #[error("storage error on collection {collection}: {source}")]
    Io {
        collection: String,
        #[source]
        source: std::io::Error,
    },

    /// A stored collection could not be decoded.
    #[error("corrupt data in collection {collection}: {detail}")]
    Corrupt { collection: String, detail: String },
}

/// A change pushed by a live backend.
///
/// `record` is `None` when the document was removed.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub collection: String,
    pub id: String,
    pub record: Option<serde_json::Value>,
}

/// Storage backend for the portal's collections.
///
/// Records are opaque JSON documents keyed by their `id`; the typed stores
/// own (de)serialization. New and updated records keep the collection's
/// display order: an update replaces the record in place, an insert goes to
/// the front (most-recent-first).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Load every record of a collection, in stored order.
    async fn load_all(&self, collection: &str) -> Result<Vec<serde_json::Value>, PersistError>;

    /// Insert or replace a record.
    async fn save(
        &self,
        collection: &str,
        id: &str,
        record: serde_json::Value,
    ) -> Result<(), PersistError>;

    /// Remove a record. Removing an absent id is a no-op.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), PersistError>;

    /// Subscribe to change events, if the backend supports push updates.
    ///
    /// Returns `None` for load-once backends.
    fn subscribe(&self, collection: &str) -> Option<broadcast::Receiver<ChangeEvent>>;
}

/// Shared handle to the active backend.
pub type SharedStore = Arc<dyn DocumentStore>;

/// Find a record's position in a collection vector by its `id` field.
pub(crate) fn position_of(records: &[serde_json::Value], id: &str) -> Option<usize> {
    records
        .iter()
        .position(|record| record.get("id").and_then(serde_json::Value::as_str) == Some(id))
}
