//! Process-wide collection stores.
//!
//! Each store keeps its collection in memory behind a single `RwLock`,
//! hydrates from the persistence adapter at startup, and writes through on
//! every mutation. Mutations hold the write lock for their full duration
//! (including the adapter write), so a remote change event can never
//! interleave with an in-flight local mutation; remote events are merged
//! last-writer-wins at whole-record granularity.

pub mod billing;
pub mod catalog;
pub mod news;
pub mod orders;
pub mod users;

pub use billing::BillingEntityStore;
pub use catalog::CatalogStore;
pub use news::NewsStore;
pub use orders::OrderStore;
pub use users::UserStore;

use pedidoflex_core::{OrderId, UserId};
use thiserror::Error;

use crate::persist::PersistError;

/// Errors surfaced by the typed stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The persistence backend failed.
    #[error(transparent)]
    Persist(#[from] PersistError),

    /// A stored record could not be decoded into its domain type.
    #[error("corrupt record in collection {collection}: {detail}")]
    Corrupt { collection: String, detail: String },

    /// An order with this id already exists; nothing was persisted.
    #[error("order id collision: {0}")]
    DuplicateOrder(OrderId),

    /// The referenced account does not exist.
    #[error("user not found: {0}")]
    UserNotFound(UserId),
}

impl StoreError {
    pub(crate) fn corrupt(collection: &str, detail: impl std::fmt::Display) -> Self {
        Self::Corrupt {
            collection: collection.to_owned(),
            detail: detail.to_string(),
        }
    }
}

/// Decode a persisted record, tagging decode failures with the collection.
pub(crate) fn decode<T: serde::de::DeserializeOwned>(
    collection: &str,
    record: serde_json::Value,
) -> Result<T, StoreError> {
    serde_json::from_value(record).map_err(|e| StoreError::corrupt(collection, e))
}

/// Encode a domain record for persistence.
pub(crate) fn encode<T: serde::Serialize>(
    collection: &str,
    record: &T,
) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(record).map_err(|e| StoreError::corrupt(collection, e))
}
