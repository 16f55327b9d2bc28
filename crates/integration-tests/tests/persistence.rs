//! Integration tests for the persistence adapter seam.
//!
//! The stores must behave identically over a load-once backend and a
//! live-subscribed one; the only difference is whether remote changes
//! arrive at all.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use pedidoflex_core::ProductId;
use pedidoflex_portal::persist::{DocumentStore, MemoryStore, SnapshotStore};
use pedidoflex_portal::stores::CatalogStore;

use pedidoflex_integration_tests::product;

#[tokio::test]
async fn test_snapshot_backend_reports_no_subscription() {
    let dir = tempfile::tempdir().unwrap();
    let backend = SnapshotStore::new(dir.path());
    assert!(backend.subscribe("products").is_none());

    // start_sync over a load-once backend is a silent no-op; the store
    // still works through its own mutations.
    let catalog = CatalogStore::new(Arc::new(backend));
    catalog.start_sync();
    catalog.upsert(product("1", "Suco", 12_50)).await.unwrap();
    assert_eq!(catalog.all().await.len(), 1);
}

#[tokio::test]
async fn test_live_backend_fans_changes_out_to_sibling_stores() {
    // Two store instances over the same live backend: think two portal
    // processes attached to the same hosted document collection.
    let backend: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    let writer = CatalogStore::new(backend.clone());
    let reader = CatalogStore::new(backend);
    reader.hydrate().await.unwrap();
    reader.start_sync();

    writer.upsert(product("1", "Suco", 12_50)).await.unwrap();

    // The reader merges the pushed change without any explicit reload.
    let mut found = false;
    for _ in 0..200 {
        if reader.get(&ProductId::new("1")).await.is_some() {
            found = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    assert!(found, "remote change never reached the subscribed store");
}

#[tokio::test]
async fn test_remote_update_wins_by_last_writer() {
    let backend: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    let writer = CatalogStore::new(backend.clone());
    let reader = CatalogStore::new(backend);
    reader.hydrate().await.unwrap();
    reader.start_sync();

    writer.upsert(product("1", "Suco", 12_50)).await.unwrap();
    writer
        .upsert(product("1", "Suco Integral", 13_00))
        .await
        .unwrap();

    let mut name = String::new();
    for _ in 0..200 {
        if let Some(p) = reader.get(&ProductId::new("1")).await {
            name.clone_from(&p.name);
            if name == "Suco Integral" {
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    assert_eq!(name, "Suco Integral");

    // One record, not two: the update replaced rather than duplicated.
    assert_eq!(reader.all().await.len(), 1);
}
