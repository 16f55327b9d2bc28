//! Integration tests for catalog upsert semantics and search.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use pedidoflex_core::ProductId;
use pedidoflex_portal::persist::{MemoryStore, SnapshotStore};
use pedidoflex_portal::stores::CatalogStore;
use rust_decimal::Decimal;

use pedidoflex_integration_tests::product;

#[tokio::test]
async fn test_bulk_upsert_last_entry_wins_over_existing_store() {
    let catalog = CatalogStore::new(Arc::new(MemoryStore::new()));
    catalog
        .upsert(product("1", "Suco", 5_00))
        .await
        .unwrap();

    // Two entries for the same id within one batch: the later one wins,
    // exactly as if the upserts were applied one at a time.
    catalog
        .bulk_upsert(vec![
            product("1", "Suco", 9_99),
            product("1", "Suco", 7_50),
        ])
        .await
        .unwrap();

    let all = catalog.all().await;
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].unit_price.amount, Decimal::new(750, 2));
}

#[tokio::test]
async fn test_replacement_preserves_ordering_of_untouched_items() {
    let catalog = CatalogStore::new(Arc::new(MemoryStore::new()));
    for (id, name) in [("1", "Suco"), ("2", "Granola"), ("3", "Chips")] {
        catalog.upsert(product(id, name, 10_00)).await.unwrap();
    }

    catalog
        .upsert(product("2", "Granola Premium", 25_00))
        .await
        .unwrap();

    let ids: Vec<_> = catalog
        .all()
        .await
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(
        ids,
        [ProductId::new("3"), ProductId::new("2"), ProductId::new("1")]
    );
}

#[tokio::test]
async fn test_search_is_case_insensitive_substring() {
    let catalog = CatalogStore::new(Arc::new(MemoryStore::new()));
    catalog
        .upsert(product("1", "Suco Natural Integral 1L", 12_50))
        .await
        .unwrap();
    catalog
        .upsert(product("2", "Mix de Castanhas 200g", 18_90))
        .await
        .unwrap();

    assert_eq!(catalog.search("natural").await.len(), 1);
    assert_eq!(catalog.search("CASTANHAS").await.len(), 1);
    assert_eq!(catalog.search("").await.len(), 2);
    assert!(catalog.search("picanha").await.is_empty());
}

#[tokio::test]
async fn test_catalog_survives_restart_on_snapshot_backend() {
    let dir = tempfile::tempdir().unwrap();

    {
        let catalog = CatalogStore::new(Arc::new(SnapshotStore::new(dir.path())));
        catalog.upsert(product("1", "Suco", 12_50)).await.unwrap();
        catalog.upsert(product("2", "Granola", 22_00)).await.unwrap();
    }

    // A fresh process over the same directory sees the same catalog in the
    // same order.
    let catalog = CatalogStore::new(Arc::new(SnapshotStore::new(dir.path())));
    assert_eq!(catalog.hydrate().await.unwrap(), 2);
    let names: Vec<_> = catalog.all().await.into_iter().map(|p| p.name).collect();
    assert_eq!(names, ["Granola", "Suco"]);
}
