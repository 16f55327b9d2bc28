//! Integration tests for entity visibility and order-history filtering.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::Utc;
use pedidoflex_core::{Money, Order, OrderId, OrderStatus, TaxId};
use pedidoflex_portal::persist::MemoryStore;
use pedidoflex_portal::services::visibility::{self, Access};
use pedidoflex_portal::stores::{BillingEntityStore, OrderStore};
use rust_decimal::Decimal;

use pedidoflex_integration_tests::{admin, entity_with_address, entity_without_address, representative};

fn order_for(id: &str, entity_id: &str) -> Order {
    Order {
        id: OrderId::new(id),
        entity_id: entity_id.into(),
        tax_number: TaxId::parse("11.222.333/0001-81").unwrap(),
        created_at: Utc::now(),
        total: Money::brl(Decimal::new(2500, 2)),
        status: OrderStatus::Pending,
        payment: None,
        items: Vec::new(),
    }
}

#[tokio::test]
async fn test_admin_sees_every_order_regardless_of_ownership() {
    let persist = Arc::new(MemoryStore::new());
    let entities = BillingEntityStore::new(persist.clone());
    let orders = OrderStore::new(persist);

    entities.upsert(entity_with_address("c1")).await.unwrap();
    entities.upsert(entity_without_address("c2")).await.unwrap();
    orders.append(order_for("o1", "c1")).await.unwrap();
    orders.append(order_for("o2", "c2")).await.unwrap();

    let all = entities.all().await;
    // The admin owns nothing explicitly, yet sees both orders.
    let listed = orders.list_for(&admin("a1"), &all).await;
    assert_eq!(listed.len(), 2);
}

#[tokio::test]
async fn test_representative_sees_strictly_their_subset() {
    let persist = Arc::new(MemoryStore::new());
    let entities = BillingEntityStore::new(persist.clone());
    let orders = OrderStore::new(persist);

    entities.upsert(entity_with_address("c1")).await.unwrap();
    entities.upsert(entity_without_address("c2")).await.unwrap();
    orders.append(order_for("o1", "c1")).await.unwrap();
    orders.append(order_for("o2", "c2")).await.unwrap();
    orders.append(order_for("o3", "c1")).await.unwrap();

    let all = entities.all().await;
    let rep = representative("r1", &["c1"]);
    let listed = orders.list_for(&rep, &all).await;
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|o| o.entity_id.as_str() == "c1"));
}

#[tokio::test]
async fn test_unassigned_representative_is_awaiting_activation() {
    let persist = Arc::new(MemoryStore::new());
    let entities = BillingEntityStore::new(persist);
    entities.upsert(entity_with_address("c1")).await.unwrap();

    let all = entities.all().await;
    let rep = representative("r1", &[]);

    // No catalog or cart surface grants access in this state; the access
    // resolver is the single authority they all consult.
    assert_eq!(visibility::resolve_access(&rep, &all), Access::AwaitingActivation);
    assert!(visibility::visible_entities(&rep, &all).is_empty());
    assert!(!visibility::can_operate_on(&rep, &all[0].id, &all));
}

#[tokio::test]
async fn test_admin_with_no_entities_routes_to_management() {
    let all = Vec::new();
    assert_eq!(
        visibility::resolve_access(&admin("a1"), &all),
        Access::ManageEntities
    );
}

#[tokio::test]
async fn test_revoking_ownership_revokes_operation() {
    let persist = Arc::new(MemoryStore::new());
    let entities = BillingEntityStore::new(persist);
    entities.upsert(entity_with_address("c1")).await.unwrap();
    let all = entities.all().await;

    let mut rep = representative("r1", &["c1"]);
    assert!(visibility::can_operate_on(&rep, &all[0].id, &all));

    // An admin clears the assignment mid-session; the same check must now
    // force re-selection.
    rep.entity_ids.clear();
    assert!(!visibility::can_operate_on(&rep, &all[0].id, &all));
}
