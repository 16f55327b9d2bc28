//! Append-only order store.

use std::collections::HashSet;
use std::sync::Arc;

use pedidoflex_core::{BillingEntity, Order, OrderId, User, UserRole};
use tokio::sync::RwLock;
use tokio::sync::broadcast::error::RecvError;

use super::{StoreError, decode, encode};
use crate::persist::{ChangeEvent, SharedStore, collections};
use crate::services::visibility;

/// Durable record of submitted orders.
///
/// Orders are only ever appended here; status transitions happen on the
/// checkout provider's side and arrive (if at all) as remote change events.
#[derive(Clone)]
pub struct OrderStore {
    orders: Arc<RwLock<Vec<Order>>>,
    persist: SharedStore,
}

impl OrderStore {
    /// Create an empty store over the given backend.
    #[must_use]
    pub fn new(persist: SharedStore) -> Self {
        Self {
            orders: Arc::new(RwLock::new(Vec::new())),
            persist,
        }
    }

    /// Load orders from the backend, replacing in-memory state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or a record cannot be decoded.
    pub async fn hydrate(&self) -> Result<usize, StoreError> {
        let records = self.persist.load_all(collections::ORDERS).await?;
        let mut orders = Vec::with_capacity(records.len());
        for record in records {
            orders.push(decode::<Order>(collections::ORDERS, record)?);
        }
        let count = orders.len();
        *self.orders.write().await = orders;
        Ok(count)
    }

    /// Append a newly created order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateOrder`] if an order with this id
    /// already exists; in that case nothing is persisted, so a retried
    /// submission can safely mint a fresh id and append again.
    pub async fn append(&self, order: Order) -> Result<(), StoreError> {
        let mut orders = self.orders.write().await;
        if orders.iter().any(|o| o.id == order.id) {
            return Err(StoreError::DuplicateOrder(order.id));
        }
        let record = encode(collections::ORDERS, &order)?;
        self.persist
            .save(collections::ORDERS, order.id.as_str(), record)
            .await?;
        orders.insert(0, order);
        Ok(())
    }

    /// Look up an order by id.
    pub async fn get(&self, id: &OrderId) -> Option<Order> {
        self.orders.read().await.iter().find(|o| &o.id == id).cloned()
    }

    /// The orders a user may see, newest first.
    ///
    /// Admins see everything; representatives see only orders billed to an
    /// entity in their visible set.
    pub async fn list_for(&self, user: &User, all_entities: &[BillingEntity]) -> Vec<Order> {
        let orders = self.orders.read().await;
        let mut listed: Vec<Order> = match user.role {
            UserRole::Admin => orders.clone(),
            UserRole::Representative => {
                let visible: HashSet<_> = visibility::visible_entities(user, all_entities)
                    .into_iter()
                    .map(|e| e.id)
                    .collect();
                orders
                    .iter()
                    .filter(|o| visible.contains(&o.entity_id))
                    .cloned()
                    .collect()
            }
        };
        listed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        listed
    }

    /// Start merging remote change events, if the backend pushes them.
    ///
    /// Only status updates arrive this way; the portal itself never edits
    /// an order after `append`.
    pub fn start_sync(&self) {
        let Some(mut rx) = self.persist.subscribe(collections::ORDERS) else {
            return;
        };
        let store = self.clone();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => store.apply_remote(event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "order change feed lagged, rehydrating");
                        if let Err(e) = store.hydrate().await {
                            tracing::error!(error = %e, "order rehydrate failed");
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }

    async fn apply_remote(&self, event: ChangeEvent) {
        let mut orders = self.orders.write().await;
        match event.record {
            Some(record) => match decode::<Order>(collections::ORDERS, record) {
                Ok(order) => match orders.iter_mut().find(|o| o.id == order.id) {
                    Some(slot) => *slot = order,
                    None => orders.insert(0, order),
                },
                Err(e) => tracing::warn!(id = %event.id, error = %e, "ignoring bad order event"),
            },
            None => orders.retain(|o| o.id.as_str() != event.id),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Timelike, Utc};
    use pedidoflex_core::{
        EntityId, Money, OrderStatus, TaxId, UserId,
    };
    use rust_decimal::Decimal;

    use super::*;
    use crate::persist::MemoryStore;

    fn order(id: &str, entity: &str, hour: u32) -> Order {
        Order {
            id: OrderId::new(id),
            entity_id: EntityId::new(entity),
            tax_number: TaxId::parse("11.222.333/0001-81").unwrap(),
            created_at: Utc.with_ymd_and_hms(2025, 7, 1, hour, 0, 0).unwrap(),
            total: Money::brl(Decimal::new(2500, 2)),
            status: OrderStatus::Pending,
            payment: None,
            items: Vec::new(),
        }
    }

    fn entity(id: &str) -> BillingEntity {
        BillingEntity {
            id: EntityId::new(id),
            name: format!("Entity {id}"),
            legal_name: None,
            tax_number: TaxId::parse("11.222.333/0001-81").unwrap(),
            responsible_cpf: None,
            distributor: String::new(),
            contact_email: None,
            phone: None,
            address: None,
        }
    }

    fn user(role: UserRole, owned: &[&str]) -> User {
        User {
            id: UserId::new("u1"),
            email: pedidoflex_core::Email::parse("rep@pedidoflex.com.br").unwrap(),
            name: "Rep".to_owned(),
            role,
            entity_ids: owned.iter().map(|id| EntityId::new(*id)).collect(),
        }
    }

    #[tokio::test]
    async fn test_append_rejects_duplicate_id() {
        let store = OrderStore::new(Arc::new(MemoryStore::new()));
        store.append(order("o1", "c1", 9)).await.unwrap();

        let result = store.append(order("o1", "c1", 10)).await;
        assert!(matches!(result, Err(StoreError::DuplicateOrder(_))));

        // The original record is untouched.
        let kept = store.get(&OrderId::new("o1")).await.unwrap();
        assert_eq!(kept.created_at.hour(), 9);
    }

    #[tokio::test]
    async fn test_list_for_admin_sees_all_newest_first() {
        let store = OrderStore::new(Arc::new(MemoryStore::new()));
        store.append(order("o1", "c1", 9)).await.unwrap();
        store.append(order("o2", "c2", 11)).await.unwrap();
        store.append(order("o3", "c1", 10)).await.unwrap();

        let all = [entity("c1"), entity("c2")];
        let listed = store.list_for(&user(UserRole::Admin, &[]), &all).await;
        let ids: Vec<_> = listed.iter().map(|o| o.id.as_str().to_owned()).collect();
        assert_eq!(ids, ["o2", "o3", "o1"]);
    }

    #[tokio::test]
    async fn test_list_for_representative_filters_by_visibility() {
        let store = OrderStore::new(Arc::new(MemoryStore::new()));
        store.append(order("o1", "c1", 9)).await.unwrap();
        store.append(order("o2", "c2", 11)).await.unwrap();

        let all = [entity("c1"), entity("c2")];
        let listed = store
            .list_for(&user(UserRole::Representative, &["c1"]), &all)
            .await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, OrderId::new("o1"));

        let none = store
            .list_for(&user(UserRole::Representative, &[]), &all)
            .await;
        assert!(none.is_empty());
    }
}
