//! Application state shared across handlers.

use std::sync::Arc;

use crate::checkout::SharedCheckout;
use crate::config::PortalConfig;
use crate::persist::SharedStore;
use crate::services::auth::AuthService;
use crate::services::submission::SubmissionCoordinator;
use crate::stores::{BillingEntityStore, CatalogStore, NewsStore, OrderStore, StoreError, UserStore};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// collection stores, the checkout provider, and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: PortalConfig,
    persist: SharedStore,
    catalog: CatalogStore,
    entities: BillingEntityStore,
    orders: OrderStore,
    users: UserStore,
    news: NewsStore,
    checkout: SharedCheckout,
    submissions: SubmissionCoordinator,
}

impl AppState {
    /// Create a new application state over a persistence backend and a
    /// checkout provider.
    #[must_use]
    pub fn new(config: PortalConfig, persist: SharedStore, checkout: SharedCheckout) -> Self {
        let catalog = CatalogStore::new(Arc::clone(&persist));
        let entities = BillingEntityStore::new(Arc::clone(&persist));
        let orders = OrderStore::new(Arc::clone(&persist));
        let users = UserStore::new(Arc::clone(&persist));
        let news = NewsStore::new(Arc::clone(&persist));
        let submissions = SubmissionCoordinator::new(
            Arc::clone(&checkout),
            orders.clone(),
            config.phase_timeout,
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                persist,
                catalog,
                entities,
                orders,
                users,
                news,
                checkout,
                submissions,
            }),
        }
    }

    /// Hydrate every store from the backend and start merging remote
    /// change events where the backend pushes them.
    ///
    /// # Errors
    ///
    /// Returns the first store that failed to load.
    pub async fn hydrate(&self) -> Result<(), StoreError> {
        let products = self.inner.catalog.hydrate().await?;
        let entities = self.inner.entities.hydrate().await?;
        let orders = self.inner.orders.hydrate().await?;
        let users = self.inner.users.hydrate().await?;
        let news = self.inner.news.hydrate().await?;
        tracing::info!(products, entities, orders, users, news, "stores hydrated");

        self.inner.catalog.start_sync();
        self.inner.entities.start_sync();
        self.inner.orders.start_sync();
        Ok(())
    }

    /// Get a reference to the portal configuration.
    #[must_use]
    pub fn config(&self) -> &PortalConfig {
        &self.inner.config
    }

    /// Get a handle to the persistence backend.
    #[must_use]
    pub fn persist(&self) -> &SharedStore {
        &self.inner.persist
    }

    /// Get the product catalog store.
    #[must_use]
    pub fn catalog(&self) -> &CatalogStore {
        &self.inner.catalog
    }

    /// Get the billing-entity store.
    #[must_use]
    pub fn entities(&self) -> &BillingEntityStore {
        &self.inner.entities
    }

    /// Get the order store.
    #[must_use]
    pub fn orders(&self) -> &OrderStore {
        &self.inner.orders
    }

    /// Get the account store.
    #[must_use]
    pub fn users(&self) -> &UserStore {
        &self.inner.users
    }

    /// Get the news store.
    #[must_use]
    pub fn news(&self) -> &NewsStore {
        &self.inner.news
    }

    /// Get the checkout provider.
    #[must_use]
    pub fn checkout(&self) -> &SharedCheckout {
        &self.inner.checkout
    }

    /// Get the submission coordinator.
    #[must_use]
    pub fn submissions(&self) -> &SubmissionCoordinator {
        &self.inner.submissions
    }

    /// Build an authentication service over the account store.
    #[must_use]
    pub fn auth(&self) -> AuthService {
        AuthService::new(self.inner.users.clone())
    }
}
