//! HTTP route handlers for the portal.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Liveness check
//! GET  /health/ready            - Readiness check (touches persistence)
//!
//! # Auth
//! POST /auth/login              - Sign in
//! POST /auth/register           - Self-register (lands awaiting activation)
//! POST /auth/logout             - Sign out, clears the session
//!
//! # Billing entities
//! GET  /entities                - Visible entities / access state
//! POST /entities/select         - Set the active context (discards the cart)
//!
//! # Catalog
//! GET  /catalog?q=              - Search products (empty term matches all)
//!
//! # Cart
//! GET    /cart                  - Current cart and total
//! POST   /cart/items            - Add one unit of a product
//! PATCH  /cart/items/{id}       - Adjust quantity by delta (floor 1)
//! DELETE /cart/items/{id}       - Remove a line
//! DELETE /cart                  - Clear the cart
//!
//! # Orders
//! POST /orders                  - Submit the cart (runs the sync workflow)
//! GET  /orders/submission       - Current workflow phase / terminal state
//! GET  /orders                  - Order history, visibility-filtered
//!
//! # News
//! GET  /news                    - News feed
//!
//! # Backoffice (admin only)
//! PUT    /backoffice/products           - Upsert a product
//! POST   /backoffice/products/bulk      - Bulk upsert (later entries win)
//! PUT    /backoffice/entities           - Upsert a billing entity
//! GET    /backoffice/users              - List accounts
//! PUT    /backoffice/users/{id}/entities - Assign owned entities
//! DELETE /backoffice/users/{id}         - Remove an account
//! POST   /backoffice/news               - Publish a news post
//! ```

pub mod auth;
pub mod backoffice;
pub mod cart;
pub mod catalog;
pub mod entities;
pub mod news;
pub mod orders;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use pedidoflex_core::User;

use crate::error::AppError;
use crate::models::CurrentUser;
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/logout", post(auth::logout))
}

/// Create the entity-selection routes router.
pub fn entity_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(entities::index))
        .route("/select", post(entities::select))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route(
            "/items/{id}",
            axum::routing::patch(cart::adjust).delete(cart::remove),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(orders::submit).get(orders::history))
        .route("/submission", get(orders::submission_status))
}

/// Create the backoffice routes router (admin only, enforced per handler).
pub fn backoffice_routes() -> Router<AppState> {
    Router::new()
        .route("/products", put(backoffice::upsert_product))
        .route("/products/bulk", post(backoffice::bulk_upsert_products))
        .route("/entities", put(backoffice::upsert_entity))
        .route("/users", get(backoffice::list_users))
        .route("/users/{id}/entities", put(backoffice::assign_entities))
        .route("/users/{id}", delete(backoffice::remove_user))
        .route("/news", post(backoffice::publish_news))
}

/// Create all routes for the portal.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/entities", entity_routes())
        .route("/catalog", get(catalog::index))
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
        .route("/news", get(news::index))
        .nest("/backoffice", backoffice_routes())
}

/// Reload the signed-in user's full account record.
///
/// Session identity is a slim [`CurrentUser`]; role and entity ownership
/// are always read fresh so backoffice edits take effect mid-session.
pub(crate) async fn load_account(state: &AppState, current: &CurrentUser) -> Result<User, AppError> {
    state
        .users()
        .get(&current.id)
        .await
        .map(|account| account.user)
        .ok_or_else(|| AppError::Unauthorized("this account is no longer active".to_owned()))
}
