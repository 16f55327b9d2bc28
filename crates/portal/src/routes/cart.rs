//! Cart route handlers.
//!
//! The cart lives in the session, scoped to the active billing-entity
//! context. Every mutation responds with the full cart view so the client
//! can re-render without a second round trip.

use axum::{
    Json,
    extract::{Path, State},
};
use pedidoflex_core::{CartItem, Money, ProductId};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::cart::Cart;
use crate::error::AppError;
use crate::middleware::ActiveContext;
use crate::models::session_keys;
use crate::state::AppState;

/// Cart display data.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub total: Money,
    pub item_count: usize,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items().to_vec(),
            total: cart.total(),
            item_count: cart.len(),
        }
    }
}

/// Add-to-cart form data.
#[derive(Debug, Deserialize)]
pub struct AddForm {
    pub product_id: ProductId,
}

/// Quantity-adjustment form data.
#[derive(Debug, Deserialize)]
pub struct AdjustForm {
    /// Signed change; the resulting quantity is clamped at 1.
    pub delta: i32,
}

/// Read the session cart.
pub(crate) async fn read_cart(session: &Session) -> Result<Cart, AppError> {
    Ok(session.get(session_keys::CART).await?.unwrap_or_default())
}

/// Write the session cart back.
pub(crate) async fn write_cart(session: &Session, cart: &Cart) -> Result<(), AppError> {
    session.insert(session_keys::CART, cart).await?;
    Ok(())
}

/// Show the current cart.
#[instrument(skip_all)]
pub async fn show(
    _context: ActiveContext,
    session: Session,
) -> Result<Json<CartView>, AppError> {
    let cart = read_cart(&session).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Add one unit of a product.
#[instrument(skip(state, session, _context))]
pub async fn add(
    State(state): State<AppState>,
    _context: ActiveContext,
    session: Session,
    Json(form): Json<AddForm>,
) -> Result<Json<CartView>, AppError> {
    let product = state
        .catalog()
        .get(&form.product_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("product {}", form.product_id)))?;

    let mut cart = read_cart(&session).await?;
    cart.add(&product);
    write_cart(&session, &cart).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Adjust a line's quantity by a signed delta (floor 1).
#[instrument(skip(_context, session))]
pub async fn adjust(
    _context: ActiveContext,
    session: Session,
    Path(product_id): Path<ProductId>,
    Json(form): Json<AdjustForm>,
) -> Result<Json<CartView>, AppError> {
    let mut cart = read_cart(&session).await?;
    if !cart.adjust_quantity(&product_id, form.delta) {
        return Err(AppError::NotFound(format!("cart item {product_id}")));
    }
    write_cart(&session, &cart).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Remove a line entirely.
#[instrument(skip(_context, session))]
pub async fn remove(
    _context: ActiveContext,
    session: Session,
    Path(product_id): Path<ProductId>,
) -> Result<Json<CartView>, AppError> {
    let mut cart = read_cart(&session).await?;
    if !cart.remove(&product_id) {
        return Err(AppError::NotFound(format!("cart item {product_id}")));
    }
    write_cart(&session, &cart).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Empty the cart.
#[instrument(skip_all)]
pub async fn clear(
    _context: ActiveContext,
    session: Session,
) -> Result<Json<CartView>, AppError> {
    let mut cart = read_cart(&session).await?;
    cart.clear();
    write_cart(&session, &cart).await?;
    Ok(Json(CartView::from(&cart)))
}
