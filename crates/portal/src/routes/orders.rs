//! Order route handlers.

use axum::{Json, extract::State};
use pedidoflex_core::Order;
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;

use crate::cart::Cart;
use crate::error::AppError;
use crate::middleware::{ActiveContext, RequireUser};
use crate::models::session_keys;
use crate::routes::{cart::read_cart, load_account};
use crate::services::submission::SubmissionState;
use crate::state::AppState;

/// What a successful submission returns to the client.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub order: Order,
    /// Where to send the buyer to complete payment.
    pub payment_url: String,
}

/// Submit the cart as an order.
///
/// Runs the full sync sequence against the checkout provider. On success
/// the cart is cleared; on failure it is left untouched so the user can
/// retry or edit.
#[instrument(skip_all, fields(entity = %context.entity.id))]
pub async fn submit(
    State(state): State<AppState>,
    context: ActiveContext,
    session: Session,
) -> Result<Json<SubmitResponse>, AppError> {
    let cart = read_cart(&session).await?;
    let key = submission_key(&session).await?;

    let receipt = state
        .submissions()
        .submit(&key, context.entity, cart.items().to_vec(), cart.total())
        .await?;

    // The submission snapshot is already persisted; the working cart is
    // done with.
    session.remove::<Cart>(session_keys::CART).await?;

    Ok(Json(SubmitResponse {
        order: receipt.order,
        payment_url: receipt.payment_url,
    }))
}

/// The current submission state for this session (for progress display).
#[instrument(skip_all)]
pub async fn submission_status(
    State(state): State<AppState>,
    _user: RequireUser,
    session: Session,
) -> Result<Json<SubmissionState>, AppError> {
    let key = submission_key(&session).await?;
    Ok(Json(state.submissions().status(&key)))
}

/// Order history, filtered to what this user may see.
#[instrument(skip_all)]
pub async fn history(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
) -> Result<Json<Vec<Order>>, AppError> {
    let user = load_account(&state, &current).await?;
    let all = state.entities().all().await;
    Ok(Json(state.orders().list_for(&user, &all).await))
}

/// The opaque key tying this session to its submission slot.
async fn submission_key(session: &Session) -> Result<String, AppError> {
    if let Some(key) = session
        .get::<String>(session_keys::SUBMISSION_KEY)
        .await?
    {
        return Ok(key);
    }
    let key = Uuid::new_v4().to_string();
    session
        .insert(session_keys::SUBMISSION_KEY, &key)
        .await?;
    Ok(key)
}
