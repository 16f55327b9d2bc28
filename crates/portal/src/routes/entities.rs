//! Billing-entity selection route handlers.

use axum::{Json, extract::State};
use pedidoflex_core::{BillingEntity, EntityId};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::cart::Cart;
use crate::error::AppError;
use crate::middleware::RequireUser;
use crate::models::session_keys;
use crate::routes::load_account;
use crate::services::visibility::{self, Access};
use crate::state::AppState;

/// The user's entity-selection view.
#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AccessView {
    /// Pick one of these; `active` echoes the current selection, if any.
    Select {
        entities: Vec<BillingEntity>,
        active: Option<EntityId>,
    },
    /// Nothing assigned yet; only sign-out is available.
    AwaitingActivation,
    /// No entities exist in the system; go create one in the backoffice.
    ManageEntities,
}

/// Selection form data.
#[derive(Debug, Deserialize)]
pub struct SelectForm {
    pub entity_id: EntityId,
}

/// List the entities this user may select, or the terminal access state.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireUser(current): RequireUser,
) -> Result<Json<AccessView>, AppError> {
    let user = load_account(&state, &current).await?;
    let all = state.entities().all().await;

    let view = match visibility::resolve_access(&user, &all) {
        Access::Select(entities) => {
            let active: Option<EntityId> = session
                .get(session_keys::ACTIVE_ENTITY)
                .await
                .ok()
                .flatten();
            AccessView::Select { entities, active }
        }
        Access::AwaitingActivation => AccessView::AwaitingActivation,
        Access::ManageEntities => AccessView::ManageEntities,
    };
    Ok(Json(view))
}

/// Select the active billing entity for this session.
///
/// Switching context silently discards the cart: carts never carry over
/// between entities.
#[instrument(skip(state, session, current))]
pub async fn select(
    State(state): State<AppState>,
    session: Session,
    RequireUser(current): RequireUser,
    Json(form): Json<SelectForm>,
) -> Result<Json<BillingEntity>, AppError> {
    let user = load_account(&state, &current).await?;
    let all = state.entities().all().await;

    if !visibility::can_operate_on(&user, &form.entity_id, &all) {
        return Err(AppError::Forbidden(
            "this billing entity is not available to your account".to_owned(),
        ));
    }

    let entity = state
        .entities()
        .get(&form.entity_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("billing entity {}", form.entity_id)))?;

    session
        .insert(session_keys::ACTIVE_ENTITY, &entity.id)
        .await?;
    session.remove::<Cart>(session_keys::CART).await?;

    tracing::info!(entity = %entity.id, "active billing entity selected");
    Ok(Json(entity))
}
