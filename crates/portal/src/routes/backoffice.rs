//! Backoffice route handlers (admin only).
//!
//! Catalog, billing-entity, account, and news management. Every handler
//! takes [`RequireAdmin`]; representatives never reach these surfaces.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use pedidoflex_core::{BillingEntity, EntityId, NewsPost, PostId, Product, User, UserId};
use serde::Deserialize;
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Upsert a product: insert if the id is unknown, replace in place if it
/// is known.
#[instrument(skip(state, _admin), fields(product = %product.id))]
pub async fn upsert_product(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Json(product): Json<Product>,
) -> Result<Json<Product>, AppError> {
    validate_product(&product)?;
    state.catalog().upsert(product.clone()).await?;
    Ok(Json(product))
}

/// Bulk upsert: entries apply one at a time in the given order, so within
/// a batch the last entry for an id wins.
#[instrument(skip_all, fields(count = products.len()))]
pub async fn bulk_upsert_products(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Json(products): Json<Vec<Product>>,
) -> Result<StatusCode, AppError> {
    for product in &products {
        validate_product(product)?;
    }
    let applied = state.catalog().bulk_upsert(products).await?;
    tracing::info!(applied, "catalog bulk upsert");
    Ok(StatusCode::NO_CONTENT)
}

/// Upsert a billing entity.
///
/// The tax number is validated structurally (check digits) during
/// deserialization; an incomplete address is allowed here and only blocks
/// order submission later.
#[instrument(skip(state, _admin), fields(entity = %entity.id))]
pub async fn upsert_entity(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Json(entity): Json<BillingEntity>,
) -> Result<Json<BillingEntity>, AppError> {
    if entity.name.trim().is_empty() {
        return Err(AppError::BadRequest("entity name cannot be empty".to_owned()));
    }
    state.entities().upsert(entity.clone()).await?;
    Ok(Json(entity))
}

/// List every account (without credential hashes).
#[instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<Vec<User>>, AppError> {
    let users = state
        .users()
        .all()
        .await
        .into_iter()
        .map(|account| account.user)
        .collect();
    Ok(Json(users))
}

/// Assignment form data.
#[derive(Debug, Deserialize)]
pub struct AssignForm {
    pub entity_ids: Vec<EntityId>,
}

/// Replace the set of billing entities an account owns.
#[instrument(skip(state, _admin, form))]
pub async fn assign_entities(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(user_id): Path<UserId>,
    Json(form): Json<AssignForm>,
) -> Result<Json<User>, AppError> {
    // Only existing entities can be assigned.
    let all = state.entities().all().await;
    let unknown: Vec<_> = form
        .entity_ids
        .iter()
        .filter(|id| !all.iter().any(|entity| entity.id == **id))
        .map(ToString::to_string)
        .collect();
    if !unknown.is_empty() {
        return Err(AppError::BadRequest(format!(
            "unknown billing entities: {}",
            unknown.join(", ")
        )));
    }

    let account = state
        .users()
        .assign_entities(&user_id, form.entity_ids)
        .await?;
    Ok(Json(account.user))
}

/// Remove an account.
#[instrument(skip(state, admin))]
pub async fn remove_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(user_id): Path<UserId>,
) -> Result<StatusCode, AppError> {
    if admin.id == user_id {
        return Err(AppError::BadRequest(
            "cannot remove the signed-in account".to_owned(),
        ));
    }
    state.users().remove(&user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// News publication form data.
#[derive(Debug, Deserialize)]
pub struct NewsDraft {
    pub title: String,
    pub body: String,
    pub image_url: Option<String>,
}

/// Publish a news post.
#[instrument(skip_all)]
pub async fn publish_news(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Json(draft): Json<NewsDraft>,
) -> Result<(StatusCode, Json<NewsPost>), AppError> {
    if draft.title.trim().is_empty() {
        return Err(AppError::BadRequest("news title cannot be empty".to_owned()));
    }

    let post = NewsPost {
        id: PostId::generate(),
        title: draft.title,
        body: draft.body,
        date: Utc::now(),
        image_url: draft.image_url,
    };
    state.news().upsert(post.clone()).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

fn validate_product(product: &Product) -> Result<(), AppError> {
    if product.name.trim().is_empty() {
        return Err(AppError::BadRequest("product name cannot be empty".to_owned()));
    }
    if product.unit_price.is_negative() {
        return Err(AppError::BadRequest(format!(
            "product {} has a negative unit price",
            product.id
        )));
    }
    Ok(())
}
