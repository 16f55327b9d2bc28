//! Catalog route handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use pedidoflex_core::Product;
use serde::Deserialize;
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::ActiveContext;
use crate::state::AppState;

/// Search parameters.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Case-insensitive substring matched against product names.
    pub q: Option<String>,
}

/// Browse/search the catalog.
///
/// Requires an active billing-entity context: users awaiting activation
/// (or who haven't selected an entity yet) never reach the catalog.
#[instrument(skip(state, _context))]
pub async fn index(
    State(state): State<AppState>,
    _context: ActiveContext,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Product>>, AppError> {
    let term = params.q.unwrap_or_default();
    Ok(Json(state.catalog().search(&term).await))
}
