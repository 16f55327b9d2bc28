//! News feed route handlers.

use axum::{Json, extract::State};
use pedidoflex_core::NewsPost;
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::RequireUser;
use crate::state::AppState;

/// The news feed, newest first.
///
/// Available to any signed-in user, including accounts still awaiting
/// activation.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    _user: RequireUser,
) -> Result<Json<Vec<NewsPost>>, AppError> {
    Ok(Json(state.news().all().await))
}
