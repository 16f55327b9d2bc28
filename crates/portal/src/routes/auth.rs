//! Auth route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{self, AppError};
use crate::middleware::auth::set_current_user;
use crate::models::CurrentUser;
use crate::state::AppState;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub name: String,
    pub password: String,
}

/// Sign in with email and password.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginForm>,
) -> Result<Json<CurrentUser>, AppError> {
    let user = state.auth().login(&form.email, &form.password).await?;

    let current = CurrentUser::from(&user);
    set_current_user(&session, &current).await?;
    error::set_sentry_user(&current.id, Some(current.email.as_str()));

    tracing::info!(user_id = %current.id, role = %current.role, "signed in");
    Ok(Json(current))
}

/// Self-register a representative account.
///
/// The new account signs in immediately but has no billing entities until
/// an administrator assigns them, so it lands in the awaiting-activation
/// state.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<RegisterForm>,
) -> Result<(StatusCode, Json<CurrentUser>), AppError> {
    let user = state
        .auth()
        .register(&form.email, &form.name, &form.password)
        .await?;

    let current = CurrentUser::from(&user);
    set_current_user(&session, &current).await?;
    error::set_sentry_user(&current.id, Some(current.email.as_str()));

    tracing::info!(user_id = %current.id, "account registered");
    Ok((StatusCode::CREATED, Json(current)))
}

/// Sign out: clears identity, active entity, and cart.
#[instrument(skip_all)]
pub async fn logout(session: Session) -> Result<StatusCode, AppError> {
    session.flush().await?;
    error::clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}
