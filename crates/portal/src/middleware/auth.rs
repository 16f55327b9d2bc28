//! Authentication extractors.
//!
//! Route handlers declare what they need: a signed-in user, an admin, or a
//! full active context (user + selected billing entity). The active
//! context re-derives visibility from the stores on every request, so an
//! entity revoked mid-session forces re-selection instead of letting cart
//! operations continue against a now-invisible entity.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
};
use pedidoflex_core::{BillingEntity, EntityId, User};
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::{CurrentUser, session_keys};
use crate::services::visibility;
use crate::state::AppState;

/// Extractor that requires a signed-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("Olá, {}!", user.name)
/// }
/// ```
pub struct RequireUser(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = session_from(parts)?;
        let user: CurrentUser = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
            .ok_or_else(|| AppError::Unauthorized("sign in to continue".to_owned()))?;
        Ok(Self(user))
    }
}

/// Extractor that requires a signed-in administrator.
pub struct RequireAdmin(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireUser(user) = RequireUser::from_request_parts(parts, state).await?;
        if !user.role.is_admin() {
            return Err(AppError::Forbidden(
                "this area requires an administrator account".to_owned(),
            ));
        }
        Ok(Self(user))
    }
}

/// A validated operating context: the signed-in user (fresh from the
/// account store) plus the billing entity selected for this session.
pub struct ActiveContext {
    pub user: User,
    pub entity: BillingEntity,
}

impl FromRequestParts<AppState> for ActiveContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = session_from(parts)?;
        let RequireUser(current) = RequireUser::from_request_parts(parts, state).await?;

        // Reload the account: role and ownership may have changed since
        // sign-in, and the account itself may have been removed.
        let account = state.users().get(&current.id).await.ok_or_else(|| {
            AppError::Unauthorized("this account is no longer active".to_owned())
        })?;

        let entity_id: EntityId = session
            .get(session_keys::ACTIVE_ENTITY)
            .await
            .ok()
            .flatten()
            .ok_or_else(|| {
                AppError::SelectionRequired("select a billing entity to continue".to_owned())
            })?;

        let all = state.entities().all().await;
        if !visibility::can_operate_on(&account.user, &entity_id, &all) {
            // Stale context: drop it and force re-selection.
            let _ = session
                .remove::<EntityId>(session_keys::ACTIVE_ENTITY)
                .await;
            let _ = session.remove::<crate::cart::Cart>(session_keys::CART).await;
            return Err(AppError::SelectionRequired(
                "the selected billing entity is no longer available to this account".to_owned(),
            ));
        }

        let entity = state.entities().get(&entity_id).await.ok_or_else(|| {
            AppError::SelectionRequired("the selected billing entity no longer exists".to_owned())
        })?;

        Ok(Self {
            user: account.user,
            entity,
        })
    }
}

/// Pull the session handle out of request extensions.
fn session_from(parts: &Parts) -> Result<Session, AppError> {
    parts
        .extensions
        .get::<Session>()
        .cloned()
        .ok_or_else(|| AppError::Unauthorized("session layer missing".to_owned()))
}

/// Helper to set the current user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}
