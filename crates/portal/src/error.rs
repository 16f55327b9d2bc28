//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-class errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`; every failure path lands here and becomes a
//! typed JSON status - nothing propagates as an unhandled fault and
//! nothing is silently swallowed.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::checkout::CheckoutError;
use crate::services::auth::AuthError;
use crate::services::submission::{FailureKind, SubmitError};
use crate::stores::StoreError;

/// Application-level error type for the portal.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication operation failed.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// A collection store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The order-submission workflow failed.
    #[error("submission error: {0}")]
    Submit(#[from] SubmitError),

    /// Session read/write failed.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but lacks the role for this surface.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The active billing entity is no longer valid; the client must send
    /// the user back through entity selection.
    #[error("entity selection required: {0}")]
    SelectionRequired(String),
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Store(_) | Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => auth_status(err),
            Self::Submit(err) => submit_status(err),
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::SelectionRequired(_) => StatusCode::CONFLICT,
        }
    }

    /// Client-facing message. Internal failures are not leaked.
    fn message(&self) -> String {
        match self {
            Self::Store(_) | Self::Session(_) => "internal error".to_owned(),
            Self::Auth(err) => auth_message(err),
            Self::Submit(SubmitError::Store(_) | SubmitError::Task(_)) => {
                "internal error".to_owned()
            }
            other => other_message(other),
        }
    }

    /// Machine-readable failure tag, where one helps the client route.
    fn kind(&self) -> Option<&'static str> {
        match self {
            Self::Submit(SubmitError::Checkout(err)) => Some(match FailureKind::from(err) {
                FailureKind::IncompleteAddress => "incomplete_address",
                FailureKind::Rejected => "rejected",
                FailureKind::Transient => "transient",
            }),
            Self::Submit(SubmitError::AlreadyInFlight) => Some("already_in_flight"),
            Self::Submit(SubmitError::EmptyCart) => Some("empty_cart"),
            Self::SelectionRequired(_) => Some("selection_required"),
            _ => None,
        }
    }
}

const fn auth_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AuthError::UserAlreadyExists => StatusCode::CONFLICT,
        AuthError::WeakPassword(_) | AuthError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
        AuthError::Hashing(_) | AuthError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn auth_message(err: &AuthError) -> String {
    match err {
        AuthError::InvalidCredentials => "invalid credentials".to_owned(),
        AuthError::UserAlreadyExists => "an account with this email already exists".to_owned(),
        AuthError::WeakPassword(msg) => msg.clone(),
        AuthError::InvalidEmail(e) => e.to_string(),
        AuthError::Hashing(_) | AuthError::Store(_) => "internal error".to_owned(),
    }
}

const fn submit_status(err: &SubmitError) -> StatusCode {
    match err {
        SubmitError::EmptyCart => StatusCode::BAD_REQUEST,
        SubmitError::AlreadyInFlight => StatusCode::CONFLICT,
        SubmitError::Checkout(e) => match e {
            CheckoutError::IncompleteAddress { .. } | CheckoutError::Rejected(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            CheckoutError::Http(_) | CheckoutError::Timeout(_) | CheckoutError::Parse(_) => {
                StatusCode::BAD_GATEWAY
            }
        },
        SubmitError::Store(_) | SubmitError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn other_message(err: &AppError) -> String {
    err.to_string()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server-class errors to Sentry
        if self.status().is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "request error"
            );
        }

        let body = serde_json::json!({
            "error": self.message(),
            "kind": self.kind(),
        });
        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context after successful authentication.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context on logout.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
