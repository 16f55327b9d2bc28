//! Authentication error types.

use pedidoflex_core::EmailError;
use thiserror::Error;

use crate::stores::StoreError;

/// Errors from credential verification and account management.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Email/password pair did not match an account.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An account with this email already exists.
    #[error("account already exists")]
    UserAlreadyExists,

    /// Password doesn't meet requirements.
    #[error("weak password: {0}")]
    WeakPassword(String),

    /// Email format is invalid.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Password hashing or hash parsing failed.
    #[error("password hashing error: {0}")]
    Hashing(String),

    /// The account store failed.
    #[error("account store error: {0}")]
    Store(#[from] StoreError),
}
