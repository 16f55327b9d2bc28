//! Authentication service.
//!
//! Real credential verification over the account store: argon2 hashes,
//! constant-shape failures. Self-registration creates a representative
//! with no assigned entities - the account works but lands in the
//! awaiting-activation state until an admin assigns billing entities.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use pedidoflex_core::{Email, User, UserId, UserRole};

use crate::models::UserAccount;
use crate::stores::UserStore;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Credential verification and account creation.
#[derive(Clone)]
pub struct AuthService {
    users: UserStore,
}

impl AuthService {
    /// Create a new authentication service over the account store.
    #[must_use]
    pub const fn new(users: UserStore) -> Self {
        Self { users }
    }

    /// Register a new representative account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(
        &self,
        email: &str,
        name: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        self.create_account(email, name, password, UserRole::Representative)
            .await
    }

    /// Create an administrator account. Used by the CLI, never exposed over
    /// HTTP.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`AuthService::register`].
    pub async fn create_admin(
        &self,
        email: &str,
        name: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        self.create_account(email, name, password, UserRole::Admin)
            .await
    }

    async fn create_account(
        &self,
        email: &str,
        name: &str,
        password: &str,
        role: UserRole,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;

        if self.users.find_by_email(&email).await.is_some() {
            return Err(AuthError::UserAlreadyExists);
        }

        let account = UserAccount {
            user: User {
                id: UserId::generate(),
                email,
                name: name.trim().to_owned(),
                role,
                entity_ids: Vec::new(),
            },
            password_hash: hash_password(password)?,
        };
        self.users.upsert(account.clone()).await?;
        Ok(account.user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is
    /// wrong - including when the email is unknown, so the two cases are
    /// indistinguishable to a caller probing for accounts.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;

        let account = self
            .users
            .find_by_email(&email)
            .await
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &account.password_hash)?;
        Ok(account.user)
    }
}

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password with argon2 and a fresh salt.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hashing(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored hash.
fn verify_password(password: &str, stored_hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| AuthError::Hashing(e.to_string()))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}
