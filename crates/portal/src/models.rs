//! Portal-side models: session payloads and the stored account record.

use pedidoflex_core::{Email, User, UserId, UserRole};
use serde::{Deserialize, Serialize};

/// Keys for values stored in the session.
pub mod session_keys {
    /// The authenticated identity ([`super::CurrentUser`]).
    pub const CURRENT_USER: &str = "current_user";
    /// The active billing-entity context (`EntityId`).
    pub const ACTIVE_ENTITY: &str = "active_entity";
    /// The working cart ([`crate::cart::Cart`]).
    pub const CART: &str = "cart";
    /// Opaque key tying this session to its submission slot.
    pub const SUBMISSION_KEY: &str = "submission_key";
}

/// The authenticated identity carried in the session.
///
/// Deliberately excludes the owned-entity list: visibility is re-derived
/// from the user store on every request so that admin edits take effect
/// mid-session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub role: UserRole,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
        }
    }
}

/// A stored account: the public user record plus its credential hash.
///
/// Serialized only toward the persistence backend; API responses expose
/// the inner [`User`] and never the hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    #[serde(flatten)]
    pub user: User,
    pub password_hash: String,
}
