//! Portal account store.

use std::sync::Arc;

use pedidoflex_core::{Email, EntityId, UserId};
use tokio::sync::RwLock;

use super::{StoreError, decode, encode};
use crate::models::UserAccount;
use crate::persist::{SharedStore, collections};

/// The registered portal accounts.
///
/// Accounts carry their argon2 password hash for credential checks; the
/// hash never leaves this store except through the persistence backend.
#[derive(Clone)]
pub struct UserStore {
    accounts: Arc<RwLock<Vec<UserAccount>>>,
    persist: SharedStore,
}

impl UserStore {
    /// Create an empty store over the given backend.
    #[must_use]
    pub fn new(persist: SharedStore) -> Self {
        Self {
            accounts: Arc::new(RwLock::new(Vec::new())),
            persist,
        }
    }

    /// Load accounts from the backend, replacing in-memory state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or a record cannot be decoded.
    pub async fn hydrate(&self) -> Result<usize, StoreError> {
        let records = self.persist.load_all(collections::USERS).await?;
        let mut accounts = Vec::with_capacity(records.len());
        for record in records {
            accounts.push(decode::<UserAccount>(collections::USERS, record)?);
        }
        let count = accounts.len();
        *self.accounts.write().await = accounts;
        Ok(count)
    }

    /// All accounts.
    pub async fn all(&self) -> Vec<UserAccount> {
        self.accounts.read().await.clone()
    }

    /// Look up an account by id.
    pub async fn get(&self, id: &UserId) -> Option<UserAccount> {
        self.accounts
            .read()
            .await
            .iter()
            .find(|a| &a.user.id == id)
            .cloned()
    }

    /// Look up an account by email.
    ///
    /// Emails are stored normalized, so this is effectively
    /// case-insensitive.
    pub async fn find_by_email(&self, email: &Email) -> Option<UserAccount> {
        self.accounts
            .read()
            .await
            .iter()
            .find(|a| &a.user.email == email)
            .cloned()
    }

    /// Insert or replace an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the write-through to the backend fails.
    pub async fn upsert(&self, account: UserAccount) -> Result<(), StoreError> {
        let record = encode(collections::USERS, &account)?;
        let mut accounts = self.accounts.write().await;
        self.persist
            .save(collections::USERS, account.user.id.as_str(), record)
            .await?;
        match accounts.iter_mut().find(|a| a.user.id == account.user.id) {
            Some(slot) => *slot = account,
            None => accounts.insert(0, account),
        }
        Ok(())
    }

    /// Replace the set of billing entities a user owns.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UserNotFound`] if the account does not exist,
    /// or a backend error if the write-through fails.
    pub async fn assign_entities(
        &self,
        id: &UserId,
        entity_ids: Vec<EntityId>,
    ) -> Result<UserAccount, StoreError> {
        let mut accounts = self.accounts.write().await;
        let Some(account) = accounts.iter_mut().find(|a| &a.user.id == id) else {
            return Err(StoreError::UserNotFound(id.clone()));
        };
        account.user.entity_ids = entity_ids;
        let updated = account.clone();
        let record = encode(collections::USERS, &updated)?;
        self.persist
            .save(collections::USERS, id.as_str(), record)
            .await?;
        Ok(updated)
    }

    /// Remove an account.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UserNotFound`] if the account does not exist,
    /// or a backend error if the delete fails.
    pub async fn remove(&self, id: &UserId) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().await;
        let Some(index) = accounts.iter().position(|a| &a.user.id == id) else {
            return Err(StoreError::UserNotFound(id.clone()));
        };
        self.persist.delete(collections::USERS, id.as_str()).await?;
        accounts.remove(index);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pedidoflex_core::{User, UserRole};

    use super::*;
    use crate::persist::MemoryStore;

    fn account(id: &str, email: &str) -> UserAccount {
        UserAccount {
            user: User {
                id: UserId::new(id),
                email: Email::parse(email).unwrap(),
                name: "Rep".to_owned(),
                role: UserRole::Representative,
                entity_ids: Vec::new(),
            },
            password_hash: "$argon2id$stub".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_find_by_email_is_case_insensitive() {
        let store = UserStore::new(Arc::new(MemoryStore::new()));
        store
            .upsert(account("u1", "Rep@Empresa.com.br"))
            .await
            .unwrap();

        let email = Email::parse("rep@empresa.COM.BR").unwrap();
        assert!(store.find_by_email(&email).await.is_some());
    }

    #[tokio::test]
    async fn test_assign_entities_and_remove() {
        let store = UserStore::new(Arc::new(MemoryStore::new()));
        store.upsert(account("u1", "rep@empresa.com.br")).await.unwrap();

        let updated = store
            .assign_entities(&UserId::new("u1"), vec![EntityId::new("c1")])
            .await
            .unwrap();
        assert_eq!(updated.user.entity_ids, vec![EntityId::new("c1")]);

        store.remove(&UserId::new("u1")).await.unwrap();
        assert!(store.get(&UserId::new("u1")).await.is_none());

        let missing = store.remove(&UserId::new("u1")).await;
        assert!(matches!(missing, Err(StoreError::UserNotFound(_))));
    }
}
