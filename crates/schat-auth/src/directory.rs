//! User directory collaborator
//!
//! Credential checks and profile storage live outside this crate. The service
//! only needs lookups, inserts and the registered-user count that seeds party
//! assignment.

use async_trait::async_trait;
use parking_lot::RwLock;
use schat_core::{PartyIndex, UserId};
use schat_token::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Directory-assigned id, carried in the `id` claim
    pub id: UserId,
    /// Login name and token subject
    pub username: String,
    /// Contact address, unique per user
    pub email: String,
    /// Signing party assigned at registration; never changes
    pub party_index: PartyIndex,
}

/// A user about to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Must not be registered yet
    pub username: String,
    /// Must not be registered yet
    pub email: String,
    /// Party chosen by round-robin assignment
    pub party_index: PartyIndex,
}

/// Insert failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    /// The named field is already registered
    #[error("{0} already taken")]
    Duplicate(&'static str),

    /// Backing store failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Persistence for user records
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Number of users registered so far
    async fn current_user_count(&self) -> Result<u64, StoreError>;

    /// Look up a user by login name
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Look up a user by e-mail
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Look up a user by id
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError>;

    /// Persist `user` and assign its id. Rejects a taken username or e-mail.
    async fn insert(&self, user: NewUser) -> Result<UserRecord, DirectoryError>;
}

/// Process-local directory keyed by user id
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<BTreeMap<UserId, UserRecord>>,
}

impl InMemoryUserDirectory {
    /// Empty directory
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn current_user_count(&self) -> Result<u64, StoreError> {
        Ok(self.users.read().len() as u64)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.read().values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.read().get(&id).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<UserRecord, DirectoryError> {
        let mut users = self.users.write();
        if users.values().any(|u| u.username == user.username) {
            return Err(DirectoryError::Duplicate("username"));
        }
        if users.values().any(|u| u.email == user.email) {
            return Err(DirectoryError::Duplicate("email"));
        }
        let id = UserId(users.keys().next_back().map_or(1, |last| last.0 + 1));
        let record = UserRecord {
            id,
            username: user.username,
            email: user.email,
            party_index: user.party_index,
        };
        users.insert(id, record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            party_index: PartyIndex::try_from(1).unwrap(),
        }
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids() {
        let dir = InMemoryUserDirectory::new();
        let a = dir.insert(new_user("alice")).await.unwrap();
        let b = dir.insert(new_user("bob")).await.unwrap();
        assert_eq!((a.id, b.id), (UserId(1), UserId(2)));
        assert_eq!(dir.current_user_count().await.unwrap(), 2);
        assert_eq!(dir.find_by_username("bob").await.unwrap(), Some(b.clone()));
        assert_eq!(dir.find_by_email("alice@example.com").await.unwrap(), Some(a));
        assert_eq!(dir.find_by_id(UserId(2)).await.unwrap(), Some(b));
    }

    #[tokio::test]
    async fn duplicates_are_rejected() {
        let dir = InMemoryUserDirectory::new();
        dir.insert(new_user("alice")).await.unwrap();
        assert_matches!(
            dir.insert(new_user("alice")).await,
            Err(DirectoryError::Duplicate("username"))
        );
        let mut other = new_user("alicia");
        other.email = "alice@example.com".into();
        assert_matches!(dir.insert(other).await, Err(DirectoryError::Duplicate("email")));
    }
}
