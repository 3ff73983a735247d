//! In-memory credential store.
//!
//! Same contract as the Postgres store, including username uniqueness and
//! the never-decreasing token version. Used by tests and by the server's
//! `--in-memory` mode.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::AuthError;
use super::store::CredentialStore;
use crate::models::auth::{User, UserRecord};

/// `CredentialStore` keyed by user id.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn username_taken(users: &HashMap<String, UserRecord>, username: &str, except: &str) -> bool {
    users
        .values()
        .any(|r| r.user.username == username && r.user.id != except)
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, AuthError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|r| r.user.username == username)
            .cloned())
    }

    async fn find_by_id(&self, user_id: &str) -> Result<Option<UserRecord>, AuthError> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<UserRecord, AuthError> {
        let mut users = self.users.write().await;
        if username_taken(&users, username, "") {
            return Err(AuthError::DuplicateUsername);
        }
        let record = UserRecord {
            user: User {
                id: Uuid::new_v4().to_string(),
                username: username.to_string(),
                avatar_url: None,
            },
            password_hash: password_hash.to_string(),
            token_version: 0,
        };
        users.insert(record.user.id.clone(), record.clone());
        Ok(record)
    }

    async fn increment_token_version(&self, user_id: &str) -> Result<Option<i32>, AuthError> {
        let mut users = self.users.write().await;
        let Some(record) = users.get_mut(user_id) else {
            return Ok(None);
        };
        record.token_version = record
            .token_version
            .checked_add(1)
            .ok_or_else(|| AuthError::Internal("token_version overflow".into()))?;
        Ok(Some(record.token_version))
    }

    async fn update_username(&self, user_id: &str, username: &str) -> Result<bool, AuthError> {
        let mut users = self.users.write().await;
        if username_taken(&users, username, user_id) {
            return Err(AuthError::DuplicateUsername);
        }
        let Some(record) = users.get_mut(user_id) else {
            return Ok(false);
        };
        record.user.username = username.to_string();
        Ok(true)
    }

    async fn update_avatar_url(
        &self,
        user_id: &str,
        avatar_url: Option<&str>,
    ) -> Result<bool, AuthError> {
        let mut users = self.users.write().await;
        let Some(record) = users.get_mut(user_id) else {
            return Ok(false);
        };
        record.user.avatar_url = avatar_url.map(str::to_string);
        Ok(true)
    }

    async fn update_password_hash(
        &self,
        user_id: &str,
        password_hash: &str,
    ) -> Result<bool, AuthError> {
        let mut users = self.users.write().await;
        let Some(record) = users.get_mut(user_id) else {
            return Ok(false);
        };
        record.password_hash = password_hash.to_string();
        Ok(true)
    }

    async fn delete_user(&self, user_id: &str) -> Result<bool, AuthError> {
        Ok(self.users.write().await.remove(user_id).is_some())
    }

    async fn ping(&self) -> Result<(), AuthError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_starts_at_version_zero() {
        let store = MemoryCredentialStore::new();
        let record = store.insert_user("alice", "digest").await.unwrap();
        assert_eq!(record.token_version, 0);
        assert_eq!(record.user.avatar_url, None);
        assert!(Uuid::parse_str(&record.user.id).is_ok());

        let found = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.user, record.user);
        let by_id = store.find_by_id(&record.user.id).await.unwrap().unwrap();
        assert_eq!(by_id.user, record.user);
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let store = MemoryCredentialStore::new();
        store.insert_user("alice", "d1").await.unwrap();
        let err = store.insert_user("alice", "d2").await.unwrap_err();
        assert!(matches!(err, AuthError::DuplicateUsername));
        let kept = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(kept.password_hash, "d1");
    }

    #[tokio::test]
    async fn token_version_increments_by_one() {
        let store = MemoryCredentialStore::new();
        let id = store.insert_user("alice", "d").await.unwrap().user.id;

        assert_eq!(store.increment_token_version(&id).await.unwrap(), Some(1));
        assert_eq!(store.increment_token_version(&id).await.unwrap(), Some(2));
        assert_eq!(store.find_by_id(&id).await.unwrap().unwrap().token_version, 2);
        assert_eq!(store.increment_token_version("nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn concurrent_increments_are_not_lost() {
        let store = std::sync::Arc::new(MemoryCredentialStore::new());
        let id = store.insert_user("alice", "d").await.unwrap().user.id;

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                let id = id.clone();
                tokio::spawn(async move { store.increment_token_version(&id).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        assert_eq!(store.find_by_id(&id).await.unwrap().unwrap().token_version, 16);
    }

    #[tokio::test]
    async fn rename_checks_other_users_only() {
        let store = MemoryCredentialStore::new();
        let alice = store.insert_user("alice", "d").await.unwrap().user.id;
        store.insert_user("bob", "d").await.unwrap();

        assert!(matches!(
            store.update_username(&alice, "bob").await,
            Err(AuthError::DuplicateUsername)
        ));
        assert!(store.update_username(&alice, "alice").await.unwrap());
        assert!(store.update_username(&alice, "alicia").await.unwrap());
        assert!(store.find_by_username("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn updates_on_missing_user_report_false() {
        let store = MemoryCredentialStore::new();
        assert!(!store.update_avatar_url("nobody", Some("x")).await.unwrap());
        assert!(!store.update_password_hash("nobody", "d").await.unwrap());
        assert!(!store.update_username("nobody", "n").await.unwrap());
        assert!(!store.delete_user("nobody").await.unwrap());
    }

    #[tokio::test]
    async fn delete_removes_user() {
        let store = MemoryCredentialStore::new();
        let id = store.insert_user("alice", "d").await.unwrap().user.id;
        assert!(store.delete_user(&id).await.unwrap());
        assert!(store.find_by_id(&id).await.unwrap().is_none());
        assert!(store.find_by_username("alice").await.unwrap().is_none());
    }
}
