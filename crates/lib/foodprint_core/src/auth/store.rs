//! Credential store — where users, digests and token versions live.
//!
//! The session manager only talks to this trait. `PgCredentialStore`
//! (see [`super::queries`]) is the production implementation and
//! `MemoryCredentialStore` (see [`super::memory`]) backs tests and
//! database-less local runs.

use async_trait::async_trait;

use super::AuthError;
use crate::models::auth::UserRecord;

/// Point lookups and updates on the `users` table.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fetch a user by login handle.
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, AuthError>;

    /// Fetch a user by id.
    async fn find_by_id(&self, user_id: &str) -> Result<Option<UserRecord>, AuthError>;

    /// Create a user with `token_version = 0` and no avatar.
    ///
    /// Returns `AuthError::DuplicateUsername` if the name is taken.
    async fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<UserRecord, AuthError>;

    /// Atomically add one to the user's token version and return the new
    /// value. Returns `None` if the user does not exist.
    async fn increment_token_version(&self, user_id: &str) -> Result<Option<i32>, AuthError>;

    /// Rename a user. Returns `AuthError::DuplicateUsername` on conflict and
    /// `false` if the user does not exist.
    async fn update_username(&self, user_id: &str, username: &str) -> Result<bool, AuthError>;

    /// Set or clear the avatar URL. Returns `false` if the user does not exist.
    async fn update_avatar_url(
        &self,
        user_id: &str,
        avatar_url: Option<&str>,
    ) -> Result<bool, AuthError>;

    /// Replace the password digest. Returns `false` if the user does not exist.
    async fn update_password_hash(
        &self,
        user_id: &str,
        password_hash: &str,
    ) -> Result<bool, AuthError>;

    /// Delete a user. Returns `false` if the user did not exist.
    async fn delete_user(&self, user_id: &str) -> Result<bool, AuthError>;

    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), AuthError>;
}
