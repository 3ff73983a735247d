//! Session manager — registration, login, token refresh and revocation.
//!
//! Access tokens are verified statelessly. Refresh tokens are checked against
//! the stored `token_version`: bumping it (see [`SessionManager::revoke_all`])
//! invalidates every refresh token issued before the bump, while access
//! tokens already handed out stay valid until they expire.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::AuthError;
use super::config::SessionConfig;
use super::jwt;
use super::password::{hash_password_with_cost, verify_password};
use super::store::CredentialStore;
use crate::models::auth::{AccessClaims, TokenPair, User, UserRecord};

/// Issues and checks session tokens for users in a [`CredentialStore`].
pub struct SessionManager {
    store: Arc<dyn CredentialStore>,
    config: SessionConfig,
    /// Checked against when the username is unknown, so every failed login
    /// costs one bcrypt verification.
    dummy_digest: OnceCell<String>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn CredentialStore>, config: SessionConfig) -> Self {
        Self {
            store,
            config,
            dummy_digest: OnceCell::new(),
        }
    }

    /// The credential store this manager reads and writes.
    pub fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Create an account. Fails with `DuplicateUsername` if the name is taken.
    pub async fn register(&self, username: &str, password: &str) -> Result<User, AuthError> {
        validate_username(username)?;
        validate_password(password)?;

        // The store's uniqueness check still catches a concurrent insert.
        if self.store.find_by_username(username).await?.is_some() {
            return Err(AuthError::DuplicateUsername);
        }

        let pw_hash = self.hash(password).await?;
        let record = self.store.insert_user(username, &pw_hash).await?;
        info!(user_id = %record.user.id, "user registered");
        Ok(record.user)
    }

    /// Authenticate with username + password and issue a token pair.
    ///
    /// Unknown username and wrong password both yield `InvalidCredentials`.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, AuthError> {
        let Some(record) = self.store.find_by_username(username).await? else {
            let digest = self
                .dummy_digest
                .get_or_try_init(|| self.hash("foodprint-unknown-user"))
                .await?;
            self.verify(password, digest).await?;
            debug!("login rejected: unknown username");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.verify(password, &record.password_hash).await? {
            debug!(user_id = %record.user.id, "login rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let pair = self.issue_token_pair(&record)?;
        info!(user_id = %record.user.id, "user logged in");
        Ok(pair)
    }

    /// Sign an access token carrying the user's id, username and avatar.
    pub fn issue_access_token(&self, user: &User) -> Result<String, AuthError> {
        jwt::generate_access_token(
            user,
            self.config.access_secret.as_bytes(),
            self.config.access_ttl,
        )
    }

    /// Sign a refresh token carrying a snapshot of `token_version`.
    pub fn issue_refresh_token(
        &self,
        user_id: &str,
        token_version: i32,
    ) -> Result<String, AuthError> {
        jwt::generate_refresh_token(
            user_id,
            token_version,
            self.config.refresh_secret.as_bytes(),
            self.config.refresh_ttl,
        )
    }

    /// Check an access token's signature, kind and expiry. No store access.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, AuthError> {
        jwt::verify_access_token(token, self.config.access_secret.as_bytes()).map_err(|e| {
            debug!(error = %e, "access token rejected");
            AuthError::Unauthorized
        })
    }

    /// Exchange a refresh token for a new token pair.
    ///
    /// The presented token must verify, its user must still exist, and its
    /// `token_version` must equal the stored one. The new refresh token keeps
    /// the same version.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = jwt::verify_refresh_token(refresh_token, self.config.refresh_secret.as_bytes())
            .map_err(|e| {
                debug!(error = %e, "refresh token rejected");
                AuthError::Unauthorized
            })?;

        let Some(record) = self.store.find_by_id(&claims.sub).await? else {
            debug!(user_id = %claims.sub, "refresh rejected: user no longer exists");
            return Err(AuthError::Unauthorized);
        };

        if record.token_version != claims.token_version {
            debug!(
                user_id = %claims.sub,
                presented = claims.token_version,
                current = record.token_version,
                "refresh rejected: token version revoked"
            );
            return Err(AuthError::Unauthorized);
        }

        self.issue_token_pair(&record)
    }

    /// Invalidate every outstanding refresh token for a user by bumping
    /// `token_version`. Returns the new version.
    pub async fn revoke_all(&self, user_id: &str) -> Result<i32, AuthError> {
        let Some(version) = self.store.increment_token_version(user_id).await? else {
            debug!(user_id, "revoke rejected: user no longer exists");
            return Err(AuthError::Unauthorized);
        };
        info!(user_id, token_version = version, "refresh tokens revoked");
        Ok(version)
    }

    /// Rename a user and return an access token carrying the new name.
    pub async fn change_username(
        &self,
        user_id: &str,
        new_username: &str,
    ) -> Result<String, AuthError> {
        validate_username(new_username)?;
        let record = self.existing_user(user_id).await?;

        if let Some(holder) = self.store.find_by_username(new_username).await?
            && holder.user.id != user_id
        {
            return Err(AuthError::DuplicateUsername);
        }
        if !self.store.update_username(user_id, new_username).await? {
            return Err(AuthError::Unauthorized);
        }

        info!(user_id, "username changed");
        self.issue_access_token(&User {
            username: new_username.to_string(),
            ..record.user
        })
    }

    /// Set (or clear, with `None`) the avatar URL and return an access token
    /// carrying it.
    pub async fn change_avatar(
        &self,
        user_id: &str,
        avatar_url: Option<&str>,
    ) -> Result<String, AuthError> {
        if let Some(url) = avatar_url
            && url.trim().is_empty()
        {
            return Err(AuthError::ValidationError(
                "Avatar URL must not be empty".into(),
            ));
        }
        let record = self.existing_user(user_id).await?;

        if !self.store.update_avatar_url(user_id, avatar_url).await? {
            return Err(AuthError::Unauthorized);
        }

        info!(user_id, cleared = avatar_url.is_none(), "avatar changed");
        self.issue_access_token(&User {
            avatar_url: avatar_url.map(str::to_string),
            ..record.user
        })
    }

    /// Replace the password after checking the current one.
    pub async fn change_password(
        &self,
        user_id: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        validate_password(new_password)?;
        let record = self.existing_user(user_id).await?;

        if !self.verify(old_password, &record.password_hash).await? {
            debug!(user_id, "password change rejected: wrong current password");
            return Err(AuthError::InvalidCredentials);
        }

        let pw_hash = self.hash(new_password).await?;
        if !self.store.update_password_hash(user_id, &pw_hash).await? {
            return Err(AuthError::Unauthorized);
        }
        info!(user_id, "password changed");
        Ok(())
    }

    /// Delete the account. Its refresh tokens stop working immediately.
    pub async fn delete_account(&self, user_id: &str) -> Result<(), AuthError> {
        if !self.store.delete_user(user_id).await? {
            return Err(AuthError::Unauthorized);
        }
        info!(user_id, "account deleted");
        Ok(())
    }

    fn issue_token_pair(&self, record: &UserRecord) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.issue_access_token(&record.user)?,
            refresh_token: self.issue_refresh_token(&record.user.id, record.token_version)?,
        })
    }

    async fn existing_user(&self, user_id: &str) -> Result<UserRecord, AuthError> {
        self.store.find_by_id(user_id).await?.ok_or_else(|| {
            debug!(user_id, "user no longer exists");
            AuthError::Unauthorized
        })
    }

    /// bcrypt is CPU-bound; keep it off the async workers.
    async fn hash(&self, password: &str) -> Result<String, AuthError> {
        let password = password.to_owned();
        let cost = self.config.bcrypt_cost;
        tokio::task::spawn_blocking(move || hash_password_with_cost(&password, cost))
            .await
            .map_err(|e| AuthError::Internal(format!("hash task: {e}")))?
    }

    async fn verify(&self, password: &str, digest: &str) -> Result<bool, AuthError> {
        let password = password.to_owned();
        let digest = digest.to_owned();
        tokio::task::spawn_blocking(move || verify_password(&password, &digest))
            .await
            .map_err(|e| AuthError::Internal(format!("verify task: {e}")))?
    }
}

fn validate_username(username: &str) -> Result<(), AuthError> {
    if username.trim().is_empty() {
        return Err(AuthError::ValidationError(
            "Username must not be empty".into(),
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.is_empty() {
        return Err(AuthError::ValidationError(
            "Password must not be empty".into(),
        ));
    }
    Ok(())
}
