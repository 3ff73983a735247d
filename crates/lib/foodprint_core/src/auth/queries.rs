//! Auth-related database queries (PostgreSQL credential store).

use async_trait::async_trait;
use sqlx::PgPool;

use super::AuthError;
use super::store::CredentialStore;
use crate::models::auth::{User, UserRecord};

/// Row shape shared by the user lookups.
type UserRow = (String, String, String, Option<String>, i32);

const SELECT_USER: &str =
    "SELECT id::text, username, password_hash, avatar_url, token_version FROM users";

/// `CredentialStore` backed by the `users` table.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn into_record((id, username, password_hash, avatar_url, token_version): UserRow) -> UserRecord {
    UserRecord {
        user: User {
            id,
            username,
            avatar_url,
        },
        password_hash,
        token_version,
    }
}

/// The `users.username` unique constraint is the final word on duplicates.
fn map_unique_violation(e: sqlx::Error) -> AuthError {
    if let sqlx::Error::Database(db) = &e
        && db.is_unique_violation()
    {
        return AuthError::DuplicateUsername;
    }
    AuthError::DbError(e)
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE username = $1"))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(into_record))
    }

    async fn find_by_id(&self, user_id: &str) -> Result<Option<UserRecord>, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE id = $1::uuid"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(into_record))
    }

    async fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<UserRecord, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (username, password_hash, token_version) VALUES ($1, $2, 0) \
             RETURNING id::text, username, password_hash, avatar_url, token_version",
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique_violation)?;
        Ok(into_record(row))
    }

    async fn increment_token_version(&self, user_id: &str) -> Result<Option<i32>, AuthError> {
        let version = sqlx::query_scalar::<_, i32>(
            "UPDATE users SET token_version = token_version + 1, updated_at = now() \
             WHERE id = $1::uuid RETURNING token_version",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(version)
    }

    async fn update_username(&self, user_id: &str, username: &str) -> Result<bool, AuthError> {
        let result =
            sqlx::query("UPDATE users SET username = $2, updated_at = now() WHERE id = $1::uuid")
                .bind(user_id)
                .bind(username)
                .execute(&self.pool)
                .await
                .map_err(map_unique_violation)?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_avatar_url(
        &self,
        user_id: &str,
        avatar_url: Option<&str>,
    ) -> Result<bool, AuthError> {
        let result =
            sqlx::query("UPDATE users SET avatar_url = $2, updated_at = now() WHERE id = $1::uuid")
                .bind(user_id)
                .bind(avatar_url)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_password_hash(
        &self,
        user_id: &str,
        password_hash: &str,
    ) -> Result<bool, AuthError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1::uuid",
        )
        .bind(user_id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_user(&self, user_id: &str) -> Result<bool, AuthError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1::uuid")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), AuthError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
