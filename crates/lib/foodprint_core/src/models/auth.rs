//! Authentication domain models.
//!
//! These are internal domain models, distinct from the API request/response
//! shapes in `foodprint_api::models` (which use camelCase on the wire).

use serde::{Deserialize, Serialize};

/// Domain user: the public identity that access tokens describe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub avatar_url: Option<String>,
}

/// User with credential state (for internal auth flows). Never sent to clients.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    pub password_hash: String,
    /// Monotonic revocation counter; refresh tokens carry a snapshot of it.
    pub token_version: i32,
}

/// Which secret and claim set a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims embedded in access tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject — user ID (standard JWT `sub` claim).
    pub sub: String,
    /// Username at issue time. May be stale until the token expires.
    pub username: String,
    /// Avatar URL at issue time.
    pub avatar_url: Option<String>,
    pub kind: TokenKind,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
}

/// JWT claims embedded in refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Subject — user ID.
    pub sub: String,
    /// `users.token_version` when the token was issued.
    pub token_version: i32,
    pub kind: TokenKind,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
}

/// Fresh access + refresh token pair returned by login and refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}
