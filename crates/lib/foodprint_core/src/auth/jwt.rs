//! JWT token generation and verification.
//!
//! Access and refresh tokens are HS256 JWTs signed with two independent
//! secrets. Every token carries a `kind` tag, and expiry is checked against
//! the caller's clock with no leeway.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::AuthError;
use crate::models::auth::{AccessClaims, RefreshClaims, TokenKind, User};

/// Why a token failed verification. Only ever logged; callers see
/// `AuthError::Unauthorized`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("token expired")]
    Expired,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("expected a {expected:?} token")]
    WrongKind { expected: TokenKind },
}

/// Claim sets the codec knows how to check.
trait Claims: Serialize + DeserializeOwned {
    fn kind(&self) -> TokenKind;
    fn exp(&self) -> i64;
}

impl Claims for AccessClaims {
    fn kind(&self) -> TokenKind {
        self.kind
    }

    fn exp(&self) -> i64 {
        self.exp
    }
}

impl Claims for RefreshClaims {
    fn kind(&self) -> TokenKind {
        self.kind
    }

    fn exp(&self) -> i64 {
        self.exp
    }
}

/// Generate a signed access token for `user`, valid for `ttl`.
pub fn generate_access_token(
    user: &User,
    secret: &[u8],
    ttl: Duration,
) -> Result<String, AuthError> {
    generate_access_token_at(user, secret, ttl, Utc::now())
}

/// Generate an access token as if issued at `now`.
pub fn generate_access_token_at(
    user: &User,
    secret: &[u8],
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<String, AuthError> {
    let claims = AccessClaims {
        sub: user.id.clone(),
        username: user.username.clone(),
        avatar_url: user.avatar_url.clone(),
        kind: TokenKind::Access,
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };
    encode_claims(&claims, secret)
}

/// Generate a signed refresh token carrying a `token_version` snapshot.
pub fn generate_refresh_token(
    user_id: &str,
    token_version: i32,
    secret: &[u8],
    ttl: Duration,
) -> Result<String, AuthError> {
    generate_refresh_token_at(user_id, token_version, secret, ttl, Utc::now())
}

/// Generate a refresh token as if issued at `now`.
pub fn generate_refresh_token_at(
    user_id: &str,
    token_version: i32,
    secret: &[u8],
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<String, AuthError> {
    let claims = RefreshClaims {
        sub: user_id.to_string(),
        token_version,
        kind: TokenKind::Refresh,
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };
    encode_claims(&claims, secret)
}

/// Verify an access token, returning its claims on success.
pub fn verify_access_token(token: &str, secret: &[u8]) -> Result<AccessClaims, TokenError> {
    verify_access_token_at(token, secret, Utc::now())
}

/// Verify an access token against the clock reading `now`.
pub fn verify_access_token_at(
    token: &str,
    secret: &[u8],
    now: DateTime<Utc>,
) -> Result<AccessClaims, TokenError> {
    decode_claims(token, secret, TokenKind::Access, now)
}

/// Verify a refresh token, returning its claims on success.
///
/// This only checks signature, kind and expiry. The caller still has to
/// compare `token_version` with the stored one.
pub fn verify_refresh_token(token: &str, secret: &[u8]) -> Result<RefreshClaims, TokenError> {
    verify_refresh_token_at(token, secret, Utc::now())
}

/// Verify a refresh token against the clock reading `now`.
pub fn verify_refresh_token_at(
    token: &str,
    secret: &[u8],
    now: DateTime<Utc>,
) -> Result<RefreshClaims, TokenError> {
    decode_claims(token, secret, TokenKind::Refresh, now)
}

fn encode_claims<C: Serialize>(claims: &C, secret: &[u8]) -> Result<String, AuthError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
}

fn decode_claims<C: Claims>(
    token: &str,
    secret: &[u8],
    expected: TokenKind,
    now: DateTime<Utc>,
) -> Result<C, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    // Expiry is compared against `now` below, not the library's own clock.
    validation.validate_exp = false;

    let claims = decode::<C>(token, &DecodingKey::from_secret(secret), &validation)
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed(e.to_string()),
        })?
        .claims;

    if claims.kind() != expected {
        return Err(TokenError::WrongKind { expected });
    }
    if now.timestamp() >= claims.exp() {
        return Err(TokenError::Expired);
    }
    Ok(claims)
}
