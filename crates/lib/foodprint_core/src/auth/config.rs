//! Session configuration — signing secrets, token lifetimes, hash cost.

use std::fmt;

use chrono::Duration;

use super::AuthError;
use super::password::BCRYPT_COST;

/// Access token lifetime: 15 minutes.
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;

/// Refresh token lifetime: 7 days.
pub const DEFAULT_REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Everything the session manager needs, resolved once at startup.
#[derive(Clone)]
pub struct SessionConfig {
    /// HS256 secret for access tokens.
    pub access_secret: String,
    /// HS256 secret for refresh tokens. Must differ from `access_secret`.
    pub refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub bcrypt_cost: u32,
}

impl SessionConfig {
    /// Build a config with default lifetimes and cost.
    pub fn new(
        access_secret: impl Into<String>,
        refresh_secret: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let config = Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl: Duration::seconds(DEFAULT_ACCESS_TOKEN_TTL_SECS),
            refresh_ttl: Duration::seconds(DEFAULT_REFRESH_TOKEN_TTL_SECS),
            bcrypt_cost: BCRYPT_COST,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reads configuration from environment variables.
    ///
    /// | Variable                 | Default          |
    /// |--------------------------|------------------|
    /// | `ACCESS_TOKEN_SECRET`    | required         |
    /// | `REFRESH_TOKEN_SECRET`   | required         |
    /// | `ACCESS_TOKEN_TTL_SECS`  | `900`            |
    /// | `REFRESH_TOKEN_TTL_SECS` | `604800`         |
    /// | `BCRYPT_COST`            | `10`             |
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`SessionConfig::from_env`] over an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let access_secret = required_secret(&lookup, "ACCESS_TOKEN_SECRET")?;
        let refresh_secret = required_secret(&lookup, "REFRESH_TOKEN_SECRET")?;

        let config = Self {
            access_secret,
            refresh_secret,
            access_ttl: ttl(&lookup, "ACCESS_TOKEN_TTL_SECS", DEFAULT_ACCESS_TOKEN_TTL_SECS)?,
            refresh_ttl: ttl(&lookup, "REFRESH_TOKEN_TTL_SECS", DEFAULT_REFRESH_TOKEN_TTL_SECS)?,
            bcrypt_cost: match lookup("BCRYPT_COST") {
                Some(raw) => raw.trim().parse().map_err(|_| {
                    AuthError::Configuration(format!("BCRYPT_COST is not a number: {raw}"))
                })?,
                None => BCRYPT_COST,
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Override the hash cost (tests use the bcrypt minimum of 4).
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    /// Override both token lifetimes.
    pub fn with_ttls(mut self, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        self.access_ttl = access_ttl;
        self.refresh_ttl = refresh_ttl;
        self
    }

    fn validate(&self) -> Result<(), AuthError> {
        if self.access_secret.is_empty() || self.refresh_secret.is_empty() {
            return Err(AuthError::Configuration(
                "token signing secrets must not be empty".into(),
            ));
        }
        if self.access_secret == self.refresh_secret {
            return Err(AuthError::Configuration(
                "access and refresh token secrets must differ".into(),
            ));
        }
        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(AuthError::Configuration(format!(
                "BCRYPT_COST must be between 4 and 31, got {}",
                self.bcrypt_cost
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

fn required_secret<F>(lookup: &F, key: &str) -> Result<String, AuthError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(secret) if !secret.trim().is_empty() => Ok(secret),
        _ => Err(AuthError::Configuration(format!("{key} is not set"))),
    }
}

fn ttl<F>(lookup: &F, key: &str, default_secs: i64) -> Result<Duration, AuthError>
where
    F: Fn(&str) -> Option<String>,
{
    let secs = match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|_| AuthError::Configuration(format!("{key} is not a number: {raw}")))?,
        None => default_secs,
    };
    if secs <= 0 {
        return Err(AuthError::Configuration(format!("{key} must be positive")));
    }
    Duration::try_seconds(secs)
        .ok_or_else(|| AuthError::Configuration(format!("{key} is out of range")))
}
