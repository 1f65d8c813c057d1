//! Login token store.
//!
//! Opaque tokens handed to clients map to the JWT they stand for. Expiring a
//! token flips its status without removing it, so a replayed token is told
//! apart from an unknown one.

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::cache::{HydrateMode, UpdateOptions};
use crate::config::Config;
use crate::duration::Ttl;
use crate::error::CacheError;
use crate::facade::Cache;

/// Key prefix of login tokens. Matches the default long-TTL exemption.
pub const LOGIN_TOKEN_PREFIX: &str = "AUTH::";

/// Grace period kept on top of the JWT lifetime.
const TOKEN_GRACE_MS: i64 = 86_400_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStatus {
    Active,
    Inactive,
}

/// Stored value of a login token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginTokenPayload {
    pub status: TokenStatus,
    pub jwt: String,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Login token is invalid")]
    TokenInvalid,

    #[error("Login token is no longer active")]
    TokenInactive,

    #[error(transparent)]
    Cache(#[from] CacheError),
}

#[derive(Debug, Clone)]
pub struct LoginTokens {
    cache: Cache,
    ttl_ms: i64,
}

impl LoginTokens {
    /// `jwt_ttl` is the lifetime of the JWTs being wrapped.
    pub fn new(cache: Cache, jwt_ttl: &Ttl) -> Result<Self, AuthError> {
        let jwt_ms = jwt_ttl.to_millis().map_err(CacheError::from)?;
        Ok(Self {
            cache,
            ttl_ms: jwt_ms.saturating_add(TOKEN_GRACE_MS),
        })
    }

    /// Token store whose TTL follows the configured JWT lifetime.
    pub fn from_config(cache: Cache, config: &Config) -> Result<Self, AuthError> {
        Self::new(cache, &config.jwt_ttl)
    }

    /// Stores `jwt` under a fresh token and returns the token.
    pub async fn sign(&self, jwt: impl Into<String>) -> Result<String, AuthError> {
        let token = Uuid::now_v7().to_string();
        let payload = LoginTokenPayload {
            status: TokenStatus::Active,
            jwt: jwt.into(),
        };
        self.cache
            .set_value(token_key(&token), &payload, Some(Ttl::Millis(self.ttl_ms)))
            .await?;
        Ok(token)
    }

    /// Returns the JWT behind an active token.
    pub async fn resolve(&self, token: &str) -> Result<String, AuthError> {
        let payload: LoginTokenPayload = self
            .cache
            .get_as(&token_key(token))
            .await?
            .ok_or(AuthError::TokenInvalid)?;

        match payload.status {
            TokenStatus::Active => Ok(payload.jwt),
            TokenStatus::Inactive => Err(AuthError::TokenInactive),
        }
    }

    /// Marks a token inactive. Returns false if the token is unknown.
    pub async fn expire(&self, token: &str) -> Result<bool, AuthError> {
        let outcome = self
            .cache
            .update(
                token_key(token),
                json!({ "status": TokenStatus::Inactive }),
                UpdateOptions::new().no_create().hydrate(HydrateMode::Shallow),
            )
            .await?;
        debug!(token, ?outcome, "Login token expired");
        Ok(outcome.is_success())
    }
}

fn token_key(token: &str) -> String {
    format!("{LOGIN_TOKEN_PREFIX}{token}")
}
