// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session token claims and issuing.

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{encode, DecodingKey, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::AuthError;

/// Lifetime of a session token.
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Claims carried by a session token (HS256).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    /// Owning user id
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// Authenticated user extracted from a verified session token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub user_id: String,
    /// Token expiration time
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<SessionClaims> for AuthenticatedUser {
    fn from(claims: SessionClaims) -> Self {
        Self {
            user_id: claims.user_id,
            expires_at: Utc.timestamp_opt(claims.exp, 0).single(),
        }
    }
}

/// Keys and lifetime used to issue and verify session tokens.
#[derive(Clone)]
pub struct AuthConfig {
    pub encoding_key: EncodingKey,
    pub decoding_key: DecodingKey,
    pub session_ttl: Duration,
}

impl AuthConfig {
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            session_ttl: SESSION_TTL,
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("session_ttl", &self.session_ttl)
            .finish_non_exhaustive()
    }
}

/// Issue a session token for `user_id`.
pub fn issue_session_token(config: &AuthConfig, user_id: &str) -> Result<String, AuthError> {
    let now = Utc::now().timestamp();
    let ttl = i64::try_from(config.session_ttl.as_secs()).unwrap_or(i64::MAX);
    let claims = SessionClaims {
        user_id: user_id.to_string(),
        iat: now,
        exp: now.saturating_add(ttl),
    };
    encode(&Header::default(), &claims, &config.encoding_key)
        .map_err(|e| AuthError::InternalError(e.to_string()))
}
