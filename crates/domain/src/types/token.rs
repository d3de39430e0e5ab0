//! OAuth token record

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_TOKEN_TYPE;

/// OAuth 2.0 access/refresh token pair with its validity window
///
/// `issued_at + ttl_seconds` is the authoritative expiry instant. The token
/// is replaced as a whole on refresh, never patched.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,

    /// Empty when the provider did not issue one
    #[serde(default)]
    pub refresh_token: String,

    #[serde(with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    #[serde(rename = "expires_in")]
    pub ttl_seconds: i64,

    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    DEFAULT_TOKEN_TYPE.to_string()
}

impl Token {
    #[must_use]
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        issued_at: DateTime<Utc>,
        ttl_seconds: i64,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            issued_at,
            ttl_seconds,
            token_type: default_token_type(),
        }
    }

    /// Instant after which the access token is no longer valid
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        let ttl = TimeDelta::try_seconds(self.ttl_seconds).unwrap_or(TimeDelta::MAX);
        self.issued_at.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// A token is expired once `now` is strictly past its expiry instant
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at()
    }

    #[must_use]
    pub fn has_refresh_token(&self) -> bool {
        !self.refresh_token.is_empty()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("issued_at", &self.issued_at)
            .field("ttl_seconds", &self.ttl_seconds)
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Token endpoint response (RFC 6749 section 5.1)
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    pub token_type: Option<String>,
}

impl TokenResponse {
    /// Build the token this response grants, issued at `issued_at`.
    ///
    /// Providers may omit the refresh token on a refresh grant; the previous
    /// one stays valid in that case.
    #[must_use]
    pub fn into_token(self, issued_at: DateTime<Utc>, previous_refresh: Option<&str>) -> Token {
        let refresh_token = self
            .refresh_token
            .or_else(|| previous_refresh.map(str::to_string))
            .unwrap_or_default();

        Token {
            access_token: self.access_token,
            refresh_token,
            issued_at,
            ttl_seconds: self.expires_in,
            token_type: self.token_type.unwrap_or_else(default_token_type),
        }
    }
}
