//! Error types used throughout the bridge
//!
//! One enum per concern. The taxonomy mirrors how each failure is handled at
//! runtime: authorization failures trigger a token refresh, rate-limit and
//! server failures are transient, transport failures reconnect, parse
//! failures discard the offending message.

use std::path::PathBuf;

use thiserror::Error;

/// Token persistence and lifecycle errors
#[derive(Debug, Error)]
pub enum TokenError {
    /// No token file exists (first run)
    #[error("No stored token found")]
    NotFound,

    /// Key material mismatch or corrupt token file
    #[error("Stored token could not be decrypted: {0}")]
    Decryption(String),

    /// No valid token and no refresh token to obtain one
    #[error("Authorization required: no valid token and no refresh token available")]
    AuthorizationRequired,

    /// The refresh-token exchange failed
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    /// The authorization-code exchange failed
    #[error("Authorization code exchange failed: {0}")]
    ExchangeFailed(String),

    /// Token file could not be read or written
    #[error("Token storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Token could not be encoded for storage
    #[error("Token serialization failed: {0}")]
    Serialization(String),
}

/// Failures reported by the vendor API client
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Server error (status {status})")]
    Server { status: u16 },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Client error (status {status}): {message}")]
    Client { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error(transparent)]
    Auth(#[from] TokenError),
}

/// Categories of API errors, used to pick a log level and retry behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// 401, or no usable token
    Authorization,
    /// 429
    RateLimit,
    /// 5xx
    Server,
    /// Connection, DNS, TLS, timeout
    Transport,
    /// Other 4xx and undecodable bodies
    Client,
}

impl ApiError {
    /// Get the error category for this error
    #[must_use]
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Unauthorized(_) | Self::Auth(_) => ApiErrorCategory::Authorization,
            Self::RateLimited => ApiErrorCategory::RateLimit,
            Self::Server { .. } => ApiErrorCategory::Server,
            Self::Transport(_) => ApiErrorCategory::Transport,
            Self::Client { .. } | Self::Decode(_) => ApiErrorCategory::Client,
        }
    }

    /// Whether the failure is expected to clear up on a later cycle
    #[must_use]
    pub fn is_transient(&self) -> bool {
        !matches!(self.category(), ApiErrorCategory::Client)
    }
}

/// Convert an `ApiError` into a stable label suitable for logging.
#[must_use]
pub fn error_label(error: &ApiError) -> &'static str {
    match error.category() {
        ApiErrorCategory::Authorization => "authorization",
        ApiErrorCategory::RateLimit => "rate_limit",
        ApiErrorCategory::Server => "server",
        ApiErrorCategory::Transport => "transport",
        ApiErrorCategory::Client => "client",
    }
}

/// Inbound command topics or payloads that cannot be turned into a command
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    /// No known command family in the topic
    #[error("Unknown command topic: {0}")]
    UnknownCommand(String),

    /// Known family, unusable subfield or payload
    #[error("Malformed {family} command: {reason}")]
    Malformed { family: &'static str, reason: String },
}

/// Raw API responses that do not have the expected shape
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Unexpected response shape: {0}")]
    Parse(String),

    #[error("Parameter batch of {0} ids exceeds the page size")]
    BatchTooLarge(usize),
}

/// Message bus failures
#[derive(Debug, Error)]
pub enum BusError {
    #[error("Broker transport error: {0}")]
    Transport(String),

    #[error("Not connected to broker")]
    NotConnected,

    #[error("Message bridge closed")]
    Closed,
}

/// Configuration loading failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config format: {0}")]
    Parse(String),

    #[error("Invalid config value: {0}")]
    Invalid(String),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),
}

/// Result type alias for API operations
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Result type alias for token operations
pub type TokenResult<T> = std::result::Result<T, TokenError>;
