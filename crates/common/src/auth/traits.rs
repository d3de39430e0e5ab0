//! Traits for the token endpoint and token storage
//!
//! These traits enable dependency injection and testing by abstracting
//! external dependencies (the OAuth server, the filesystem).

use async_trait::async_trait;
use uplinkbridge_domain::{Token, TokenResponse, TokenResult};

/// The provider's OAuth token endpoint
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    /// Exchange a one-time authorization code for the initial token pair
    ///
    /// # Errors
    /// Returns `TokenError::ExchangeFailed` if the provider rejects the code
    /// or cannot be reached.
    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        scope: &str,
    ) -> TokenResult<TokenResponse>;

    /// Obtain a new access token with a refresh token
    ///
    /// # Errors
    /// Returns `TokenError::RefreshFailed` if the refresh grant fails.
    async fn refresh(&self, refresh_token: &str) -> TokenResult<TokenResponse>;
}

/// Persistence for the single token record
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Persist `token`, replacing any previous record
    ///
    /// # Errors
    /// Returns `TokenError::Io` or `TokenError::Serialization` on failure.
    async fn save(&self, token: &Token) -> TokenResult<()>;

    /// Load the persisted token
    ///
    /// # Errors
    /// Returns `TokenError::NotFound` when nothing has been saved and
    /// `TokenError::Decryption` when the record cannot be read back.
    async fn load(&self) -> TokenResult<Token>;

    /// Remove the persisted token. Removing a missing record is not an error.
    ///
    /// # Errors
    /// Returns `TokenError::Io` if the record exists but cannot be removed.
    async fn delete(&self) -> TokenResult<()>;
}
