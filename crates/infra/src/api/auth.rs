//! Bearer tokens for API requests

use async_trait::async_trait;
use uplinkbridge_common::auth::{TokenEndpoint, TokenManager, TokenStore};
use uplinkbridge_common::time::Clock;
use uplinkbridge_domain::ApiResult;

/// Trait for providing access tokens
///
/// This trait allows dependency injection and testing with mock providers.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// A valid access token, refreshed first if it has expired
    async fn access_token(&self) -> ApiResult<String>;

    /// Replace `rejected` after the server refused it
    ///
    /// Concurrent callers rejected with the same token share one refresh.
    async fn force_refresh(&self, rejected: &str) -> ApiResult<String>;
}

#[async_trait]
impl<E, S, C> AccessTokenProvider for TokenManager<E, S, C>
where
    E: TokenEndpoint + 'static,
    S: TokenStore + 'static,
    C: Clock,
{
    async fn access_token(&self) -> ApiResult<String> {
        Ok(self.current_token().await?.access_token)
    }

    async fn force_refresh(&self, rejected: &str) -> ApiResult<String> {
        Ok(TokenManager::force_refresh(self, rejected).await?.access_token)
    }
}
