//! Token manager with refresh-on-demand
//!
//! Manages OAuth token lifecycle:
//! - Token retrieval from the encrypted store on startup
//! - Expiry check on every access, against an injectable clock
//! - Refresh exchange serialized so concurrent callers share one refresh
//! - Initial authorization from a one-time code

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uplinkbridge_domain::{Token, TokenError, TokenResult};

use super::traits::{TokenEndpoint, TokenStore};
use crate::time::{Clock, SystemClock};

/// Owns the single in-memory token of the process
///
/// The in-memory token is authoritative: a refreshed token that fails to
/// persist is still used.
pub struct TokenManager<E, S, C = SystemClock>
where
    E: TokenEndpoint + 'static,
    S: TokenStore + 'static,
    C: Clock,
{
    endpoint: Arc<E>,
    store: Arc<S>,
    clock: C,
    current: RwLock<Option<Token>>,
    refresh_lock: Mutex<()>,
}

impl<E, S> TokenManager<E, S, SystemClock>
where
    E: TokenEndpoint + 'static,
    S: TokenStore + 'static,
{
    #[must_use]
    pub fn new(endpoint: Arc<E>, store: Arc<S>) -> Self {
        Self::with_clock(endpoint, store, SystemClock)
    }
}

impl<E, S, C> TokenManager<E, S, C>
where
    E: TokenEndpoint + 'static,
    S: TokenStore + 'static,
    C: Clock,
{
    #[must_use]
    pub fn with_clock(endpoint: Arc<E>, store: Arc<S>, clock: C) -> Self {
        Self {
            endpoint,
            store,
            clock,
            current: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Load the persisted token, if any
    ///
    /// A missing or unreadable token file leaves the manager unauthenticated;
    /// it never fails startup. An unreadable record is deleted.
    ///
    /// # Errors
    /// Returns `TokenError::Io` only for filesystem failures other than a
    /// missing file.
    pub async fn initialize(&self) -> TokenResult<bool> {
        match self.store.load().await {
            Ok(token) => {
                let expired = token.is_expired_at(self.clock.now());
                *self.current.write().await = Some(token);
                info!(expired, "Token manager initialized with stored token");
                Ok(true)
            }
            Err(TokenError::NotFound) => {
                warn!("No stored token found; authorization required");
                Ok(false)
            }
            Err(TokenError::Decryption(reason)) => {
                warn!(%reason, "Stored token unreadable; authorization required");
                // Written under another client secret; it can never be read again
                if let Err(e) = self.store.delete().await {
                    warn!(error = %e, "Unreadable token record could not be removed");
                }
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Check if a token (possibly expired) is held
    pub async fn is_authenticated(&self) -> bool {
        self.current.read().await.is_some()
    }

    /// Current token without any refresh attempt
    pub async fn snapshot(&self) -> Option<Token> {
        self.current.read().await.clone()
    }

    /// A token that is not expired, refreshing first if needed
    ///
    /// # Errors
    /// - `TokenError::AuthorizationRequired` with no token, or an expired token
    ///   and no refresh token
    /// - `TokenError::RefreshFailed` if the refresh exchange fails
    pub async fn current_token(&self) -> TokenResult<Token> {
        if let Some(token) = self.valid_token().await? {
            return Ok(token);
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited for the lock
        if let Some(token) = self.valid_token().await? {
            return Ok(token);
        }

        self.refresh_locked().await
    }

    /// Bearer string of [`TokenManager::current_token`]
    ///
    /// # Errors
    /// See [`TokenManager::current_token`].
    pub async fn access_token(&self) -> TokenResult<String> {
        self.current_token().await.map(|token| token.access_token)
    }

    /// Replace a token the server rejected, regardless of its expiry instant
    ///
    /// `rejected` is the access token the server refused. If the held token
    /// already differs from it, another caller refreshed while this one
    /// waited and the held token is returned without a new exchange.
    ///
    /// # Errors
    /// Same as [`TokenManager::current_token`].
    pub async fn force_refresh(&self, rejected: &str) -> TokenResult<Token> {
        let _guard = self.refresh_lock.lock().await;

        if let Some(token) = self.current.read().await.as_ref() {
            if token.access_token != rejected {
                debug!("Rejected token already replaced");
                return Ok(token.clone());
            }
        }

        self.refresh_locked().await
    }

    /// Exchange a one-time authorization code and persist the result
    ///
    /// # Errors
    /// Returns `TokenError::ExchangeFailed` if the exchange fails, or the
    /// store's error if the new token cannot be persisted.
    pub async fn authorize(
        &self,
        auth_code: &str,
        callback_url: &str,
        scope: &str,
    ) -> TokenResult<Token> {
        let _guard = self.refresh_lock.lock().await;

        let response = self.endpoint.exchange_code(auth_code, callback_url, scope).await?;
        let token = response.into_token(self.clock.now(), None);

        self.store.save(&token).await?;
        *self.current.write().await = Some(token.clone());

        info!(expires_at = %token.expires_at(), "Authorization completed");
        Ok(token)
    }

    /// `Some` when the held token is still valid, `None` when it must be
    /// refreshed
    async fn valid_token(&self) -> TokenResult<Option<Token>> {
        let current = self.current.read().await;
        match current.as_ref() {
            None => Err(TokenError::AuthorizationRequired),
            Some(token) if !token.is_expired_at(self.clock.now()) => Ok(Some(token.clone())),
            Some(_) => Ok(None),
        }
    }

    /// Run the refresh grant. Caller holds `refresh_lock`.
    async fn refresh_locked(&self) -> TokenResult<Token> {
        let refresh_token = {
            let current = self.current.read().await;
            match current.as_ref() {
                Some(token) if token.has_refresh_token() => token.refresh_token.clone(),
                _ => return Err(TokenError::AuthorizationRequired),
            }
        };

        debug!("Refreshing access token");
        let response = self.endpoint.refresh(&refresh_token).await.map_err(|e| match e {
            TokenError::RefreshFailed(_) => e,
            other => TokenError::RefreshFailed(other.to_string()),
        })?;
        let token = response.into_token(self.clock.now(), Some(&refresh_token));

        *self.current.write().await = Some(token.clone());

        if let Err(e) = self.store.save(&token).await {
            warn!(error = %e, "Refreshed token could not be persisted; continuing in memory");
        }

        info!(expires_at = %token.expires_at(), "Access token refreshed");
        Ok(token)
    }
}
