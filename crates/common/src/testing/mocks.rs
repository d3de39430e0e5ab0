//! Mock implementations of the `auth` traits
//!
//! Provides mock objects for testing purposes.

// Allow missing error/panic docs for test mocks - they are designed to be simple
// and errors are clearly indicated by their return types
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use uplinkbridge_domain::{Token, TokenError, TokenResponse, TokenResult};

use crate::auth::{TokenEndpoint, TokenStore};

/// Token store holding at most one token in memory
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<Token>>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
    corrupt: AtomicBool,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new(initial: Option<Token>) -> Self {
        Self { token: Mutex::new(initial), ..Self::default() }
    }

    /// The most recently saved (or initial) token
    #[must_use]
    pub fn saved(&self) -> Option<Token> {
        self.token.lock().clone()
    }

    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make every `save` fail with an I/O error
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Make `load` report an undecryptable record
    pub fn corrupt(&self, corrupt: bool) {
        self.corrupt.store(corrupt, Ordering::SeqCst);
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn save(&self, token: &Token) -> TokenResult<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(TokenError::Io(std::io::Error::other("disk full")));
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.token.lock() = Some(token.clone());
        Ok(())
    }

    async fn load(&self) -> TokenResult<Token> {
        if self.corrupt.load(Ordering::SeqCst) {
            return Err(TokenError::Decryption("authentication tag mismatch".into()));
        }
        self.token.lock().clone().ok_or(TokenError::NotFound)
    }

    async fn delete(&self) -> TokenResult<()> {
        *self.token.lock() = None;
        Ok(())
    }
}

/// Token endpoint that counts calls and issues numbered tokens
///
/// The n-th refresh returns access token `refreshed-n`; a code exchange
/// returns `authorized`. All tokens live for 1800 seconds.
#[derive(Debug, Default)]
pub struct MockTokenEndpoint {
    refresh_calls: AtomicUsize,
    fail_refresh: AtomicBool,
    delay: Mutex<Duration>,
    last_exchange: Mutex<Option<(String, String, String)>>,
}

impl MockTokenEndpoint {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    /// Make refresh grants fail
    pub fn fail_refresh(&self, fail: bool) {
        self.fail_refresh.store(fail, Ordering::SeqCst);
    }

    /// Hold each refresh for `delay` before answering
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    /// (code, redirect URI, scope) of the last code exchange
    #[must_use]
    pub fn last_exchange(&self) -> Option<(String, String, String)> {
        self.last_exchange.lock().clone()
    }
}

#[async_trait]
impl TokenEndpoint for MockTokenEndpoint {
    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        scope: &str,
    ) -> TokenResult<TokenResponse> {
        *self.last_exchange.lock() =
            Some((code.to_string(), redirect_uri.to_string(), scope.to_string()));
        Ok(TokenResponse {
            access_token: "authorized".to_string(),
            refresh_token: Some("initial-refresh".to_string()),
            expires_in: 1800,
            token_type: Some("bearer".to_string()),
        })
    }

    async fn refresh(&self, _refresh_token: &str) -> TokenResult<TokenResponse> {
        let call = self.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;

        let delay = *self.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.fail_refresh.load(Ordering::SeqCst) {
            return Err(TokenError::RefreshFailed("invalid_grant".into()));
        }

        Ok(TokenResponse {
            access_token: format!("refreshed-{call}"),
            refresh_token: Some(format!("refresh-{call}")),
            expires_in: 1800,
            token_type: Some("bearer".to_string()),
        })
    }
}
