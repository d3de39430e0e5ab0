//! OAuth token endpoint over HTTP
//!
//! Implements the two grants the bridge needs against `<base>/oauth/token`:
//! `authorization_code` for the one-time setup and `refresh_token` for every
//! renewal. Client credentials are sent in the form body.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};
use uplinkbridge_common::auth::TokenEndpoint;
use uplinkbridge_domain::constants::TOKEN_ENDPOINT;
use uplinkbridge_domain::{TokenError, TokenResponse, TokenResult};

const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Token endpoint of the vendor's OAuth server
#[derive(Clone)]
pub struct OAuthEndpoint {
    http: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl fmt::Debug for OAuthEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthEndpoint")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl OAuthEndpoint {
    /// Create an endpoint for the API at `base_url`
    ///
    /// # Errors
    /// Returns `TokenError::ExchangeFailed` if the HTTP client cannot be built.
    pub fn new(base_url: &str, client_id: &str, client_secret: &str) -> TokenResult<Self> {
        let http = Client::builder()
            .timeout(TOKEN_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TokenError::ExchangeFailed(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            token_url: format!("{}{TOKEN_ENDPOINT}", base_url.trim_end_matches('/')),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        })
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    async fn grant(&self, form: &[(&str, &str)]) -> Result<TokenResponse, String> {
        let mut body = vec![
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        body.extend_from_slice(form);

        let response = self
            .http
            .post(&self.token_url)
            .header("accept", "application/json")
            .form(&body)
            .send()
            .await
            .map_err(|e| format!("token request failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(format!("token endpoint returned {status}: {text}"));
        }

        response.json::<TokenResponse>().await.map_err(|e| format!("invalid token response: {e}"))
    }
}

#[async_trait]
impl TokenEndpoint for OAuthEndpoint {
    #[instrument(skip_all)]
    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        scope: &str,
    ) -> TokenResult<TokenResponse> {
        debug!(url = %self.token_url, "Exchanging authorization code");
        self.grant(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("scope", scope),
        ])
        .await
        .map_err(TokenError::ExchangeFailed)
    }

    #[instrument(skip_all)]
    async fn refresh(&self, refresh_token: &str) -> TokenResult<TokenResponse> {
        debug!(url = %self.token_url, "Requesting refresh grant");
        self.grant(&[("grant_type", "refresh_token"), ("refresh_token", refresh_token)])
            .await
            .map_err(TokenError::RefreshFailed)
    }
}
