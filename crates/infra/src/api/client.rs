//! Vendor API client
//!
//! Implements [`UplinkApi`] over HTTPS. Every request carries a bearer token
//! from the [`AccessTokenProvider`]; a 401 forces one token refresh and the
//! request is retried once with the new token. Base URL and system id are read
//! from the current configuration snapshot on every call, so a reload takes
//! effect on the next request.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{json, Map, Value};
use tracing::{debug, instrument};
use uplinkbridge_core::UplinkApi;
use uplinkbridge_domain::constants::SYSTEMS_ENDPOINT;
use uplinkbridge_domain::{ApiError, ApiResult, ParameterBatch, ParameterId};

use super::auth::AccessTokenProvider;
use super::errors::{status_error, transport_error};
use crate::config::ConfigHandle;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTPS client for the systems resource of the vendor API
pub struct UplinkClient {
    http: Client,
    auth: Arc<dyn AccessTokenProvider>,
    config: Arc<ConfigHandle>,
}

impl UplinkClient {
    /// Create a new API client
    ///
    /// # Errors
    /// Returns `ApiError::Transport` if the HTTP client cannot be built.
    pub fn new(config: Arc<ConfigHandle>, auth: Arc<dyn AccessTokenProvider>) -> ApiResult<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("uplink-bridge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { http, auth, config })
    }

    /// `<base>/api/v1/systems/<system_id><suffix>`
    fn system_url(&self, suffix: &str) -> String {
        let config = self.config.snapshot();
        format!(
            "{}{SYSTEMS_ENDPOINT}/{}{suffix}",
            config.api_base_url.trim_end_matches('/'),
            config.system_id
        )
    }

    /// Send an authenticated request, retrying once after a 401
    ///
    /// `build` is called once per attempt with the bearer token to use.
    async fn execute<F>(&self, url: &str, build: F) -> ApiResult<Response>
    where
        F: Fn(&str) -> RequestBuilder + Send + Sync,
    {
        let token = self.auth.access_token().await?;
        let response = self.send(build(&token)).await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return check_status(response, url).await;
        }

        debug!(url = %url, "Token rejected, refreshing and retrying once");
        let token = self.auth.force_refresh(&token).await?;
        let response = self.send(build(&token)).await?;
        check_status(response, url).await
    }

    async fn send(&self, request: RequestBuilder) -> ApiResult<Response> {
        request
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| transport_error(&e))
    }

    async fn get_json(&self, suffix: &str, query: &[(&str, String)]) -> ApiResult<Value> {
        let url = self.system_url(suffix);
        debug!(url = %url, "GET request");

        let response = self
            .execute(&url, |token| self.http.get(&url).bearer_auth(token).query(query))
            .await?;

        response.json::<Value>().await.map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn write(&self, method: reqwest::Method, suffix: &str, body: &Value) -> ApiResult<()> {
        let url = self.system_url(suffix);
        debug!(url = %url, method = %method, "Write request");

        self.execute(&url, |token| {
            self.http.request(method.clone(), &url).bearer_auth(token).json(body)
        })
        .await?;
        Ok(())
    }
}

async fn check_status(response: Response, url: &str) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, url, &body))
}

#[async_trait]
impl UplinkApi for UplinkClient {
    #[instrument(skip(self))]
    async fn system(&self) -> ApiResult<Value> {
        self.get_json("", &[]).await
    }

    #[instrument(skip(self))]
    async fn status(&self) -> ApiResult<Value> {
        self.get_json("/status/system", &[]).await
    }

    #[instrument(skip(self))]
    async fn software(&self) -> ApiResult<Value> {
        self.get_json("/software", &[]).await
    }

    #[instrument(skip_all, fields(batch = %batch))]
    async fn parameters(&self, batch: &ParameterBatch) -> ApiResult<Value> {
        let query: Vec<(&str, String)> =
            batch.ids().iter().map(|id| ("parameterIds", id.to_string())).collect();
        self.get_json("/parameters", &query).await
    }

    #[instrument(skip(self))]
    async fn notifications(&self) -> ApiResult<Value> {
        self.get_json("/notifications", &[]).await
    }

    #[instrument(skip(self))]
    async fn set_mode(&self, mode: &str) -> ApiResult<()> {
        self.write(reqwest::Method::PUT, "/smarthome/mode", &json!({ "mode": mode })).await
    }

    #[instrument(skip(self))]
    async fn set_parameters(&self, settings: &BTreeMap<ParameterId, String>) -> ApiResult<()> {
        let settings: Map<String, Value> = settings
            .iter()
            .map(|(id, value)| (id.to_string(), Value::String(value.clone())))
            .collect();
        self.write(reqwest::Method::PUT, "/parameters", &json!({ "settings": settings })).await
    }

    #[instrument(skip_all)]
    async fn set_thermostat(&self, thermostat: &Map<String, Value>) -> ApiResult<()> {
        self.write(
            reqwest::Method::POST,
            "/smarthome/thermostats",
            &Value::Object(thermostat.clone()),
        )
        .await
    }
}
