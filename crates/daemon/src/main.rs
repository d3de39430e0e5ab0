//! Uplink Bridge daemon
//!
//! Polls the vendor telemetry API, publishes readings to MQTT, and forwards
//! `<prefix>/Set/...` messages back to the API as control calls.

mod cli;
mod logging;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uplinkbridge_common::{FileTokenStore, TokenManager};
use uplinkbridge_core::{MessageBus, UplinkApi};
use uplinkbridge_domain::constants::DEFAULT_SCOPE;
use uplinkbridge_domain::BridgeConfig;
use uplinkbridge_infra::{ConfigHandle, MqttBridge, OAuthEndpoint, PollScheduler, UplinkClient};

use crate::cli::{Cli, Command};

type BridgeTokens = TokenManager<OAuthEndpoint, FileTokenStore>;

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; values there feed UPLINK_BRIDGE_CONFIG and RUST_LOG
    let dotenv = dotenvy::dotenv();

    let Cli { config: path, command } = cli::parse();
    let config = Arc::new(
        ConfigHandle::load(&path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
    );

    let snapshot = config.snapshot();
    logging::init(&snapshot.log_level);
    match dotenv {
        Ok(env_path) => info!(path = %env_path.display(), "Loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, "Could not load .env file"),
    }
    info!(path = %path.display(), system_id = snapshot.system_id, "Configuration loaded");

    let tokens = Arc::new(token_manager(&snapshot)?);

    match command {
        Some(Command::Authorize { code, callback_url }) => {
            tokens
                .authorize(&code, &callback_url, DEFAULT_SCOPE)
                .await
                .context("authorization code exchange failed")?;
            info!("Authorization stored; start the bridge without 'authorize' to run");
            Ok(())
        }
        None => run(config, tokens).await,
    }
}

fn token_manager(config: &BridgeConfig) -> Result<BridgeTokens> {
    let endpoint =
        OAuthEndpoint::new(&config.api_base_url, &config.client_id, &config.client_secret)
            .context("failed to build token endpoint")?;
    let store = FileTokenStore::new(
        &config.token_dir,
        &config.api_base_url,
        &config.client_id,
        &config.client_secret,
    );
    Ok(TokenManager::new(Arc::new(endpoint), Arc::new(store)))
}

async fn run(config: Arc<ConfigHandle>, tokens: Arc<BridgeTokens>) -> Result<()> {
    match tokens.initialize().await {
        Ok(true) => info!("Loaded stored token"),
        Ok(false) => warn!("No usable token; run with 'authorize <CODE> <CALLBACK_URL>' first"),
        Err(e) => warn!(error = %e, "Failed to load stored token"),
    }

    let api: Arc<dyn UplinkApi> = Arc::new(
        UplinkClient::new(Arc::clone(&config), tokens).context("failed to build API client")?,
    );
    let bus: Arc<dyn MessageBus> = Arc::new(MqttBridge::new(config.snapshot().mqtt_settings()));
    let scheduler = PollScheduler::new(config, api, bus).context("failed to build scheduler")?;

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    info!("Uplink Bridge starting");
    scheduler.run(cancel).await.context("scheduler stopped with an error")?;
    info!("Uplink Bridge stopped");
    Ok(())
}

async fn cancel_on_signal(cancel: CancellationToken) {
    match shutdown_signal().await {
        Ok(signal) => {
            info!(signal, "Shutdown requested");
            cancel.cancel();
        }
        // Keep running; the process can still be killed
        Err(e) => error!(error = %e, "Failed to listen for shutdown signals"),
    }
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map(|()| "SIGINT"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|()| "ctrl-c")
}
