//! Gateway HTTP server (single port).

use crate::config::{self, Config};
use crate::line::{LineClient, SIGNATURE_HEADER};
use crate::survey::SurveyHandler;
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

/// Shared state for the gateway. Immutable after startup.
#[derive(Clone)]
pub struct GatewayState {
    pub port: u16,
    pub survey: Arc<SurveyHandler>,
}

impl GatewayState {
    /// Build state from config: resolves the LINE secrets and constructs the reply client.
    /// Fails when either the channel secret or the access token is missing.
    pub fn from_config(config: &Config) -> Result<Self> {
        let secret = config::resolve_line_channel_secret(config).context(
            "LINE channel secret not configured (set LINE_CHANNEL_SECRET or channels.line.channelSecret)",
        )?;
        let token = config::resolve_line_channel_token(config).context(
            "LINE channel access token not configured (set LINE_CHANNEL_TOKEN or channels.line.channelAccessToken)",
        )?;
        let client = LineClient::new(config.channels.line.api_base.clone(), token);
        let survey = SurveyHandler::new(secret, Arc::new(client))
            .halt_on_invalid_signature(config.webhook.halt_on_invalid_signature);
        Ok(Self {
            port: config.gateway.port,
            survey: Arc::new(survey),
        })
    }
}

/// Routes: `GET /` health and `POST <webhook_path>` LINE callback.
pub fn router(state: GatewayState, webhook_path: &str) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route(webhook_path, post(line_webhook))
        .with_state(state)
}

/// Run the gateway server; binds to config.gateway.bind:config.gateway.port.
/// Blocks until shutdown (e.g. Ctrl+C).
pub async fn run_gateway(config: Config) -> Result<()> {
    let state = GatewayState::from_config(&config)?;
    let webhook_path = config.channels.line.webhook_path.trim();
    if !webhook_path.starts_with('/') {
        anyhow::bail!(
            "channels.line.webhookPath must start with '/' (got {:?})",
            webhook_path
        );
    }
    let app = router(state, webhook_path);

    let bind_addr = format!("{}:{}", config.gateway.bind.trim(), config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!(
        "gateway listening on {} (webhook {})",
        bind_addr,
        webhook_path
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// POST /callback: LINE webhook. 400 on a bad signature, 500 when parsing or the reply fails.
async fn line_webhook(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    match state.survey.handle(&body, signature).await {
        Ok(status) => status,
        Err(e) => {
            log::error!("line webhook failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// GET / returns a simple health JSON (for probes).
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.port,
    }))
}
