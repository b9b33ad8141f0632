//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.mokumoku/config.json`) and environment.
//! The LINE channel secret and access token may come from either; env wins.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Gateway server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Channel settings (LINE).
    #[serde(default)]
    pub channels: ChannelsConfig,

    /// Webhook handling options.
    #[serde(default)]
    pub webhook: WebhookConfig,
}

/// Gateway bind and port settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for HTTP (default 15152).
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    15152
}

fn default_gateway_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

/// Per-channel config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelsConfig {
    #[serde(default)]
    pub line: LineChannelConfig,
}

/// LINE Messaging API channel config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineChannelConfig {
    /// Channel secret used to verify X-Line-Signature. Overridden by LINE_CHANNEL_SECRET env when set.
    pub channel_secret: Option<String>,
    /// Channel access token used for the reply API. Overridden by LINE_CHANNEL_TOKEN env when set.
    pub channel_access_token: Option<String>,
    /// API base URL (default "https://api.line.me"). Point at a local server for testing.
    #[serde(default = "default_line_api_base")]
    pub api_base: String,
    /// Path the webhook is served on (default "/callback").
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,
}

fn default_line_api_base() -> String {
    crate::line::DEFAULT_API_BASE.to_string()
}

fn default_webhook_path() -> String {
    "/callback".to_string()
}

impl Default for LineChannelConfig {
    fn default() -> Self {
        Self {
            channel_secret: None,
            channel_access_token: None,
            api_base: default_line_api_base(),
            webhook_path: default_webhook_path(),
        }
    }
}

/// Webhook handling options.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookConfig {
    /// When true, a request with a bad signature gets 400 and its events are dropped.
    /// When false (default), the 400 is still returned but events are processed anyway.
    #[serde(default)]
    pub halt_on_invalid_signature: bool,
}

/// Trimmed, non-empty value of an env var.
fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Resolve the LINE channel secret: env LINE_CHANNEL_SECRET overrides config.
pub fn resolve_line_channel_secret(config: &Config) -> Option<String> {
    env_non_empty("LINE_CHANNEL_SECRET")
        .or_else(|| non_empty(config.channels.line.channel_secret.as_ref()))
}

/// Resolve the LINE channel access token: env LINE_CHANNEL_TOKEN overrides config.
pub fn resolve_line_channel_token(config: &Config) -> Option<String> {
    env_non_empty("LINE_CHANNEL_TOKEN")
        .or_else(|| non_empty(config.channels.line.channel_access_token.as_ref()))
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("MOKUMOKU_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".mokumoku").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path (or the default). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}
