use crate::error::{AppError, Result};
use crate::realtime::websocket::WebSocketClientConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub alerts: AlertsConfig,
    pub transport: TransportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    /// Where display preferences are persisted
    pub settings_path: PathBuf,
    /// Realtime channel carrying alert producer messages
    pub channel: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Upstream websocket endpoint; the client is not started when unset
    pub url: Option<String>,
    pub reconnect_delay_ms: u64,
    /// 0 retries forever
    pub max_reconnect_attempts: u32,
    pub ping_interval_ms: u64,
}

impl Config {
    /// Load configuration from the process environment, after `.env` if present
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Config {
            app: AppConfig {
                env: lookup("APP_ENV").unwrap_or_else(|| "development".to_string()),
                port: parse_or(&lookup, "APP_PORT", 8000)?,
            },
            alerts: AlertsConfig {
                settings_path: lookup("ALERT_SETTINGS_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("data/alert-settings.json")),
                channel: lookup("ALERTS_CHANNEL").unwrap_or_else(|| "alerts".to_string()),
            },
            transport: TransportConfig {
                url: lookup("TRANSPORT_URL").filter(|url| !url.trim().is_empty()),
                reconnect_delay_ms: parse_or(&lookup, "TRANSPORT_RECONNECT_DELAY_MS", 3000)?,
                max_reconnect_attempts: parse_or(&lookup, "TRANSPORT_MAX_RECONNECT_ATTEMPTS", 5)?,
                ping_interval_ms: parse_or(&lookup, "TRANSPORT_PING_INTERVAL_MS", 30_000)?,
            },
        })
    }

    /// Websocket client settings, if a transport URL is configured
    pub fn websocket_client(&self) -> Option<WebSocketClientConfig> {
        let url = self.transport.url.clone()?;
        Some(WebSocketClientConfig {
            url,
            reconnect_delay: Duration::from_millis(self.transport.reconnect_delay_ms),
            max_reconnect_attempts: self.transport.max_reconnect_attempts,
            ping_interval: Duration::from_millis(self.transport.ping_interval_ms.max(1)),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{key}={raw:?}: {e}"))),
        None => Ok(default),
    }
}
