//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file when present).

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub gateway: GatewayConfig,
    pub cache: CacheConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default)]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Socket gateway configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_url")]
    pub url: String,
    /// Cookie header produced by the login flow
    pub auth_cookie: String,
    /// Teams to open a per-team socket for
    #[serde(default)]
    pub team_ids: Vec<String>,
    #[serde(default)]
    pub disable_team_websockets: bool,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_reconnect_base_secs")]
    pub reconnect_base_secs: u64,
    #[serde(default = "default_heartbeat_block_warn_secs")]
    pub heartbeat_block_warn_secs: u64,
}

impl GatewayConfig {
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    #[must_use]
    pub fn reconnect_base(&self) -> Duration {
        Duration::from_secs(self.reconnect_base_secs)
    }

    #[must_use]
    pub fn heartbeat_block_warn(&self) -> Duration {
        Duration::from_secs(self.heartbeat_block_warn_secs)
    }
}

/// Local cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Bound on cached messages; `0` disables the message cache
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
}

// Default value functions
fn default_app_name() -> String {
    "guilded-gateway".to_string()
}

fn default_gateway_url() -> String {
    "wss://api.guilded.gg/socket.io/?jwt=undefined&EIO=3&transport=websocket".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    60
}

fn default_reconnect_base_secs() -> u64 {
    5
}

fn default_heartbeat_block_warn_secs() -> u64 {
    10
}

fn default_max_messages() -> usize {
    1000
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Ok(Self {
            app: AppSettings {
                name: var("APP_NAME").unwrap_or_else(default_app_name),
                env: var("APP_ENV")
                    .and_then(|s| Environment::parse(&s))
                    .unwrap_or_default(),
            },
            gateway: GatewayConfig {
                url: var("GUILDED_GATEWAY_URL").unwrap_or_else(default_gateway_url),
                auth_cookie: var("GUILDED_AUTH_COOKIE")
                    .ok_or(ConfigError::MissingVar("GUILDED_AUTH_COOKIE"))?,
                team_ids: var("GUILDED_TEAM_IDS")
                    .map(|s| {
                        s.split(',')
                            .map(str::trim)
                            .filter(|id| !id.is_empty())
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or_default(),
                disable_team_websockets: parse_bool(
                    "GUILDED_DISABLE_TEAM_WEBSOCKETS",
                    var("GUILDED_DISABLE_TEAM_WEBSOCKETS"),
                )?,
                connect_timeout_secs: parse_or(
                    "GUILDED_CONNECT_TIMEOUT_SECS",
                    var("GUILDED_CONNECT_TIMEOUT_SECS"),
                    default_connect_timeout_secs,
                )?,
                reconnect_base_secs: parse_or(
                    "GUILDED_RECONNECT_BASE_SECS",
                    var("GUILDED_RECONNECT_BASE_SECS"),
                    default_reconnect_base_secs,
                )?,
                heartbeat_block_warn_secs: parse_or(
                    "GUILDED_HEARTBEAT_BLOCK_WARN_SECS",
                    var("GUILDED_HEARTBEAT_BLOCK_WARN_SECS"),
                    default_heartbeat_block_warn_secs,
                )?,
            },
            cache: CacheConfig {
                max_messages: parse_or(
                    "GUILDED_MAX_MESSAGES",
                    var("GUILDED_MAX_MESSAGES"),
                    default_max_messages,
                )?,
            },
        })
    }
}

fn parse_or<T: FromStr>(
    key: &'static str,
    value: Option<String>,
    default: fn() -> T,
) -> Result<T, ConfigError> {
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        None => Ok(default()),
    }
}

fn parse_bool(key: &'static str, value: Option<String>) -> Result<bool, ConfigError> {
    match value.as_deref().map(str::trim) {
        None => Ok(false),
        Some(raw) => match raw.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue(key, raw.to_string())),
        },
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
