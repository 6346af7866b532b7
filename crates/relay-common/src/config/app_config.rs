//! Application configuration structs
//!
//! Loads configuration from environment variables (and an optional `.env` file).

use serde::Deserialize;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub server: ServerConfig,
    pub hub: HubSettings,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
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
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "development" => Ok(Self::Development),
            other => Err(ConfigError::InvalidValue("APP_ENV", other.to_string())),
        }
    }
}

/// HTTP / WebSocket listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Resolve the listen address
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.address()
            .parse()
            .map_err(|_| ConfigError::InvalidValue("RELAY_HOST", self.address()))
    }
}

/// Broadcast hub tuning
#[derive(Debug, Clone, Deserialize)]
pub struct HubSettings {
    /// Capacity of the inbound envelope queue shared by all producers
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Capacity of each connection's outbound buffer
    #[serde(default = "default_connection_buffer")]
    pub connection_buffer: usize,
    /// Upper bound on a single send into a full outbound buffer; `None` waits indefinitely
    #[serde(default)]
    pub send_timeout_ms: Option<u64>,
}

impl HubSettings {
    #[must_use]
    pub fn send_timeout(&self) -> Option<Duration> {
        self.send_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            connection_buffer: default_connection_buffer(),
            send_timeout_ms: None,
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "nav-relay".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9000
}

fn default_queue_capacity() -> usize {
    256
}

fn default_connection_buffer() -> usize {
    100
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppSettings {
                name: default_app_name(),
                env: default_env(),
            },
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
            },
            hub: HubSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a variable is present but cannot be parsed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = match lookup("APP_ENV") {
            Some(value) => value.parse()?,
            None => default_env(),
        };

        let queue_capacity = parse_or(&lookup, "HUB_QUEUE_CAPACITY", default_queue_capacity)?;
        if queue_capacity == 0 {
            return Err(ConfigError::InvalidValue("HUB_QUEUE_CAPACITY", "0".to_string()));
        }

        let connection_buffer =
            parse_or(&lookup, "CONNECTION_BUFFER_SIZE", default_connection_buffer)?;
        if connection_buffer == 0 {
            return Err(ConfigError::InvalidValue("CONNECTION_BUFFER_SIZE", "0".to_string()));
        }

        // 0 means no timeout
        let send_timeout_ms = parse_or(&lookup, "SEND_TIMEOUT_MS", || 0u64)?;

        Ok(Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env,
            },
            server: ServerConfig {
                host: lookup("RELAY_HOST").unwrap_or_else(default_host),
                port: parse_or(&lookup, "RELAY_PORT", default_port)?,
            },
            hub: HubSettings {
                queue_capacity,
                connection_buffer,
                send_timeout_ms: (send_timeout_ms > 0).then_some(send_timeout_ms),
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: impl FnOnce() -> T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        None => Ok(default()),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
