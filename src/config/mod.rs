//! Configuration module for the modality gateway
//!
//! This module handles server configuration from various sources: .env files,
//! YAML files, and environment variables. Priority: YAML > ENV vars > defaults.
//!
//! # Example
//! ```rust,no_run
//! use modality_gateway::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable fallback
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

mod yaml;

pub use yaml::YamlConfig;

/// Default bind address and port, matching the development defaults.
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3030;

/// Default Gemini REST endpoint and model.
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Ceiling for a single encoder or inference call. Unbounded external
/// latency is incompatible with holding a live WebSocket connection.
const DEFAULT_EXTERNAL_CALL_TIMEOUT_SECS: u64 = 30;

/// TLS configuration for HTTPS and WSS
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Errors produced while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Server configuration
///
/// Contains all configuration needed to run the gateway:
/// - Server settings (host, port, TLS)
/// - Gemini backend settings (API key, model, base URL)
/// - Media tool paths (ffmpeg, ffprobe)
/// - Security settings (CORS, rate limiting, connection limits)
/// - Realtime settings (external call timeout)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    /// Gemini API key. Required to start the server; absent in tests that
    /// inject fake collaborators.
    pub gemini_api_key: Option<String>,
    /// Gemini model identifier, e.g. "gemini-2.0-flash"
    pub gemini_model: String,
    /// Gemini REST base URL (overridable for mock servers)
    pub gemini_base_url: String,

    /// Path to the ffmpeg binary used for media transcoding
    pub ffmpeg_path: PathBuf,
    /// Path to the ffprobe binary used for video metadata
    pub ffprobe_path: PathBuf,

    /// Ceiling for one encoder or inference call
    pub external_call_timeout: Duration,

    // Security settings
    /// Comma-separated allowed CORS origins, or "*" for any
    pub cors_allowed_origins: Option<String>,
    pub rate_limit_requests_per_second: u32,
    pub rate_limit_burst_size: u32,
    /// Maximum concurrent WebSocket connections (global)
    pub max_ws_connections: usize,
    /// Maximum concurrent WebSocket connections per client IP
    pub max_ws_connections_per_ip: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            tls: None,
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            external_call_timeout: Duration::from_secs(DEFAULT_EXTERNAL_CALL_TIMEOUT_SECS),
            cors_allowed_origins: None,
            rate_limit_requests_per_second: 100,
            rate_limit_burst_size: 50,
            max_ws_connections: 1000,
            max_ws_connections_per_ip: 10,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, applying defaults for
    /// anything unset. `.env` loading happens in main before this is called.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("SERVER_HOST") {
            config.host = host;
        }
        if let Some(port) = env_parse::<u16>("SERVER_PORT")? {
            config.port = port;
        }

        config.gemini_api_key = env_non_empty("GEMINI_API_KEY");
        if let Some(model) = env_non_empty("GEMINI_MODEL") {
            config.gemini_model = model;
        }
        if let Some(url) = env_non_empty("GEMINI_BASE_URL") {
            config.gemini_base_url = url;
        }

        if let Some(path) = env_non_empty("FFMPEG_PATH") {
            config.ffmpeg_path = PathBuf::from(path);
        }
        if let Some(path) = env_non_empty("FFPROBE_PATH") {
            config.ffprobe_path = PathBuf::from(path);
        }

        if let Some(secs) = env_parse::<u64>("EXTERNAL_CALL_TIMEOUT_SECS")? {
            config.external_call_timeout = Duration::from_secs(secs);
        }

        config.cors_allowed_origins = env_non_empty("CORS_ALLOWED_ORIGINS");
        if let Some(rps) = env_parse::<u32>("RATE_LIMIT_REQUESTS_PER_SECOND")? {
            config.rate_limit_requests_per_second = rps;
        }
        if let Some(burst) = env_parse::<u32>("RATE_LIMIT_BURST_SIZE")? {
            config.rate_limit_burst_size = burst;
        }
        if let Some(max) = env_parse::<usize>("MAX_WS_CONNECTIONS")? {
            config.max_ws_connections = max;
        }
        if let Some(max) = env_parse::<usize>("MAX_WS_CONNECTIONS_PER_IP")? {
            config.max_ws_connections_per_ip = max;
        }

        let cert = env_non_empty("TLS_CERT_PATH");
        let key = env_non_empty("TLS_KEY_PATH");
        config.tls = match (cert, key) {
            (Some(cert), Some(key)) => Some(TlsConfig {
                cert_path: PathBuf::from(cert),
                key_path: PathBuf::from(key),
            }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::Invalid(
                    "TLS_CERT_PATH and TLS_KEY_PATH must be set together".to_string(),
                ));
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file. Environment variables fill any
    /// values the file does not specify (YAML takes priority).
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let yaml: YamlConfig = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Self::from_env()?;
        yaml.apply_to(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    /// The `host:port` address to bind.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::Invalid("host must not be empty".to_string()));
        }
        if self.gemini_model.is_empty() {
            return Err(ConfigError::Invalid(
                "gemini model must not be empty".to_string(),
            ));
        }
        if self.external_call_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "external call timeout must be non-zero".to_string(),
            ));
        }
        if self.max_ws_connections == 0 || self.max_ws_connections_per_ip == 0 {
            return Err(ConfigError::Invalid(
                "connection limits must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Read an env var, treating unset and empty as absent.
fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Read and parse an env var, erroring on malformed values rather than
/// silently falling back to defaults.
fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env_non_empty(key) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid(format!("{key} has invalid value '{raw}'"))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.address(), "127.0.0.1:3030");
        assert!(!config.is_tls_enabled());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let config = ServerConfig {
            external_call_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn validate_rejects_zero_connection_limit() {
        let config = ServerConfig {
            max_ws_connections: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn yaml_overrides_defaults() {
        let yaml: YamlConfig = serde_yaml::from_str(
            r#"
server:
  host: "0.0.0.0"
  port: 8080
gemini:
  api_key: "test-key"
  model: "gemini-2.5-pro"
security:
  max_ws_connections: 64
"#,
        )
        .unwrap();

        let mut config = ServerConfig::default();
        yaml.apply_to(&mut config).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.gemini_api_key.as_deref(), Some("test-key"));
        assert_eq!(config.gemini_model, "gemini-2.5-pro");
        assert_eq!(config.max_ws_connections, 64);
        // untouched sections keep defaults
        assert_eq!(config.rate_limit_requests_per_second, 100);
    }

    #[test]
    fn yaml_tls_requires_both_paths() {
        let yaml: YamlConfig = serde_yaml::from_str(
            r#"
server:
  tls_cert_path: "/etc/tls/cert.pem"
"#,
        )
        .unwrap();

        let mut config = ServerConfig::default();
        assert!(yaml.apply_to(&mut config).is_err());
    }
}
