use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::{ConfigError, ServerConfig, TlsConfig};

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration; anything omitted
/// keeps the value already loaded from the environment or defaults.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 3030
///   tls_cert_path: "/etc/tls/cert.pem"
///   tls_key_path: "/etc/tls/key.pem"
///
/// gemini:
///   api_key: "your-gemini-key"
///   model: "gemini-2.0-flash"
///   base_url: "https://generativelanguage.googleapis.com/v1beta"
///
/// media:
///   ffmpeg_path: "/usr/bin/ffmpeg"
///   ffprobe_path: "/usr/bin/ffprobe"
///
/// realtime:
///   external_call_timeout_secs: 30
///
/// security:
///   cors_allowed_origins: "https://app.example.com,https://other.example.com"
///   rate_limit_requests_per_second: 100
///   rate_limit_burst_size: 50
///   max_ws_connections: 1000
///   max_ws_connections_per_ip: 10
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub gemini: Option<GeminiYaml>,
    pub media: Option<MediaYaml>,
    pub realtime: Option<RealtimeYaml>,
    pub security: Option<SecurityYaml>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tls_cert_path: Option<PathBuf>,
    pub tls_key_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeminiYaml {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct MediaYaml {
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RealtimeYaml {
    pub external_call_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SecurityYaml {
    pub cors_allowed_origins: Option<String>,
    pub rate_limit_requests_per_second: Option<u32>,
    pub rate_limit_burst_size: Option<u32>,
    pub max_ws_connections: Option<usize>,
    pub max_ws_connections_per_ip: Option<usize>,
}

impl YamlConfig {
    /// Overlay this file's values onto `config`. YAML values win over
    /// whatever was already loaded.
    pub fn apply_to(&self, config: &mut ServerConfig) -> Result<(), ConfigError> {
        if let Some(server) = &self.server {
            if let Some(host) = &server.host {
                config.host = host.clone();
            }
            if let Some(port) = server.port {
                config.port = port;
            }
            match (&server.tls_cert_path, &server.tls_key_path) {
                (Some(cert), Some(key)) => {
                    config.tls = Some(TlsConfig {
                        cert_path: cert.clone(),
                        key_path: key.clone(),
                    });
                }
                (None, None) => {}
                _ => {
                    return Err(ConfigError::Invalid(
                        "server.tls_cert_path and server.tls_key_path must be set together"
                            .to_string(),
                    ));
                }
            }
        }

        if let Some(gemini) = &self.gemini {
            if let Some(api_key) = &gemini.api_key {
                config.gemini_api_key = Some(api_key.clone());
            }
            if let Some(model) = &gemini.model {
                config.gemini_model = model.clone();
            }
            if let Some(base_url) = &gemini.base_url {
                config.gemini_base_url = base_url.clone();
            }
        }

        if let Some(media) = &self.media {
            if let Some(path) = &media.ffmpeg_path {
                config.ffmpeg_path = path.clone();
            }
            if let Some(path) = &media.ffprobe_path {
                config.ffprobe_path = path.clone();
            }
        }

        if let Some(realtime) = &self.realtime
            && let Some(secs) = realtime.external_call_timeout_secs
        {
            config.external_call_timeout = Duration::from_secs(secs);
        }

        if let Some(security) = &self.security {
            if let Some(origins) = &security.cors_allowed_origins {
                config.cors_allowed_origins = Some(origins.clone());
            }
            if let Some(rps) = security.rate_limit_requests_per_second {
                config.rate_limit_requests_per_second = rps;
            }
            if let Some(burst) = security.rate_limit_burst_size {
                config.rate_limit_burst_size = burst;
            }
            if let Some(max) = security.max_ws_connections {
                config.max_ws_connections = max;
            }
            if let Some(max) = security.max_ws_connections_per_ip {
                config.max_ws_connections_per_ip = max;
            }
        }

        Ok(())
    }
}
