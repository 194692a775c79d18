//! Gemini provider configuration.

use std::time::Duration;

use crate::config::ServerConfig;
use crate::core::inference::{InferenceError, InferenceResult};

/// Configuration for the Gemini REST client.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    /// Model identifier, e.g. "gemini-2.0-flash"
    pub model: String,
    /// API base URL, e.g. "https://generativelanguage.googleapis.com/v1beta"
    pub base_url: String,
    /// Hard request timeout; the backend must fail fast, not hang
    pub timeout: Duration,
    pub temperature: f32,
    pub top_p: f32,
    pub max_output_tokens: u32,
    /// Output-token cap when a request runs in brief (conversation) mode
    pub brief_max_output_tokens: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-2.0-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout: Duration::from_secs(30),
            temperature: 0.7,
            top_p: 0.95,
            max_output_tokens: 8192,
            brief_max_output_tokens: 150,
        }
    }
}

impl GeminiConfig {
    /// Build provider config from the server configuration. The API key is
    /// required here: a gateway without a backend key cannot serve.
    pub fn from_server_config(config: &ServerConfig) -> InferenceResult<Self> {
        let api_key = config
            .gemini_api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                InferenceError::ClientInit("GEMINI_API_KEY is not configured".to_string())
            })?;

        Ok(Self {
            api_key,
            model: config.gemini_model.clone(),
            base_url: config.gemini_base_url.clone(),
            timeout: config.external_call_timeout,
            ..Default::default()
        })
    }
}
