//! Base trait and types for inference providers.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during an inference call.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// The request contained neither text nor media
    #[error("no input provided")]
    NoInput,

    /// HTTP client could not be constructed
    #[error("failed to construct HTTP client: {0}")]
    ClientInit(String),

    /// Backend could not be reached (connect failure, DNS, TLS)
    #[error("inference backend unreachable: {0}")]
    BackendUnreachable(String),

    /// Backend answered with an error status (auth, quota, bad request)
    #[error("inference backend rejected the request ({status}): {detail}")]
    BackendRejected { status: u16, detail: String },

    /// The call exceeded the configured ceiling
    #[error("inference request timed out after {0:?}")]
    Timeout(Duration),
}

pub type InferenceResult<T> = Result<T, InferenceError>;

/// One inference request: an optional text prompt plus zero or more
/// base64-encoded media payloads, already normalized by the media encoder.
#[derive(Debug, Clone, Default)]
pub struct InferenceRequest {
    pub text: Option<String>,
    pub audio: Vec<String>,
    pub images: Vec<String>,
    pub videos: Vec<String>,
    /// Conversation mode: brief answers, capped output tokens
    pub brief: bool,
}

impl InferenceRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            text: Some(prompt.into()),
            ..Default::default()
        }
    }

    pub fn has_input(&self) -> bool {
        self.text.as_deref().is_some_and(|t| !t.is_empty())
            || !self.audio.is_empty()
            || !self.images.is_empty()
            || !self.videos.is_empty()
    }

    /// Short description of the inputs for logging (never the payloads).
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(text) = &self.text {
            parts.push(format!("text({} chars)", text.len()));
        }
        if !self.audio.is_empty() {
            parts.push(format!("audio({})", self.audio.len()));
        }
        if !self.images.is_empty() {
            parts.push(format!("images({})", self.images.len()));
        }
        if !self.videos.is_empty() {
            parts.push(format!("videos({})", self.videos.len()));
        }
        parts.join(", ")
    }
}

/// Generated output from the backend.
#[derive(Debug, Clone)]
pub struct InferenceResponse {
    pub text: String,
}

/// Backend description for health and config endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct BackendInfo {
    pub backend: &'static str,
    pub model: String,
    pub base_url: String,
    pub has_api_key: bool,
}

/// Inference collaborator: relays a prompt plus encoded media to a hosted
/// model and returns the generated text. Implementations are stateless
/// between calls and must fail fast on an unreachable backend.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn generate(&self, request: InferenceRequest) -> InferenceResult<InferenceResponse>;

    fn backend_info(&self) -> BackendInfo;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_request_has_no_input() {
        assert!(!InferenceRequest::default().has_input());
        assert!(!InferenceRequest::text("").has_input());
    }

    #[test]
    fn any_modality_counts_as_input() {
        assert!(InferenceRequest::text("hello").has_input());

        let request = InferenceRequest {
            audio: vec!["QUJD".to_string()],
            ..Default::default()
        };
        assert!(request.has_input());
    }

    #[test]
    fn summary_reports_counts_not_payloads() {
        let request = InferenceRequest {
            text: Some("analyze".to_string()),
            images: vec!["aGVsbG8=".to_string(); 2],
            ..Default::default()
        };
        let summary = request.summary();
        assert_eq!(summary, "text(7 chars), images(2)");
        assert!(!summary.contains("aGVsbG8="));
    }
}
