//! Gemini REST client implementing the `InferenceClient` trait.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, info};

use super::config::GeminiConfig;
use super::messages::{
    Blob, Content, GeminiErrorResponse, GenerateContentRequest, GenerateContentResponse,
    GenerationConfig, Part,
};
use crate::core::inference::{
    BackendInfo, CONVERSATION_TEXT_SUFFIX, InferenceClient, InferenceError, InferenceRequest,
    InferenceResponse, InferenceResult,
};
use crate::core::media::MediaKind;

/// Returned when the backend produces an empty candidate list. The upstream
/// contract is a text answer, so an apology beats an empty string.
const EMPTY_RESPONSE_FALLBACK: &str =
    "I apologize, but I couldn't generate a response. Please try again.";

/// Gemini inference client.
///
/// The HTTP client is reused across requests for connection pooling and
/// carries a hard timeout so an unreachable backend fails fast.
pub struct GeminiClient {
    http: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> InferenceResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| InferenceError::ClientInit(e.to_string()))?;
        Ok(Self { http, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Assemble content parts: media first, text last. Text carries more
    /// weight at the end of the context for this backend.
    fn build_parts(&self, request: &InferenceRequest) -> Vec<Part> {
        let mut parts = Vec::new();

        for image in &request.images {
            parts.push(Part::InlineData(Blob {
                mime_type: MediaKind::Image.inference_mime_type().to_string(),
                data: image.clone(),
            }));
        }
        for audio in &request.audio {
            parts.push(Part::InlineData(Blob {
                mime_type: MediaKind::Audio.inference_mime_type().to_string(),
                data: audio.clone(),
            }));
        }
        for video in &request.videos {
            parts.push(Part::InlineData(Blob {
                mime_type: MediaKind::Video.inference_mime_type().to_string(),
                data: video.clone(),
            }));
        }

        if let Some(text) = &request.text
            && !text.is_empty()
        {
            let text = if request.brief {
                format!("{text}{CONVERSATION_TEXT_SUFFIX}")
            } else {
                text.clone()
            };
            parts.push(Part::Text(text));
        }

        parts
    }

    fn map_transport_error(&self, error: reqwest::Error) -> InferenceError {
        if error.is_timeout() {
            InferenceError::Timeout(self.config.timeout)
        } else {
            InferenceError::BackendUnreachable(error.without_url().to_string())
        }
    }
}

#[async_trait]
impl InferenceClient for GeminiClient {
    async fn generate(&self, request: InferenceRequest) -> InferenceResult<InferenceResponse> {
        if !request.has_input() {
            error!("no inputs provided for inference");
            return Err(InferenceError::NoInput);
        }

        info!(model = %self.config.model, inputs = %request.summary(), "inference request");

        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: self.build_parts(&request),
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                top_p: self.config.top_p,
                max_output_tokens: if request.brief {
                    self.config.brief_max_output_tokens
                } else {
                    self.config.max_output_tokens
                },
            },
        };

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<GeminiErrorResponse>(&raw)
                .map(|e| e.error.message)
                .unwrap_or(raw);
            error!(status = status.as_u16(), %detail, "backend rejected request");
            return Err(InferenceError::BackendRejected {
                status: status.as_u16(),
                detail,
            });
        }

        let parsed: GenerateContentResponse =
            response
                .json()
                .await
                .map_err(|e| InferenceError::BackendRejected {
                    status: status.as_u16(),
                    detail: format!("invalid response body: {e}"),
                })?;

        let mut text = parsed.text();
        if text.is_empty() {
            error!("backend returned an empty response");
            text = EMPTY_RESPONSE_FALLBACK.to_string();
        }

        debug!(chars = text.len(), "inference response received");
        Ok(InferenceResponse { text })
    }

    fn backend_info(&self) -> BackendInfo {
        BackendInfo {
            backend: "gemini",
            model: self.config.model.clone(),
            base_url: self.config.base_url.clone(),
            has_api_key: !self.config.api_key.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GeminiClient {
        GeminiClient::new(GeminiConfig {
            api_key: "test-key".to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn endpoint_joins_base_url_and_model() {
        let client = client();
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn media_parts_precede_text() {
        let client = client();
        let request = InferenceRequest {
            text: Some("describe".to_string()),
            audio: vec!["QQ==".to_string()],
            images: vec!["Qg==".to_string()],
            ..Default::default()
        };

        let parts = client.build_parts(&request);
        assert_eq!(parts.len(), 3);
        assert!(matches!(&parts[0], Part::InlineData(b) if b.mime_type == "image/png"));
        assert!(matches!(&parts[1], Part::InlineData(b) if b.mime_type == "audio/mp3"));
        assert!(matches!(&parts[2], Part::Text(t) if t == "describe"));
    }

    #[test]
    fn brief_mode_appends_suffix() {
        let client = client();
        let request = InferenceRequest {
            text: Some("summarize".to_string()),
            brief: true,
            ..Default::default()
        };

        let parts = client.build_parts(&request);
        match &parts[0] {
            Part::Text(text) => assert!(text.ends_with(CONVERSATION_TEXT_SUFFIX)),
            other => panic!("expected text part, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn no_input_fails_before_any_network_call() {
        let client = client();
        let err = client.generate(InferenceRequest::default()).await.unwrap_err();
        assert!(matches!(err, InferenceError::NoInput));
    }

    #[test]
    fn backend_info_reports_key_presence() {
        let info = client().backend_info();
        assert_eq!(info.backend, "gemini");
        assert!(info.has_api_key);
    }
}
