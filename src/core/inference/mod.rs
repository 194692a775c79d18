//! Inference collaborator.
//!
//! The gateway never runs a model itself; it relays encoded media and text
//! to a hosted multimodal LLM. `base` defines the provider-agnostic seam,
//! `gemini` the Google Gemini REST implementation.

pub mod base;
pub mod gemini;

pub use base::{
    BackendInfo, InferenceClient, InferenceError, InferenceRequest, InferenceResponse,
    InferenceResult,
};
pub use gemini::{GeminiClient, GeminiConfig};

// Default analysis prompts for the REST endpoints.
pub const DEFAULT_AUDIO_PROMPT: &str =
    "Please transcribe this audio recording and provide any additional insights about what you hear.";
pub const DEFAULT_IMAGE_PROMPT: &str = "Please analyze this image and describe what you see.";
pub const DEFAULT_VIDEO_PROMPT: &str =
    "Please analyze this video and describe what you see, including any actions, scenes, or notable details.";
pub const DEFAULT_MULTIMODAL_PROMPT: &str = "Please analyze this content and provide insights.";

// Conversation mode trades depth for latency: short prompts, short answers.
pub const CONVERSATION_AUDIO_PROMPT: &str =
    "In one brief sentence (under 15 words), transcribe the main content.";
pub const CONVERSATION_IMAGE_PROMPT: &str =
    "In one brief sentence (under 15 words), describe what you see.";
pub const CONVERSATION_VIDEO_PROMPT: &str =
    "In one brief sentence (under 15 words), describe the main action.";
pub const CONVERSATION_MULTIMODAL_PROMPT: &str =
    "In one brief sentence (under 15 words), summarize the content.";
pub const CONVERSATION_TEXT_SUFFIX: &str =
    "\n\nIMPORTANT: Respond in ONE brief sentence only (maximum 15 words).";

// Defaults for realtime buffer commits when the session has no instructions.
pub const REALTIME_AUDIO_PROMPT: &str = "Please transcribe and respond to this audio.";
pub const REALTIME_VIDEO_PROMPT: &str = "Analyze this video content.";
