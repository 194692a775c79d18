//! Realtime event dispatch
//!
//! One handler per inbound event type. Dispatch for a single session is
//! strictly sequential (the connection loop does not read the next frame
//! until the current handler finishes), so session mutation needs no
//! locking beyond the store's per-session mutex. Every inbound event yields
//! its defined outbound acknowledgement sequence, exactly once.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use super::messages::{ClientEvent, ErrorInfo, ResponseEnvelope, ServerEvent};
use crate::core::inference::{
    InferenceClient, InferenceError, InferenceRequest, REALTIME_AUDIO_PROMPT,
    REALTIME_VIDEO_PROMPT,
};
use crate::core::media::{EncodingError, MediaEncoder, MediaKind};
use crate::core::session::{
    BufferKind, ContentPart, ConversationItem, Role, SessionConfig, SessionHandle,
};

/// Everything one session's event handlers need.
pub struct EventContext {
    pub session: SessionHandle,
    pub encoder: Arc<dyn MediaEncoder>,
    pub inference: Arc<dyn InferenceClient>,
    /// Ceiling for one encoder or inference call
    pub call_timeout: Duration,
}

/// Why a commit or response generation failed. Converted to one generic
/// client-facing error; the detail stays in the logs.
#[derive(Debug)]
enum ProcessingFailure {
    Encoding(EncodingError),
    Inference(InferenceError),
    Timeout(Duration),
    BadMediaPayload,
}

impl std::fmt::Display for ProcessingFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingFailure::Encoding(e) => write!(f, "encoding failed: {e}"),
            ProcessingFailure::Inference(e) => write!(f, "inference failed: {e}"),
            ProcessingFailure::Timeout(d) => write!(f, "external call exceeded {d:?}"),
            ProcessingFailure::BadMediaPayload => write!(f, "media payload is not valid base64"),
        }
    }
}

/// Dispatch one decoded inbound event, pushing acknowledgements to `tx`.
///
/// Send failures mean the client is gone; handlers stop pushing but state
/// mutation already performed stands (the connection loop tears the session
/// down right after).
pub async fn dispatch_event(
    ctx: &EventContext,
    event_id: &str,
    event: ClientEvent,
    tx: &mpsc::Sender<ServerEvent>,
) {
    match event {
        ClientEvent::SessionUpdate { session } => {
            handle_session_update(ctx, event_id, session, tx).await;
        }
        ClientEvent::InputAudioBufferAppend { audio } => {
            handle_buffer_append(ctx, event_id, BufferKind::Audio, audio, tx).await;
        }
        ClientEvent::InputAudioBufferCommit => {
            handle_buffer_commit(ctx, event_id, BufferKind::Audio, tx).await;
        }
        ClientEvent::InputVideoBufferAppend { video } => {
            handle_buffer_append(ctx, event_id, BufferKind::Video, video, tx).await;
        }
        ClientEvent::InputVideoBufferCommit => {
            handle_buffer_commit(ctx, event_id, BufferKind::Video, tx).await;
        }
        ClientEvent::ConversationItemCreate { item } => {
            handle_item_create(ctx, event_id, item, tx).await;
        }
        ClientEvent::ResponseCreate => {
            handle_response_create(ctx, event_id, tx).await;
        }
    }
}

/// `session.update`: replace the configuration wholesale. Omitted fields
/// were already reset to defaults at decode time.
async fn handle_session_update(
    ctx: &EventContext,
    event_id: &str,
    config: SessionConfig,
    tx: &mpsc::Sender<ServerEvent>,
) {
    let session_id = {
        let mut session = ctx.session.lock().await;
        session.config = config.clone();
        session.id.clone()
    };
    info!(session_id, "session configuration updated");

    let _ = tx
        .send(ServerEvent::SessionUpdated {
            event_id: event_id.to_string(),
            session: config,
        })
        .await;
}

/// `input_*_buffer.append`: decode the chunk and append raw bytes.
async fn handle_buffer_append(
    ctx: &EventContext,
    event_id: &str,
    kind: BufferKind,
    chunk_b64: String,
    tx: &mpsc::Sender<ServerEvent>,
) {
    let chunk = match BASE64.decode(&chunk_b64) {
        Ok(chunk) => chunk,
        Err(e) => {
            warn!(buffer = kind.as_str(), error = %e, "append chunk is not valid base64");
            let _ = tx
                .send(ServerEvent::error(
                    event_id.to_string(),
                    ErrorInfo::invalid_payload(),
                ))
                .await;
            return;
        }
    };

    let (session_id, total) = {
        let mut session = ctx.session.lock().await;
        let buffer = session.buffer_mut(kind);
        buffer.extend_from_slice(&chunk);
        let total = buffer.len();
        (session.id.clone(), total)
    };
    debug!(
        session_id,
        buffer = kind.as_str(),
        appended = chunk.len(),
        total,
        "buffer chunk appended"
    );

    let _ = tx
        .send(ServerEvent::buffer_appended(kind, event_id.to_string()))
        .await;
}

/// `input_*_buffer.commit`: drain the buffer exactly once, run the encode +
/// inference pipeline if it held anything, then acknowledge the clear.
///
/// An empty buffer never reaches the inference client: the commit is acked
/// with the clear event alone.
async fn handle_buffer_commit(
    ctx: &EventContext,
    event_id: &str,
    kind: BufferKind,
    tx: &mpsc::Sender<ServerEvent>,
) {
    let (session_id, data, instructions) = {
        let mut session = ctx.session.lock().await;
        let data = session.take_buffer(kind);
        (session.id.clone(), data, session.config.instructions.clone())
    };

    if !data.is_empty() {
        info!(
            session_id,
            buffer = kind.as_str(),
            bytes = data.len(),
            "processing committed buffer"
        );

        match process_buffer(ctx, kind, data, instructions).await {
            Ok(text) => {
                info!(session_id, buffer = kind.as_str(), chars = text.len(), "commit processed");
                let _ = tx
                    .send(ServerEvent::ResponseDone {
                        event_id: event_id.to_string(),
                        response: ResponseEnvelope::completed(event_id, text),
                    })
                    .await;
            }
            Err(failure) => {
                error!(session_id, buffer = kind.as_str(), %failure, "commit processing failed");
                let _ = tx
                    .send(ServerEvent::error(
                        event_id.to_string(),
                        ErrorInfo::processing_failed(&format!(
                            "Unable to process {}. Please try again.",
                            kind.as_str()
                        )),
                    ))
                    .await;
            }
        }
    }

    let _ = tx
        .send(ServerEvent::buffer_cleared(kind, event_id.to_string()))
        .await;
}

/// Encode a drained buffer and relay it to the inference backend.
async fn process_buffer(
    ctx: &EventContext,
    kind: BufferKind,
    data: Vec<u8>,
    instructions: Option<String>,
) -> Result<String, ProcessingFailure> {
    let encoded = match kind {
        // Realtime audio arrives as raw PCM16 capture data
        BufferKind::Audio => bounded(ctx.call_timeout, ctx.encoder.encode_pcm(data))
            .await?
            .map_err(ProcessingFailure::Encoding)?,
        BufferKind::Video => bounded(
            ctx.call_timeout,
            ctx.encoder.encode(MediaKind::Video, data, "realtime_chunk.mp4"),
        )
        .await?
        .map_err(ProcessingFailure::Encoding)?,
    };

    let request = match kind {
        BufferKind::Audio => InferenceRequest {
            text: Some(instructions.unwrap_or_else(|| REALTIME_AUDIO_PROMPT.to_string())),
            audio: vec![encoded],
            ..Default::default()
        },
        BufferKind::Video => InferenceRequest {
            text: Some(instructions.unwrap_or_else(|| REALTIME_VIDEO_PROMPT.to_string())),
            videos: vec![encoded],
            ..Default::default()
        },
    };

    let response = bounded(ctx.call_timeout, ctx.inference.generate(request))
        .await?
        .map_err(ProcessingFailure::Inference)?;
    Ok(response.text)
}

/// `conversation.item.create`: append to history and echo the stored item.
async fn handle_item_create(
    ctx: &EventContext,
    event_id: &str,
    mut item: ConversationItem,
    tx: &mpsc::Sender<ServerEvent>,
) {
    if item.id.is_none() {
        item.id = Some(format!("item_{event_id}"));
    }

    let session_id = {
        let mut session = ctx.session.lock().await;
        session.conversation.push(item.clone());
        session.id.clone()
    };
    debug!(session_id, parts = item.content.len(), "conversation item created");

    let _ = tx
        .send(ServerEvent::ConversationItemCreated {
            event_id: event_id.to_string(),
            item,
        })
        .await;
}

/// `response.create`: generate from the most recent user item. With no user
/// item in the conversation this answers with a single `no_user_message`
/// error; it never invokes the inference client.
async fn handle_response_create(
    ctx: &EventContext,
    event_id: &str,
    tx: &mpsc::Sender<ServerEvent>,
) {
    let (session_id, item, instructions) = {
        let session = ctx.session.lock().await;
        (
            session.id.clone(),
            session.last_user_item().cloned(),
            session.config.instructions.clone(),
        )
    };

    let Some(item) = item else {
        debug!(session_id, "response.create without a prior user item");
        let _ = tx
            .send(ServerEvent::error(
                event_id.to_string(),
                ErrorInfo::no_user_message(),
            ))
            .await;
        return;
    };

    match process_user_item(ctx, &item, instructions).await {
        Ok(text) => {
            info!(session_id, chars = text.len(), "response generated");
            let _ = tx
                .send(ServerEvent::ResponseDone {
                    event_id: event_id.to_string(),
                    response: ResponseEnvelope::completed(event_id, text.clone()),
                })
                .await;

            let mut session = ctx.session.lock().await;
            session.conversation.push(ConversationItem {
                id: Some(format!("item_{event_id}")),
                item_type: "message".to_string(),
                role: Role::Assistant,
                content: vec![ContentPart::Text { text }],
            });
        }
        Err(failure) => {
            error!(session_id, %failure, "response generation failed");
            let _ = tx
                .send(ServerEvent::error(
                    event_id.to_string(),
                    ErrorInfo::processing_failed(
                        "Unable to process your request. Please try again.",
                    ),
                ))
                .await;
        }
    }
}

/// Decode a user item's typed parts, run each media part through the
/// encoder, and relay the combined request to the inference backend.
async fn process_user_item(
    ctx: &EventContext,
    item: &ConversationItem,
    instructions: Option<String>,
) -> Result<String, ProcessingFailure> {
    let mut text_content: Option<String> = None;
    let mut request = InferenceRequest::default();

    for part in &item.content {
        match part {
            ContentPart::Text { text } => {
                text_content = Some(text.clone());
            }
            ContentPart::Audio { audio } => {
                let bytes = decode_part(audio)?;
                let encoded = bounded(
                    ctx.call_timeout,
                    ctx.encoder.encode(MediaKind::Audio, bytes, "item_audio.wav"),
                )
                .await?
                .map_err(ProcessingFailure::Encoding)?;
                request.audio.push(encoded);
            }
            ContentPart::Image { image } => {
                let bytes = decode_part(image)?;
                let encoded = bounded(
                    ctx.call_timeout,
                    ctx.encoder.encode(MediaKind::Image, bytes, "item_image.png"),
                )
                .await?
                .map_err(ProcessingFailure::Encoding)?;
                request.images.push(encoded);
            }
            ContentPart::Video { video } => {
                let bytes = decode_part(video)?;
                let encoded = bounded(
                    ctx.call_timeout,
                    ctx.encoder.encode(MediaKind::Video, bytes, "item_video.mp4"),
                )
                .await?
                .map_err(ProcessingFailure::Encoding)?;
                request.videos.push(encoded);
            }
        }
    }

    request.text = match (instructions, text_content) {
        (Some(instructions), Some(text)) => {
            Some(format!("{instructions}\n\nUser input: {text}"))
        }
        (Some(instructions), None) => Some(instructions),
        (None, Some(text)) => Some(text),
        (None, None) => None,
    };

    let response = bounded(ctx.call_timeout, ctx.inference.generate(request))
        .await?
        .map_err(ProcessingFailure::Inference)?;
    Ok(response.text)
}

fn decode_part(b64: &str) -> Result<Vec<u8>, ProcessingFailure> {
    BASE64
        .decode(b64)
        .map_err(|_| ProcessingFailure::BadMediaPayload)
}

/// Apply the external-call ceiling to a collaborator future.
async fn bounded<T>(
    limit: Duration,
    future: impl std::future::Future<Output = T>,
) -> Result<T, ProcessingFailure> {
    timeout(limit, future)
        .await
        .map_err(|_| ProcessingFailure::Timeout(limit))
}
