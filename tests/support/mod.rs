//! Shared test doubles for the collaborator traits.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use tokio::sync::mpsc;

use modality_gateway::core::inference::{
    BackendInfo, InferenceClient, InferenceError, InferenceRequest, InferenceResponse,
    InferenceResult,
};
use modality_gateway::core::media::{
    EncodingError, MediaEncoder, MediaKind, VideoInfo,
};
use modality_gateway::core::session::SessionHandle;
use modality_gateway::handlers::realtime::EventContext;
use modality_gateway::handlers::realtime::messages::ServerEvent;
use modality_gateway::state::AppState;
use modality_gateway::{ServerConfig, routes};

/// One recorded call into the fake encoder.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodeCall {
    Upload {
        kind: MediaKind,
        data: Vec<u8>,
        filename: String,
    },
    Pcm {
        data: Vec<u8>,
    },
}

/// Fake media encoder: returns a fixed payload and records every call.
pub struct FakeEncoder {
    pub result: String,
    pub fail: bool,
    pub calls: Mutex<Vec<EncodeCall>>,
}

impl FakeEncoder {
    pub fn returning(result: &str) -> Arc<Self> {
        Arc::new(Self {
            result: result.to_string(),
            fail: false,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            result: String::new(),
            fail: true,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl MediaEncoder for FakeEncoder {
    async fn encode(
        &self,
        kind: MediaKind,
        data: Vec<u8>,
        filename: &str,
    ) -> Result<String, EncodingError> {
        self.calls.lock().unwrap().push(EncodeCall::Upload {
            kind,
            data,
            filename: filename.to_string(),
        });
        if self.fail {
            return Err(EncodingError::ToolFailed {
                kind,
                detail: "fake encoder failure".to_string(),
            });
        }
        Ok(self.result.clone())
    }

    async fn encode_pcm(&self, data: Vec<u8>) -> Result<String, EncodingError> {
        self.calls.lock().unwrap().push(EncodeCall::Pcm { data });
        if self.fail {
            return Err(EncodingError::ToolFailed {
                kind: MediaKind::Audio,
                detail: "fake encoder failure".to_string(),
            });
        }
        Ok(self.result.clone())
    }

    async fn probe_video(
        &self,
        _data: Vec<u8>,
        _filename: &str,
    ) -> Result<VideoInfo, EncodingError> {
        Ok(VideoInfo {
            file_size_mb: 1.0,
            duration_seconds: 2.0,
        })
    }
}

/// How the fake inference client behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferenceMode {
    Succeed,
    Unreachable,
    /// Never resolves within any sane test timeout
    Hang,
}

/// Fake inference client: fixed reply, recorded requests, switchable
/// failure modes.
pub struct FakeInference {
    pub reply: String,
    pub mode: InferenceMode,
    pub calls: Mutex<Vec<InferenceRequest>>,
}

impl FakeInference {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            mode: InferenceMode::Succeed,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn with_mode(mode: InferenceMode) -> Arc<Self> {
        Arc::new(Self {
            reply: String::new(),
            mode,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl InferenceClient for FakeInference {
    async fn generate(&self, request: InferenceRequest) -> InferenceResult<InferenceResponse> {
        self.calls.lock().unwrap().push(request);
        match self.mode {
            InferenceMode::Succeed => Ok(InferenceResponse {
                text: self.reply.clone(),
            }),
            InferenceMode::Unreachable => Err(InferenceError::BackendUnreachable(
                "backend-unreachable".to_string(),
            )),
            InferenceMode::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                unreachable!("hung call completed")
            }
        }
    }

    fn backend_info(&self) -> BackendInfo {
        BackendInfo {
            backend: "fake",
            model: "fake-model".to_string(),
            base_url: "http://fake.invalid".to_string(),
            has_api_key: true,
        }
    }
}

/// App state wired to the given fakes.
pub fn fake_state(
    encoder: Arc<FakeEncoder>,
    inference: Arc<FakeInference>,
) -> Arc<AppState> {
    Arc::new(AppState::with_collaborators(
        ServerConfig::default(),
        encoder,
        inference,
    ))
}

/// Full router (REST + realtime) over fake collaborators.
pub fn test_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/",
            axum::routing::get(modality_gateway::handlers::api::health_check),
        )
        .merge(routes::api::create_api_router())
        .merge(routes::realtime::create_realtime_router())
        .with_state(state)
}

/// Dispatch context around a fresh session plus an event channel.
pub fn event_context(
    state: &Arc<AppState>,
    session_id: &str,
    call_timeout: Duration,
) -> (EventContext, SessionHandle, mpsc::Sender<ServerEvent>, mpsc::Receiver<ServerEvent>) {
    let session = state.sessions.create(session_id).expect("fresh session id");
    let ctx = EventContext {
        session: session.clone(),
        encoder: state.encoder.clone(),
        inference: state.inference.clone(),
        call_timeout,
    };
    let (tx, rx) = mpsc::channel(64);
    (ctx, session, tx, rx)
}

/// Drain everything currently buffered in the event channel.
pub fn drain_events(rx: &mut mpsc::Receiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Spawn the app on an ephemeral port, returning its address.
pub async fn spawn_server(state: Arc<AppState>) -> SocketAddr {
    let app = test_app(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });
    addr
}
