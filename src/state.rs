//! Shared application state.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::ServerConfig;
use crate::core::inference::{GeminiClient, GeminiConfig, InferenceClient};
use crate::core::media::{FfmpegEncoder, MediaEncoder};
use crate::core::session::SessionStore;
use crate::errors::AppResult;

/// Why a WebSocket connection was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionLimitError {
    GlobalLimitReached,
    PerIpLimitReached,
}

/// Live WebSocket connection counts, guarded together so the check and the
/// increment are atomic.
#[derive(Debug, Default)]
struct ConnectionCounts {
    total: usize,
    per_ip: HashMap<IpAddr, usize>,
}

/// Application state shared across handlers.
///
/// The media encoder and inference client are trait objects so tests can
/// swap in fakes; the session store is owned here, never global.
pub struct AppState {
    pub config: ServerConfig,
    pub encoder: Arc<dyn MediaEncoder>,
    pub inference: Arc<dyn InferenceClient>,
    pub sessions: SessionStore,
    ws_connections: Mutex<ConnectionCounts>,
}

impl AppState {
    /// Build production state: ffmpeg encoder + Gemini client. Fails when
    /// the Gemini API key is missing.
    pub fn new(config: ServerConfig) -> AppResult<Self> {
        let encoder = Arc::new(FfmpegEncoder::from_config(&config));
        let inference = Arc::new(GeminiClient::new(GeminiConfig::from_server_config(&config)?)?);
        Ok(Self::with_collaborators(config, encoder, inference))
    }

    /// Build state around explicit collaborators (tests inject fakes here).
    pub fn with_collaborators(
        config: ServerConfig,
        encoder: Arc<dyn MediaEncoder>,
        inference: Arc<dyn InferenceClient>,
    ) -> Self {
        Self {
            config,
            encoder,
            inference,
            sessions: SessionStore::new(),
            ws_connections: Mutex::new(ConnectionCounts::default()),
        }
    }

    /// Reserve a WebSocket connection slot for `ip`.
    pub fn try_acquire_connection(&self, ip: IpAddr) -> Result<(), ConnectionLimitError> {
        let mut counts = self.ws_connections.lock();
        if counts.total >= self.config.max_ws_connections {
            return Err(ConnectionLimitError::GlobalLimitReached);
        }
        let ip_count = counts.per_ip.entry(ip).or_insert(0);
        if *ip_count >= self.config.max_ws_connections_per_ip {
            return Err(ConnectionLimitError::PerIpLimitReached);
        }
        *ip_count += 1;
        counts.total += 1;
        Ok(())
    }

    /// Release a previously acquired slot. Safe to call once per acquire.
    pub fn release_connection(&self, ip: IpAddr) {
        let mut counts = self.ws_connections.lock();
        counts.total = counts.total.saturating_sub(1);
        if let Some(ip_count) = counts.per_ip.get_mut(&ip) {
            *ip_count = ip_count.saturating_sub(1);
            if *ip_count == 0 {
                counts.per_ip.remove(&ip);
            }
        }
    }

    /// Current number of live WebSocket connections.
    pub fn active_ws_connections(&self) -> usize {
        self.ws_connections.lock().total
    }
}
