//! Public types for the connection manager.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use companion_protocol::session::sanitize_session_id;

use crate::url::connection_url;

/// Connection status of a [`ConnectionManager`](crate::ConnectionManager).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// No socket and no pending retry.
    #[default]
    Disconnected,
    /// WebSocket handshake in progress.
    Connecting,
    /// Socket open; messages flow both ways.
    Connected,
    /// Connection lost, a retry timer is pending.
    Reconnecting,
}

impl ConnectionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The (host, session) pair a manager is bound to.
///
/// The session id is sanitized on construction, so every URL built from an
/// identity only ever carries `[A-Za-z0-9_-]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionIdentity {
    host_url: String,
    session_id: String,
}

impl ConnectionIdentity {
    pub fn new(host_url: &str, session_id: &str) -> Self {
        Self {
            host_url: host_url.trim().to_string(),
            session_id: sanitize_session_id(session_id),
        }
    }

    pub fn host_url(&self) -> &str {
        &self.host_url
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Whether both the host and the sanitized session id are non-empty.
    pub fn is_complete(&self) -> bool {
        !self.host_url.is_empty() && !self.session_id.is_empty()
    }

    /// WebSocket URL for this identity, or `None` if it is incomplete.
    pub fn connection_url(&self) -> Option<String> {
        self.is_complete()
            .then(|| connection_url(&self.host_url, &self.session_id))
    }
}

/// Reconnection schedule: `delay(n) = min(base_delay * 2^n, max_delay)`,
/// at most `max_retries` automatic retries per episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectConfig {
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Backoff cap.
    pub max_delay: Duration,
    /// Automatic retries before settling in `Disconnected`.
    pub max_retries: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: 5,
        }
    }
}

impl ReconnectConfig {
    /// Delay before retry number `retry` (0-based: the retry count before
    /// it is incremented).
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        if retry >= u32::BITS {
            return self.max_delay;
        }
        self.base_delay
            .checked_mul(1u32 << retry)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }
}
