//! Socket lifecycle and reconnection with exponential backoff.
//!
//! All mutable lifecycle state lives in one [`Lifecycle`] behind a std mutex
//! that is never held across an await. Every socket is tagged with the
//! generation it was opened under; opening a new socket or tearing one down
//! on purpose bumps the generation, so a late close or open from an older
//! socket is recognised as stale and ignored.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use companion_protocol::{IncomingMessage, decode};

use crate::socket::{Connector, Socket};
use crate::types::{ConnectionStatus, ReconnectConfig};

/// Sending half of the socket currently in use.
pub(crate) struct LiveSocket {
    pub(crate) outbound: mpsc::Sender<String>,
    pub(crate) close: CancellationToken,
}

/// Mutable lifecycle state shared by the manager and its background tasks.
#[derive(Default)]
pub(crate) struct Lifecycle {
    /// Bumped whenever an attempt starts or the current socket is torn down
    /// on purpose.
    pub(crate) generation: u64,
    pub(crate) socket: Option<LiveSocket>,
    /// Automatic retries used in the current episode.
    pub(crate) retry_count: u32,
    /// Set by `disconnect`; suppresses automatic reconnection.
    pub(crate) intentional: bool,
    pub(crate) reconnect_cancel: Option<CancellationToken>,
}

impl Lifecycle {
    /// Cancels the pending retry timer, if any.
    pub(crate) fn cancel_reconnect(&mut self) {
        if let Some(token) = self.reconnect_cancel.take() {
            token.cancel();
        }
    }

    /// Closes the current socket, if any, and invalidates its generation so
    /// its close is not treated as a drop.
    pub(crate) fn close_socket(&mut self) {
        self.generation += 1;
        if let Some(socket) = self.socket.take() {
            socket.close.cancel();
        }
    }
}

/// Shared state passed to the free functions driving the lifecycle.
#[derive(Clone)]
pub(crate) struct ConnContext {
    pub(crate) connector: Arc<dyn Connector>,
    /// `None` when the identity is incomplete; no socket is ever opened then.
    pub(crate) url: Option<Arc<str>>,
    pub(crate) session_id: Arc<str>,
    pub(crate) config: ReconnectConfig,
    pub(crate) lifecycle: Arc<Mutex<Lifecycle>>,
    pub(crate) status_tx: Arc<watch::Sender<ConnectionStatus>>,
    pub(crate) messages_tx: mpsc::Sender<IncomingMessage>,
}

impl ConnContext {
    /// Locks the lifecycle. A poisoned lock still yields the state: every
    /// critical section leaves it consistent before any call that may panic.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn status(&self) -> ConnectionStatus {
        *self.status_tx.borrow()
    }

    /// Publishes `status`. Callers hold the lifecycle lock so transitions
    /// are observed in the order they happen.
    pub(crate) fn set_status(&self, status: ConnectionStatus) {
        let prev = self.status_tx.send_replace(status);
        if prev != status {
            trace!(session = %self.session_id, from = %prev, to = %status, "status changed");
        }
    }
}

/// Starts a new connection attempt under a fresh generation.
///
/// Must be called with the lifecycle lock held and `ctx.url` set.
pub(crate) fn begin_attempt(ctx: &ConnContext, lc: &mut Lifecycle) {
    let Some(url) = ctx.url.clone() else {
        ctx.set_status(ConnectionStatus::Disconnected);
        return;
    };
    lc.close_socket();
    lc.intentional = false;
    let generation = lc.generation;
    ctx.set_status(ConnectionStatus::Connecting);
    debug!(session = %ctx.session_id, generation, retry = lc.retry_count, "opening socket");
    tokio::spawn(run_socket(ctx.clone(), url, generation));
}

/// Opens one socket and pumps its frames into the message channel until it
/// closes, then reports the close.
async fn run_socket(ctx: ConnContext, url: Arc<str>, generation: u64) {
    let socket = match ctx.connector.connect(&url).await {
        Ok(socket) => socket,
        Err(e) => {
            warn!(session = %ctx.session_id, "connection attempt failed: {e}");
            handle_close(&ctx, generation);
            return;
        }
    };

    let Socket {
        outbound,
        mut inbound,
        close,
    } = socket;

    {
        let mut lc = ctx.lock();
        if lc.generation != generation || lc.intentional {
            debug!(session = %ctx.session_id, generation, "discarding stale socket");
            close.cancel();
            return;
        }
        lc.socket = Some(LiveSocket {
            outbound,
            close: close.clone(),
        });
        lc.retry_count = 0;
        ctx.set_status(ConnectionStatus::Connected);
    }
    info!(session = %ctx.session_id, "connected");

    loop {
        let frame = tokio::select! {
            biased;
            _ = close.cancelled() => break,
            frame = inbound.recv() => match frame {
                Some(frame) => frame,
                None => break,
            },
        };
        match decode(&frame) {
            Ok(msg) => {
                trace!(msg_type = msg.msg_type().as_str(), "received message");
                // A retired socket must not deliver while the consumer lags.
                tokio::select! {
                    biased;
                    _ = close.cancelled() => break,
                    sent = ctx.messages_tx.send(msg) => {
                        if sent.is_err() {
                            trace!("message receiver dropped");
                        }
                    }
                }
            }
            Err(e) => debug!(len = frame.len(), "dropping undecodable frame: {e}"),
        }
    }

    handle_close(&ctx, generation);
}

/// Reacts to the end of the socket opened under `generation`: either
/// schedules the next retry or settles in `Disconnected`.
pub(crate) fn handle_close(ctx: &ConnContext, generation: u64) {
    let mut lc = ctx.lock();
    if lc.generation != generation {
        trace!(session = %ctx.session_id, generation, "ignoring close of stale socket");
        return;
    }
    if let Some(socket) = lc.socket.take() {
        socket.close.cancel();
    }

    if lc.intentional {
        ctx.set_status(ConnectionStatus::Disconnected);
        return;
    }

    let retry = lc.retry_count;
    if retry >= ctx.config.max_retries {
        info!(session = %ctx.session_id, retries = retry, "reconnect attempts exhausted");
        ctx.set_status(ConnectionStatus::Disconnected);
        return;
    }

    let delay = ctx.config.delay_for_retry(retry);
    lc.retry_count = retry + 1;
    lc.cancel_reconnect();
    let cancel = CancellationToken::new();
    lc.reconnect_cancel = Some(cancel.clone());
    ctx.set_status(ConnectionStatus::Reconnecting);

    let delay_secs = delay.as_secs_f64();
    info!(
        session = %ctx.session_id,
        attempt = retry + 1,
        delay_secs = format_args!("{delay_secs:.1}"),
        "reconnecting"
    );
    tokio::spawn(reconnect_after(ctx.clone(), generation, delay, cancel));
}

/// Waits out the backoff delay, then starts the next attempt unless the
/// timer was cancelled or the lifecycle moved on meanwhile.
async fn reconnect_after(
    ctx: ConnContext,
    generation: u64,
    delay: Duration,
    cancel: CancellationToken,
) {
    tokio::select! {
        _ = cancel.cancelled() => {
            debug!(session = %ctx.session_id, "reconnect cancelled");
            return;
        }
        _ = tokio::time::sleep(delay) => {}
    }

    let mut lc = ctx.lock();
    if cancel.is_cancelled() || lc.generation != generation || lc.intentional {
        return;
    }
    lc.reconnect_cancel = None;
    begin_attempt(&ctx, &mut lc);
}
