//! Connection manager for one (host, session) identity.
//!
//! Owns at most one socket, publishes its status, forwards decoded messages
//! and reconnects with exponential backoff after an unexpected drop.

use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use companion_protocol::{IncomingMessage, OutgoingMessage, encode};

use crate::reconnection::{ConnContext, Lifecycle, begin_attempt};
use crate::socket::Connector;
use crate::types::{ConnectionIdentity, ConnectionStatus, ReconnectConfig};
use crate::ws_client::WsConnector;

/// Decoded messages buffered before the socket task waits on the consumer.
const MESSAGE_CAPACITY: usize = 256;

/// Resilient connection to the chat endpoint.
///
/// All operations are synchronous and must be called from within a tokio
/// runtime; socket IO and retry timers run on spawned tasks.
pub struct ConnectionManager {
    identity: ConnectionIdentity,
    ctx: ConnContext,
    messages_rx: Mutex<Option<mpsc::Receiver<IncomingMessage>>>,
}

impl ConnectionManager {
    /// Creates a disconnected manager using real WebSocket connections and
    /// the default backoff.
    pub fn websocket(identity: ConnectionIdentity) -> Self {
        Self::new(identity, Arc::new(WsConnector))
    }

    /// Creates a disconnected manager with the default backoff.
    pub fn new(identity: ConnectionIdentity, connector: Arc<dyn Connector>) -> Self {
        Self::with_config(identity, connector, ReconnectConfig::default())
    }

    /// Creates a disconnected manager.
    pub fn with_config(
        identity: ConnectionIdentity,
        connector: Arc<dyn Connector>,
        config: ReconnectConfig,
    ) -> Self {
        let (messages_tx, messages_rx) = mpsc::channel(MESSAGE_CAPACITY);
        let (status_tx, _) = watch::channel(ConnectionStatus::Disconnected);
        let ctx = ConnContext {
            connector,
            url: identity.connection_url().map(Arc::from),
            session_id: Arc::from(identity.session_id()),
            config,
            lifecycle: Arc::new(Mutex::new(Lifecycle::default())),
            status_tx: Arc::new(status_tx),
            messages_tx,
        };
        Self {
            identity,
            ctx,
            messages_rx: Mutex::new(Some(messages_rx)),
        }
    }

    pub fn identity(&self) -> &ConnectionIdentity {
        &self.identity
    }

    pub fn status(&self) -> ConnectionStatus {
        self.ctx.status()
    }

    /// Subscribes to status transitions.
    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.ctx.status_tx.subscribe()
    }

    /// Automatic retries used in the current episode.
    pub fn retry_count(&self) -> u32 {
        self.ctx.lock().retry_count
    }

    /// Takes the decoded message receiver. Can only be called once.
    pub fn take_messages(&self) -> Option<mpsc::Receiver<IncomingMessage>> {
        self.messages_rx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }

    /// Opens the socket.
    ///
    /// No-op while connecting or connected. While a retry is pending, the
    /// timer is cancelled and the attempt starts now without resetting the
    /// retry count. With an incomplete identity nothing is opened and the
    /// status stays `Disconnected`.
    pub fn connect(&self) {
        if self.ctx.url.is_none() {
            debug!(host = %self.identity.host_url(), "identity incomplete, not connecting");
            return;
        }

        let mut lc = self.ctx.lock();
        match self.ctx.status() {
            ConnectionStatus::Connecting | ConnectionStatus::Connected => {
                debug!(session = %self.ctx.session_id, "already connecting or connected");
                return;
            }
            ConnectionStatus::Reconnecting => lc.cancel_reconnect(),
            ConnectionStatus::Disconnected => lc.retry_count = 0,
        }
        info!(session = %self.ctx.session_id, "connecting");
        begin_attempt(&self.ctx, &mut lc);
    }

    /// Closes the socket on purpose. Cancels any pending retry; no automatic
    /// reconnection follows.
    pub fn disconnect(&self) {
        let mut lc = self.ctx.lock();
        lc.intentional = true;
        lc.cancel_reconnect();
        lc.close_socket();
        self.ctx.set_status(ConnectionStatus::Disconnected);
        info!(session = %self.ctx.session_id, "disconnected");
    }

    /// Drops the current socket on purpose and opens a new one right away
    /// with a fresh retry budget.
    pub fn reconnect(&self) {
        if self.ctx.url.is_none() {
            debug!(host = %self.identity.host_url(), "identity incomplete, not reconnecting");
            return;
        }

        let mut lc = self.ctx.lock();
        lc.cancel_reconnect();
        lc.retry_count = 0;
        info!(session = %self.ctx.session_id, "manual reconnect");
        begin_attempt(&self.ctx, &mut lc);
    }

    /// Sends `msg` if connected. Returns `false` (and drops the message)
    /// otherwise; nothing is queued for later delivery.
    pub fn send(&self, msg: &OutgoingMessage) -> bool {
        let text = match encode(msg) {
            Ok(text) => text,
            Err(e) => {
                warn!("failed to encode {}: {e}", msg.msg_type().as_str());
                return false;
            }
        };

        let lc = self.ctx.lock();
        let socket = match (&lc.socket, self.ctx.status()) {
            (Some(socket), ConnectionStatus::Connected) => socket,
            (_, status) => {
                debug!(%status, "not connected, dropping outgoing message");
                return false;
            }
        };
        match socket.outbound.try_send(text) {
            Ok(()) => true,
            Err(e) => {
                warn!("failed to queue outgoing message: {e}");
                false
            }
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        let mut lc = self.ctx.lock();
        lc.intentional = true;
        lc.cancel_reconnect();
        lc.close_socket();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use futures_util::future::BoxFuture;
    use tokio::time::Instant;
    use tokio_util::sync::CancellationToken;

    use companion_protocol::{AnimationAction, UserMessage};

    use super::*;
    use crate::socket::Socket;
    use crate::ws_client::WsError;

    /// Server side of a socket handed out by [`FakeConnector`].
    struct Peer {
        to_client: mpsc::Sender<String>,
        from_client: mpsc::Receiver<String>,
        close: CancellationToken,
    }

    /// Scripted transport: refuses or accepts every attempt and records
    /// when each one happened.
    #[derive(Default)]
    struct FakeConnector {
        accept: AtomicBool,
        attempts: std::sync::Mutex<Vec<Instant>>,
        peers: std::sync::Mutex<Vec<Peer>>,
    }

    impl FakeConnector {
        fn refusing() -> Arc<Self> {
            Arc::new(Self::default())
        }

        fn accepting() -> Arc<Self> {
            let fake = Self::default();
            fake.accept.store(true, Ordering::SeqCst);
            Arc::new(fake)
        }

        fn attempts(&self) -> usize {
            self.attempts.lock().unwrap().len()
        }

        fn attempt_times(&self) -> Vec<Instant> {
            self.attempts.lock().unwrap().clone()
        }

        fn take_peer(&self) -> Peer {
            self.peers.lock().unwrap().remove(0)
        }
    }

    impl Connector for FakeConnector {
        fn connect<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Socket, WsError>> {
            Box::pin(async move {
                assert!(url.starts_with("ws://host/ws/chat?session_id="));
                self.attempts.lock().unwrap().push(Instant::now());
                if !self.accept.load(Ordering::SeqCst) {
                    return Err(WsError::Closed);
                }
                let (to_client, inbound) = mpsc::channel(16);
                let (outbound, from_client) = mpsc::channel(16);
                let close = CancellationToken::new();
                self.peers.lock().unwrap().push(Peer {
                    to_client,
                    from_client,
                    close: close.clone(),
                });
                Ok(Socket {
                    outbound,
                    inbound,
                    close,
                })
            })
        }
    }

    fn identity() -> ConnectionIdentity {
        ConnectionIdentity::new("http://host", "s1")
    }

    /// Lets spawned tasks run without reaching any backoff deadline.
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    async fn wait_for_status(mgr: &ConnectionManager, status: ConnectionStatus) {
        let mut rx = mgr.subscribe_status();
        tokio::time::timeout(Duration::from_secs(120), rx.wait_for(|s| *s == status))
            .await
            .expect("status not reached")
            .expect("status channel closed");
    }

    fn user_message(text: &str) -> OutgoingMessage {
        UserMessage::new(text, "req-1").unwrap().into()
    }

    #[tokio::test(start_paused = true)]
    async fn incomplete_identity_never_opens_a_socket() {
        let fake = FakeConnector::accepting();
        let mgr = ConnectionManager::new(ConnectionIdentity::new("http://host", "***"), fake.clone());

        mgr.connect();
        mgr.reconnect();
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(fake.attempts(), 0);
        assert_eq!(mgr.status(), ConnectionStatus::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn connect_reaches_connected() {
        let fake = FakeConnector::accepting();
        let mgr = ConnectionManager::new(identity(), fake.clone());

        mgr.connect();
        assert_eq!(mgr.status(), ConnectionStatus::Connecting);
        wait_for_status(&mgr, ConnectionStatus::Connected).await;
        assert_eq!(fake.attempts(), 1);
        assert_eq!(mgr.retry_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn connect_is_a_noop_while_connected() {
        let fake = FakeConnector::accepting();
        let mgr = ConnectionManager::new(identity(), fake.clone());

        mgr.connect();
        mgr.connect();
        wait_for_status(&mgr, ConnectionStatus::Connected).await;
        mgr.connect();
        settle().await;

        assert_eq!(fake.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_settle_disconnected() {
        let fake = FakeConnector::refusing();
        let mgr = ConnectionManager::new(identity(), fake.clone());

        mgr.connect();
        tokio::time::sleep(Duration::from_secs(120)).await;

        // One initial attempt plus five retries.
        assert_eq!(fake.attempts(), 6);
        assert_eq!(mgr.status(), ConnectionStatus::Disconnected);
        assert_eq!(mgr.retry_count(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_delays_follow_backoff() {
        let fake = FakeConnector::refusing();
        let mgr = ConnectionManager::new(identity(), fake.clone());

        mgr.connect();
        tokio::time::sleep(Duration::from_secs(120)).await;

        let times = fake.attempt_times();
        let gaps: Vec<u64> = times
            .windows(2)
            .map(|w| (w[1] - w[0]).as_secs())
            .collect();
        assert_eq!(gaps, vec![1, 2, 4, 8, 16]);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_while_reconnecting_cancels_timer() {
        let fake = FakeConnector::refusing();
        let mgr = ConnectionManager::new(identity(), fake.clone());

        mgr.connect();
        wait_for_status(&mgr, ConnectionStatus::Reconnecting).await;
        mgr.disconnect();
        tokio::time::sleep(Duration::from_secs(120)).await;

        assert_eq!(fake.attempts(), 1);
        assert_eq!(mgr.status(), ConnectionStatus::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn connect_while_reconnecting_keeps_retry_count() {
        let fake = FakeConnector::refusing();
        let mgr = ConnectionManager::new(identity(), fake.clone());

        mgr.connect();
        // Attempts at t=0, 1s and 3s; the next retry is due at 7s.
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(fake.attempts(), 3);
        assert_eq!(mgr.retry_count(), 3);
        assert_eq!(mgr.status(), ConnectionStatus::Reconnecting);

        mgr.connect();
        settle().await;
        assert_eq!(fake.attempts(), 4);
        assert_eq!(mgr.retry_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn reconnect_resets_retry_count_and_opens_now() {
        let fake = FakeConnector::refusing();
        let mgr = ConnectionManager::new(identity(), fake.clone());

        mgr.connect();
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(mgr.retry_count(), 3);

        mgr.reconnect();
        settle().await;
        assert_eq!(fake.attempts(), 4);
        // The fresh attempt failed and scheduled retry number one.
        assert_eq!(mgr.retry_count(), 1);
        assert_eq!(mgr.status(), ConnectionStatus::Reconnecting);
    }

    #[tokio::test(start_paused = true)]
    async fn unexpected_drop_reconnects_and_resets_count() {
        let fake = FakeConnector::accepting();
        let mgr = ConnectionManager::new(identity(), fake.clone());

        mgr.connect();
        wait_for_status(&mgr, ConnectionStatus::Connected).await;

        drop(fake.take_peer());
        wait_for_status(&mgr, ConnectionStatus::Reconnecting).await;
        assert_eq!(mgr.retry_count(), 1);

        wait_for_status(&mgr, ConnectionStatus::Connected).await;
        assert_eq!(fake.attempts(), 2);
        assert_eq!(mgr.retry_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_reconnect_ignores_close_of_replaced_socket() {
        let fake = FakeConnector::accepting();
        let mgr = ConnectionManager::new(identity(), fake.clone());

        mgr.connect();
        wait_for_status(&mgr, ConnectionStatus::Connected).await;
        let old = fake.take_peer();

        mgr.reconnect();
        assert!(old.close.is_cancelled());
        wait_for_status(&mgr, ConnectionStatus::Connected).await;
        drop(old);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(fake.attempts(), 2);
        assert_eq!(mgr.status(), ConnectionStatus::Connected);
        assert_eq!(mgr.retry_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_closes_socket_without_retry() {
        let fake = FakeConnector::accepting();
        let mgr = ConnectionManager::new(identity(), fake.clone());

        mgr.connect();
        wait_for_status(&mgr, ConnectionStatus::Connected).await;
        let peer = fake.take_peer();

        mgr.disconnect();
        assert!(peer.close.is_cancelled());
        assert_eq!(mgr.status(), ConnectionStatus::Disconnected);
        assert!(!mgr.send(&user_message("hello")));

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(fake.attempts(), 1);
        assert_eq!(mgr.status(), ConnectionStatus::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn send_requires_an_open_socket() {
        let fake = FakeConnector::accepting();
        let mgr = ConnectionManager::new(identity(), fake.clone());

        assert!(!mgr.send(&user_message("early")));

        mgr.connect();
        wait_for_status(&mgr, ConnectionStatus::Connected).await;
        assert!(mgr.send(&user_message("hello")));

        let mut peer = fake.take_peer();
        let frame = peer.from_client.recv().await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["type"], "user.message");
        assert_eq!(value["text"], "hello");
        assert!(peer.from_client.try_recv().is_err(), "early message must not be queued");
    }

    #[tokio::test(start_paused = true)]
    async fn messages_arrive_in_order_and_bad_frames_are_dropped() {
        let fake = FakeConnector::accepting();
        let mgr = ConnectionManager::new(identity(), fake.clone());
        let mut messages = mgr.take_messages().unwrap();
        assert!(mgr.take_messages().is_none());

        mgr.connect();
        wait_for_status(&mgr, ConnectionStatus::Connected).await;
        let peer = fake.take_peer();
        for frame in [
            r#"{"type":"animation.command","action":"thinking"}"#,
            "not json",
            r#"{"type":"unknown.kind"}"#,
            r#"{"type":"response.text","request_id":"r1","text":"hi"}"#,
        ] {
            peer.to_client.send(frame.to_string()).await.unwrap();
        }

        match messages.recv().await.unwrap() {
            IncomingMessage::AnimationCommand(cmd) => {
                assert_eq!(cmd.action, AnimationAction::Thinking)
            }
            other => panic!("unexpected {other:?}"),
        }
        match messages.recv().await.unwrap() {
            IncomingMessage::ResponseText(resp) => assert_eq!(resp.text, "hi"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(mgr.status(), ConnectionStatus::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn backlogged_frame_is_not_delivered_after_disconnect() {
        let fake = FakeConnector::accepting();
        let mgr = ConnectionManager::new(identity(), fake.clone());
        let mut messages = mgr.take_messages().unwrap();

        mgr.connect();
        wait_for_status(&mgr, ConnectionStatus::Connected).await;
        let peer = fake.take_peer();

        // Fill the message channel and leave one more frame waiting on it.
        for i in 0..=MESSAGE_CAPACITY {
            let frame = format!(r#"{{"type":"response.text","request_id":"r{i}","text":"x"}}"#);
            peer.to_client.send(frame).await.unwrap();
        }
        settle().await;

        mgr.disconnect();
        let mut delivered = 0;
        loop {
            while messages.try_recv().is_ok() {
                delivered += 1;
            }
            settle().await;
            if messages.is_empty() {
                break;
            }
        }
        assert_eq!(delivered, MESSAGE_CAPACITY);
        assert_eq!(mgr.status(), ConnectionStatus::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_manager_closes_the_socket() {
        let fake = FakeConnector::accepting();
        let mgr = ConnectionManager::new(identity(), fake.clone());

        mgr.connect();
        wait_for_status(&mgr, ConnectionStatus::Connected).await;
        let peer = fake.take_peer();

        drop(mgr);
        assert!(peer.close.is_cancelled());
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(fake.attempts(), 1);
    }
}
