//! One chat session: connection, state, animation and visual output.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info};
use uuid::Uuid;

use companion_animation::{AnimState, AnimationPlayer};
use companion_connection::{
    ConnectionIdentity, ConnectionManager, ConnectionStatus, Connector, ReconnectConfig,
    WsConnector,
};
use companion_protocol::{IncomingMessage, UserMessage};
use companion_visual::{VisualBroadcaster, VisualState};

use crate::error::ChatError;
use crate::state::{Applied, CompanionState};
use crate::transcript::Transcript;

/// Result of processing one incoming message.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionUpdate {
    pub applied: Applied,
    /// Animation state after the message was applied.
    pub anim_state: AnimState,
    /// Whether the animation state changed (and playback restarted).
    pub anim_changed: bool,
}

/// Wires a [`ConnectionManager`] to the chat state, the animation player
/// and the visual broadcaster.
///
/// Construction and every method that (re)connects spawn tasks and must
/// run within a tokio runtime.
pub struct CompanionSession {
    connector: Arc<dyn Connector>,
    reconnect: ReconnectConfig,
    manager: ConnectionManager,
    messages: mpsc::Receiver<IncomingMessage>,
    state: CompanionState,
    player: AnimationPlayer,
    visual: VisualBroadcaster,
}

impl CompanionSession {
    /// Creates a disconnected session using real WebSocket connections.
    pub fn websocket(identity: ConnectionIdentity, visual: VisualState) -> Self {
        Self::new(
            identity,
            Arc::new(WsConnector),
            ReconnectConfig::default(),
            visual,
        )
    }

    /// Creates a disconnected session. `visual` seeds the render settings;
    /// its emotion and animation state are overwritten from the chat state.
    pub fn new(
        identity: ConnectionIdentity,
        connector: Arc<dyn Connector>,
        reconnect: ReconnectConfig,
        visual: VisualState,
    ) -> Self {
        let (manager, messages) = open_manager(identity, connector.clone(), reconnect.clone());
        let mut session = Self {
            connector,
            reconnect,
            manager,
            messages,
            state: CompanionState::new(),
            player: AnimationPlayer::new(),
            visual: VisualBroadcaster::new(visual),
        };
        session.visual.set_emotion(session.state.emotion().clone());
        session.refresh_animation();
        session
    }

    pub fn identity(&self) -> &ConnectionIdentity {
        self.manager.identity()
    }

    pub fn connect(&self) {
        self.manager.connect();
    }

    pub fn disconnect(&self) {
        self.manager.disconnect();
    }

    pub fn reconnect(&self) {
        self.manager.reconnect();
    }

    pub fn status(&self) -> ConnectionStatus {
        self.manager.status()
    }

    /// Subscribes to status transitions of the current manager. A receiver
    /// taken before [`switch_identity`](Self::switch_identity) reports the
    /// retired manager and closes with it.
    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.manager.subscribe_status()
    }

    pub fn retry_count(&self) -> u32 {
        self.manager.retry_count()
    }

    pub fn state(&self) -> &CompanionState {
        &self.state
    }

    pub fn transcript(&self) -> &Transcript {
        self.state.transcript()
    }

    pub fn player(&self) -> &AnimationPlayer {
        &self.player
    }

    pub fn visual(&self) -> &VisualBroadcaster {
        &self.visual
    }

    /// Render settings are changed through here.
    pub fn visual_mut(&mut self) -> &mut VisualBroadcaster {
        &mut self.visual
    }

    /// Validates `text`, sends it as a `user.message` and appends it to the
    /// transcript. Returns the generated request id.
    ///
    /// Nothing is appended when validation fails or the socket is not open.
    pub fn send_text(&mut self, text: &str) -> Result<String, ChatError> {
        let request_id = Uuid::new_v4().to_string();
        let msg = UserMessage::new(text, request_id.clone())?;
        let text = msg.text.clone();
        if !self.manager.send(&msg.into()) {
            return Err(ChatError::NotConnected);
        }
        self.state.push_user(&request_id, &text);
        debug!(%request_id, "user message sent");
        Ok(request_id)
    }

    /// Waits for the next incoming message and applies it.
    ///
    /// Cancel-safe: dropping the future before it resolves loses no message.
    pub async fn next_update(&mut self) -> Option<SessionUpdate> {
        let msg = self.messages.recv().await?;
        Some(self.apply(msg))
    }

    /// Applies one message to the state, the player and the broadcaster.
    pub fn apply(&mut self, msg: IncomingMessage) -> SessionUpdate {
        let applied = self.state.apply(msg);
        if let Applied::Emotion(emotion) = &applied {
            self.visual.set_emotion(emotion.clone());
        }
        let (anim_state, anim_changed) = self.refresh_animation();
        SessionUpdate {
            applied,
            anim_state,
            anim_changed,
        }
    }

    /// Replaces the identity. The old manager is torn down first (retry
    /// timer cancelled, socket closed on purpose); the new one starts
    /// connecting right away with a fresh chat state.
    pub fn switch_identity(&mut self, identity: ConnectionIdentity) {
        info!(
            from = %self.manager.identity().session_id(),
            to = %identity.session_id(),
            "switching session"
        );
        self.manager.disconnect();
        let (manager, messages) =
            open_manager(identity, self.connector.clone(), self.reconnect.clone());
        // Assigning drops the retired manager and its receiver.
        self.manager = manager;
        self.messages = messages;

        self.state = CompanionState::new();
        self.visual.set_emotion(self.state.emotion().clone());
        self.refresh_animation();
        self.manager.connect();
    }

    /// Re-resolves the animation state and restarts playback if it changed.
    fn refresh_animation(&mut self) -> (AnimState, bool) {
        let anim_state = self.state.anim_state();
        let changed = self.player.play(anim_state);
        self.visual.set_anim_state(anim_state);
        if changed {
            debug!(state = %anim_state, "animation state changed");
        }
        (anim_state, changed)
    }
}

fn open_manager(
    identity: ConnectionIdentity,
    connector: Arc<dyn Connector>,
    reconnect: ReconnectConfig,
) -> (ConnectionManager, mpsc::Receiver<IncomingMessage>) {
    let manager = ConnectionManager::with_config(identity, connector, reconnect);
    // A fresh manager always still holds its receiver.
    let messages = manager
        .take_messages()
        .unwrap_or_else(|| mpsc::channel(1).1);
    (manager, messages)
}
