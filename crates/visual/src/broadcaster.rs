//! Best-effort publisher of [`VisualState`] snapshots.

use tokio::sync::broadcast;
use tracing::trace;

use companion_animation::AnimState;
use companion_protocol::EmotionState;

use crate::state::{RenderStyle, Size, VisualState};

/// Default broadcast channel capacity.
const DEFAULT_CAPACITY: usize = 64;

/// Holds the latest [`VisualState`] and republishes it on every change.
///
/// Non-blocking: publishing never awaits. Slow receivers lag (and skip to
/// the newest snapshots) rather than blocking the core, and publishing with
/// no receiver at all is a normal outcome.
pub struct VisualBroadcaster {
    state: VisualState,
    tx: broadcast::Sender<VisualState>,
}

impl VisualBroadcaster {
    pub fn new(initial: VisualState) -> Self {
        Self::with_capacity(initial, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(initial: VisualState, capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { state: initial, tx }
    }

    /// Latest snapshot.
    pub fn snapshot(&self) -> &VisualState {
        &self.state
    }

    /// Receives every snapshot published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<VisualState> {
        self.tx.subscribe()
    }

    pub fn set_emotion(&mut self, emotion: EmotionState) -> bool {
        self.update(|s| s.emotion = emotion)
    }

    pub fn set_anim_state(&mut self, anim_state: AnimState) -> bool {
        self.update(|s| s.anim_state = anim_state)
    }

    pub fn set_render_style(&mut self, render_style: RenderStyle) -> bool {
        self.update(|s| s.render_style = render_style)
    }

    pub fn set_size(&mut self, size: Size) -> bool {
        self.update(|s| s.size = size)
    }

    pub fn set_character(&mut self, character: Option<String>) -> bool {
        self.update(|s| s.character = character)
    }

    pub fn set_visible(&mut self, visible: bool) -> bool {
        self.update(|s| s.visible = visible)
    }

    /// Applies `f` and publishes the result if the snapshot changed.
    /// Returns whether it changed.
    pub fn update(&mut self, f: impl FnOnce(&mut VisualState)) -> bool {
        let mut next = self.state.clone();
        f(&mut next);
        if next == self.state {
            return false;
        }
        self.state = next;
        self.publish();
        true
    }

    /// Sends the current snapshot to every receiver.
    pub fn publish(&self) -> usize {
        match self.tx.send(self.state.clone()) {
            Ok(n) => n,
            Err(_) => {
                trace!("no visual state subscribers");
                0
            }
        }
    }
}

impl Default for VisualBroadcaster {
    fn default() -> Self {
        Self::new(VisualState::default())
    }
}
