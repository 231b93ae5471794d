//! Frame cadence for the resolved animation state.
//!
//! The player owns at most one advance task. Switching to a different state
//! (or to a sequence with a different frame count or rate) cancels that task,
//! rewinds to frame 0 and arms a new one.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::frames::{FrameSequence, PoseFrame, sequence};
use crate::state::AnimState;

/// Lookup from state to frame loop. [`sequence`] is the built-in table.
pub type FrameTable = fn(AnimState) -> &'static FrameSequence;

/// Current playback position, as seen by rendering surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FramePosition {
    pub state: AnimState,
    pub index: usize,
}

/// What is currently armed. A change in any field restarts playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PlaybackKey {
    state: AnimState,
    frame_count: usize,
    fps: u32,
}

/// Drives the frame index of the current [`AnimState`].
///
/// [`play`](Self::play) spawns onto the ambient tokio runtime.
pub struct AnimationPlayer {
    table: FrameTable,
    position_tx: Arc<watch::Sender<FramePosition>>,
    playing: Option<PlaybackKey>,
    cancel: Option<CancellationToken>,
}

impl AnimationPlayer {
    /// Creates a stopped player using the built-in frame table.
    pub fn new() -> Self {
        Self::with_table(sequence)
    }

    /// Creates a stopped player using a custom frame table.
    pub fn with_table(table: FrameTable) -> Self {
        let (position_tx, _) = watch::channel(FramePosition {
            state: AnimState::Idle,
            index: 0,
        });
        Self {
            table,
            position_tx: Arc::new(position_tx),
            playing: None,
            cancel: None,
        }
    }

    /// Plays `state`. Returns `true` if playback was restarted, `false` if
    /// the same loop was already running.
    pub fn play(&mut self, state: AnimState) -> bool {
        let seq = (self.table)(state);
        let key = PlaybackKey {
            state,
            frame_count: seq.len(),
            fps: seq.fps,
        };
        if self.playing == Some(key) {
            return false;
        }

        self.cancel_ticker();
        self.position_tx
            .send_replace(FramePosition { state, index: 0 });
        self.playing = Some(key);

        if seq.len() > 1 {
            let cancel = CancellationToken::new();
            tokio::spawn(advance_frames(
                self.position_tx.clone(),
                state,
                seq,
                cancel.clone(),
            ));
            self.cancel = Some(cancel);
        }

        debug!(state = %state, frames = seq.len(), fps = seq.fps, "animation restarted");
        true
    }

    /// Cancels the advance task. The position stays where it was.
    pub fn stop(&mut self) {
        self.cancel_ticker();
        self.playing = None;
    }

    /// The state being played, if any.
    pub fn current(&self) -> Option<AnimState> {
        self.playing.map(|k| k.state)
    }

    /// Latest playback position.
    pub fn position(&self) -> FramePosition {
        *self.position_tx.borrow()
    }

    /// Pose for the latest playback position, `None` if the table has no
    /// frames for that state.
    pub fn pose(&self) -> Option<&'static PoseFrame> {
        let pos = self.position();
        (self.table)(pos.state).pose(pos.index)
    }

    /// Subscribes to position changes.
    pub fn subscribe(&self) -> watch::Receiver<FramePosition> {
        self.position_tx.subscribe()
    }

    fn cancel_ticker(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
    }
}

impl Default for AnimationPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AnimationPlayer {
    fn drop(&mut self) {
        self.cancel_ticker();
    }
}

/// Advances the frame index every [`FrameSequence::frame_period`], cycling forever until
/// cancelled.
async fn advance_frames(
    position_tx: Arc<watch::Sender<FramePosition>>,
    state: AnimState,
    seq: &'static FrameSequence,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(seq.frame_period());
    interval.tick().await; // Skip immediate first tick.

    let mut index = 0usize;
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                index = (index + 1) % seq.len();
                trace!(state = %state, index, "frame advance");
                // Checked under the channel lock: a cancelled ticker must never
                // overwrite the position written by its replacement.
                position_tx.send_if_modified(|pos| {
                    if cancel.is_cancelled() {
                        return false;
                    }
                    *pos = FramePosition { state, index };
                    true
                });
            }
        }
    }
}
