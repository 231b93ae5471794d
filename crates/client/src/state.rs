//! Application of decoded backend messages to client state.

use chrono::Utc;
use tracing::{debug, warn};

use companion_animation::{AnimState, resolve};
use companion_protocol::{AnimationAction, EmotionState, IncomingMessage};

use crate::transcript::{ChatEntry, Role, Transcript};

/// Suffix of the transcript id given to a companion reply.
pub const RESPONSE_ID_SUFFIX: &str = "-resp";

/// Id prefix of a backend error that carries no request id.
pub const ERROR_ID_FALLBACK: &str = "error";

/// What a single incoming message changed.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    /// A companion reply or a system error was appended.
    Entry(ChatEntry),
    /// The emotion reading was replaced.
    Emotion(EmotionState),
    /// The explicit animation action was replaced.
    Action(AnimationAction),
}

/// Transcript, emotion and action as last reported by the backend.
#[derive(Debug, Clone, Default)]
pub struct CompanionState {
    transcript: Transcript,
    emotion: EmotionState,
    action: AnimationAction,
    last_error_stamp: i64,
}

impl CompanionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn emotion(&self) -> &EmotionState {
        &self.emotion
    }

    pub fn action(&self) -> AnimationAction {
        self.action
    }

    /// Animation state derived from the current action and emotion.
    pub fn anim_state(&self) -> AnimState {
        resolve(self.action, &self.emotion)
    }

    /// Appends the user's own message under its request id.
    pub fn push_user(&mut self, request_id: &str, text: &str) -> &ChatEntry {
        self.transcript
            .push(ChatEntry::new(request_id, Role::User, text))
    }

    /// Applies one decoded message. Exactly one piece of state changes per
    /// variant.
    pub fn apply(&mut self, msg: IncomingMessage) -> Applied {
        match msg {
            IncomingMessage::ResponseText(resp) => {
                let id = format!("{}{RESPONSE_ID_SUFFIX}", resp.request_id);
                Applied::Entry(self.push_entry(ChatEntry::new(id, Role::Companion, resp.text)))
            }
            IncomingMessage::EmotionUpdate(emotion) => {
                debug!(
                    label = %emotion.label,
                    valence = emotion.valence,
                    arousal = emotion.arousal,
                    "emotion update"
                );
                self.emotion = emotion.clone();
                Applied::Emotion(emotion)
            }
            IncomingMessage::AnimationCommand(cmd) => {
                debug!(action = cmd.action.as_str(), "animation command");
                self.action = cmd.action;
                Applied::Action(cmd.action)
            }
            IncomingMessage::Error(err) => {
                warn!(request_id = ?err.request_id, detail = %err.detail, "backend error");
                let prefix = err.request_id.as_deref().unwrap_or(ERROR_ID_FALLBACK);
                let id = format!("{prefix}-{}", self.next_error_stamp());
                Applied::Entry(self.push_entry(ChatEntry::new(id, Role::System, err.detail)))
            }
        }
    }

    fn push_entry(&mut self, entry: ChatEntry) -> ChatEntry {
        self.transcript.push(entry).clone()
    }

    /// Nanoseconds since the epoch, strictly increasing per state instance
    /// even when the clock has not advanced between two calls.
    fn next_error_stamp(&mut self) -> i64 {
        let now = Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or(self.last_error_stamp);
        let stamp = now.max(self.last_error_stamp.saturating_add(1));
        self.last_error_stamp = stamp;
        stamp
    }
}
