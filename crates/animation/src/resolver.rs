use companion_protocol::{AnimationAction, EmotionState};

use crate::state::AnimState;

/// Valence above which an unlabelled reading counts as happy.
pub const HAPPY_VALENCE: f64 = 0.3;

/// Valence below which an unlabelled reading counts as sad.
pub const SAD_VALENCE: f64 = -0.3;

/// Maps the explicit action and the current emotion to an [`AnimState`].
///
/// First match wins:
/// 1. `talking` and `thinking` actions override any emotion;
/// 2. an emotion label naming a known state (case-insensitive) is used as is;
/// 3. otherwise valence thresholds pick `happy`, `sad` or `idle`.
pub fn resolve(action: AnimationAction, emotion: &EmotionState) -> AnimState {
    match action {
        AnimationAction::Talking => return AnimState::Talking,
        AnimationAction::Thinking => return AnimState::Thinking,
        AnimationAction::Idle => {}
    }

    if let Some(state) = AnimState::from_label(&emotion.label) {
        return state;
    }

    if emotion.valence > HAPPY_VALENCE {
        AnimState::Happy
    } else if emotion.valence < SAD_VALENCE {
        AnimState::Sad
    } else {
        AnimState::Idle
    }
}
