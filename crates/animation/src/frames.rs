//! Pose frame tables.
//!
//! Each [`AnimState`] owns a fixed, non-empty loop of pose descriptors and a
//! playback rate. Renderers turn a descriptor into pixels; this crate only
//! decides which descriptor is current.

use std::time::Duration;

use serde::Serialize;

use crate::state::AnimState;

/// Eye shape for a single pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Eyes {
    Open,
    Closed,
    Wide,
    Squint,
    Up,
}

/// Mouth shape for a single pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mouth {
    Closed,
    Flat,
    Smile,
    Grin,
    Frown,
    Open,
    Round,
}

/// One step of an animation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoseFrame {
    /// Head rotation in degrees, positive is clockwise.
    pub head_tilt: i8,
    /// Vertical body offset in character units, positive is up.
    pub body_offset: i8,
    pub eyes: Eyes,
    pub mouth: Mouth,
}

const fn pose(head_tilt: i8, body_offset: i8, eyes: Eyes, mouth: Mouth) -> PoseFrame {
    PoseFrame {
        head_tilt,
        body_offset,
        eyes,
        mouth,
    }
}

/// A looping frame sequence with its playback rate.
#[derive(Debug, PartialEq, Eq)]
pub struct FrameSequence {
    pub frames: &'static [PoseFrame],
    /// Frames per second. Zero is treated as 1, anything above 1000 as 1000.
    pub fps: u32,
}

impl FrameSequence {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Delay between two frame advances: `1000 / fps` milliseconds, never
    /// less than 1 ms.
    pub fn frame_period(&self) -> Duration {
        Duration::from_millis((1000 / u64::from(self.fps.max(1))).max(1))
    }

    /// Pose at `index`, wrapping around the loop. `None` for an empty loop.
    pub fn pose(&self, index: usize) -> Option<&'static PoseFrame> {
        if self.frames.is_empty() {
            return None;
        }
        Some(&self.frames[index % self.frames.len()])
    }
}

use Eyes as E;
use Mouth as M;

static IDLE: FrameSequence = FrameSequence {
    frames: &[
        pose(0, 0, E::Open, M::Closed),
        pose(0, 1, E::Open, M::Closed),
        pose(0, 1, E::Closed, M::Closed),
        pose(0, 0, E::Open, M::Closed),
    ],
    fps: 4,
};

static TALKING: FrameSequence = FrameSequence {
    frames: &[
        pose(0, 0, E::Open, M::Closed),
        pose(2, 0, E::Open, M::Open),
        pose(0, 1, E::Open, M::Round),
        pose(-2, 0, E::Open, M::Open),
    ],
    fps: 10,
};

static THINKING: FrameSequence = FrameSequence {
    frames: &[
        pose(-8, 0, E::Up, M::Flat),
        pose(-10, 0, E::Up, M::Flat),
        pose(-8, 0, E::Squint, M::Flat),
    ],
    fps: 3,
};

static HAPPY: FrameSequence = FrameSequence {
    frames: &[
        pose(0, 0, E::Open, M::Smile),
        pose(3, 2, E::Squint, M::Grin),
        pose(0, 3, E::Squint, M::Grin),
        pose(-3, 2, E::Open, M::Smile),
    ],
    fps: 6,
};

static SAD: FrameSequence = FrameSequence {
    frames: &[
        pose(5, -1, E::Open, M::Frown),
        pose(6, -2, E::Closed, M::Frown),
    ],
    fps: 2,
};

static SURPRISED: FrameSequence = FrameSequence {
    frames: &[
        pose(0, 2, E::Wide, M::Round),
        pose(0, 3, E::Wide, M::Round),
        pose(0, 2, E::Wide, M::Open),
    ],
    fps: 8,
};

static ANGRY: FrameSequence = FrameSequence {
    frames: &[
        pose(0, 0, E::Squint, M::Frown),
        pose(1, -1, E::Squint, M::Frown),
        pose(-1, -1, E::Squint, M::Frown),
    ],
    fps: 8,
};

static CONFUSED: FrameSequence = FrameSequence {
    frames: &[
        pose(12, 0, E::Open, M::Flat),
        pose(14, 0, E::Squint, M::Flat),
        pose(12, 0, E::Open, M::Round),
    ],
    fps: 3,
};

static NEUTRAL: FrameSequence = FrameSequence {
    frames: &[pose(0, 0, E::Open, M::Flat), pose(0, 0, E::Closed, M::Flat)],
    fps: 2,
};

static CALM: FrameSequence = FrameSequence {
    frames: &[
        pose(0, 0, E::Closed, M::Smile),
        pose(0, 1, E::Closed, M::Smile),
        pose(0, 1, E::Open, M::Smile),
        pose(0, 0, E::Closed, M::Smile),
    ],
    fps: 2,
};

static EXCITED: FrameSequence = FrameSequence {
    frames: &[
        pose(0, 2, E::Wide, M::Grin),
        pose(4, 5, E::Wide, M::Grin),
        pose(0, 2, E::Squint, M::Open),
        pose(-4, 5, E::Wide, M::Grin),
    ],
    fps: 12,
};

static CURIOUS: FrameSequence = FrameSequence {
    frames: &[
        pose(8, 0, E::Wide, M::Closed),
        pose(10, 1, E::Wide, M::Round),
        pose(8, 0, E::Open, M::Closed),
    ],
    fps: 4,
};

static ANXIOUS: FrameSequence = FrameSequence {
    frames: &[
        pose(-2, 0, E::Wide, M::Flat),
        pose(2, 0, E::Wide, M::Flat),
        pose(-2, -1, E::Open, M::Frown),
        pose(2, -1, E::Wide, M::Flat),
    ],
    fps: 10,
};

/// Frame loop and playback rate for `state`.
pub fn sequence(state: AnimState) -> &'static FrameSequence {
    match state {
        AnimState::Idle => &IDLE,
        AnimState::Talking => &TALKING,
        AnimState::Thinking => &THINKING,
        AnimState::Happy => &HAPPY,
        AnimState::Sad => &SAD,
        AnimState::Surprised => &SURPRISED,
        AnimState::Angry => &ANGRY,
        AnimState::Confused => &CONFUSED,
        AnimState::Neutral => &NEUTRAL,
        AnimState::Calm => &CALM,
        AnimState::Excited => &EXCITED,
        AnimState::Curious => &CURIOUS,
        AnimState::Anxious => &ANXIOUS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_state_has_a_playable_loop() {
        for state in AnimState::ALL {
            let seq = sequence(state);
            assert!(!seq.is_empty(), "{state} has no frames");
            assert!(seq.fps > 0, "{state} has zero fps");
        }
    }

    #[test]
    fn frame_period_is_millis_per_frame() {
        assert_eq!(sequence(AnimState::Talking).frame_period(), Duration::from_millis(100));
        assert_eq!(sequence(AnimState::Thinking).frame_period(), Duration::from_millis(333));
    }

    #[test]
    fn pose_wraps_around() {
        let seq = sequence(AnimState::Sad);
        assert_eq!(seq.pose(0), seq.pose(seq.len()));
        assert_eq!(seq.pose(1), seq.pose(seq.len() * 3 + 1));
        assert!(seq.pose(0).is_some());
    }

    #[test]
    fn frame_period_never_reaches_zero() {
        const FAST_FRAMES: &[PoseFrame] = &[pose(0, 0, E::Open, M::Closed)];
        let fast = FrameSequence {
            frames: FAST_FRAMES,
            fps: 2000,
        };
        assert_eq!(fast.frame_period(), Duration::from_millis(1));

        let stalled = FrameSequence { frames: &[], fps: 0 };
        assert_eq!(stalled.frame_period(), Duration::from_secs(1));
    }

    #[test]
    fn empty_loop_has_no_pose() {
        let empty = FrameSequence { frames: &[], fps: 10 };
        assert_eq!(empty.pose(0), None);
        assert_eq!(empty.pose(7), None);
    }
}
