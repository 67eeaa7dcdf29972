//! Per-frame pose classification from landmark geometry.
//!
//! Stateless: one landmark set in, one [`PoseLabel`] out.  When checks
//! disagree, fist/pinch wins over open hand, which wins over pointing.

use super::config::GestureConfig;
use super::hand_tracking::{HandJoint, HandLandmarks};

// ── Labels ─────────────────────────────────────────────────

/// Raw pose of a single frame, with no memory across frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoseLabel {
    /// No hand in the frame.
    Idle,
    /// Fingers spread away from the wrist.
    OpenHand,
    /// Fist or thumb-index pinch.
    Fist,
    /// Anything else with a hand present.
    Pointing,
}

impl PoseLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::OpenHand => "open-hand",
            Self::Fist => "fist",
            Self::Pointing => "pointing",
        }
    }

    /// Whether this pose drives the pinch states.
    pub fn is_fist_class(&self) -> bool {
        matches!(self, Self::Fist)
    }
}

/// Which geometric test set the classifier applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoseHeuristic {
    /// Thumb-index proximity for a pinch, fingertip-to-wrist reach for an
    /// open hand, pointing otherwise.
    Distance,
    /// Index fingertip against its PIP joint: below is curled (fist),
    /// above is extended (open hand), level is pointing.
    Curl,
}

impl PoseHeuristic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Distance => "distance",
            Self::Curl => "curl",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "distance" => Some(Self::Distance),
            "curl" => Some(Self::Curl),
            _ => None,
        }
    }
}

// ── Classifier ─────────────────────────────────────────────

/// Maps one frame's landmarks to a [`PoseLabel`].
#[derive(Debug, Clone)]
pub struct PoseClassifier {
    heuristic: PoseHeuristic,
    pinch_distance: f32,
    open_index_distance: f32,
    open_pinky_distance: f32,
}

impl PoseClassifier {
    pub fn new(config: &GestureConfig) -> Self {
        Self {
            heuristic: config.heuristic,
            pinch_distance: config.pinch_distance,
            open_index_distance: config.open_index_distance,
            open_pinky_distance: config.open_pinky_distance,
        }
    }

    pub fn heuristic(&self) -> PoseHeuristic {
        self.heuristic
    }

    /// Classify a single hand.
    pub fn classify(&self, hand: &HandLandmarks) -> PoseLabel {
        match self.heuristic {
            PoseHeuristic::Distance => self.classify_by_distance(hand),
            PoseHeuristic::Curl => Self::classify_by_curl(hand),
        }
    }

    fn classify_by_distance(&self, hand: &HandLandmarks) -> PoseLabel {
        // Pinch: thumb tip close to index tip
        if hand.joint_distance(HandJoint::ThumbTip, HandJoint::IndexTip) < self.pinch_distance {
            return PoseLabel::Fist;
        }

        let index_reach = hand.joint_distance(HandJoint::IndexTip, HandJoint::Wrist);
        let pinky_reach = hand.joint_distance(HandJoint::PinkyTip, HandJoint::Wrist);
        if index_reach > self.open_index_distance && pinky_reach > self.open_pinky_distance {
            return PoseLabel::OpenHand;
        }

        PoseLabel::Pointing
    }

    fn classify_by_curl(hand: &HandLandmarks) -> PoseLabel {
        // y grows downward: a tip below its PIP joint is curled
        let tip_y = hand[HandJoint::IndexTip].y;
        let pip_y = hand[HandJoint::IndexPip].y;
        if tip_y > pip_y {
            PoseLabel::Fist
        } else if tip_y < pip_y {
            PoseLabel::OpenHand
        } else {
            PoseLabel::Pointing
        }
    }
}

// ── Tests ──────────────────────────────────────────────────
