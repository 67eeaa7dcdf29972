//! Hand landmark data model.
//!
//! Models the 21 landmarks per hand produced by the external pose
//! estimator, plus the per-frame record that carries them into the
//! pipeline.  Coordinates are normalized image space: x and y in [0, 1]
//! with y growing downward, z a relative depth.

use std::ops::Index;

use lexpr::Value;
use thiserror::Error;

use crate::sexp::{as_number, get_float, get_int, get_keyword, get_value, list_items};

// ── Joint definitions ──────────────────────────────────────

/// The 21 hand landmarks, in model output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandJoint {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// Total number of landmarks per hand.
pub const LANDMARK_COUNT: usize = 21;

impl HandJoint {
    /// Convert joint enum to array index (0-20).
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// String representation for records and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wrist => "wrist",
            Self::ThumbCmc => "thumb-cmc",
            Self::ThumbMcp => "thumb-mcp",
            Self::ThumbIp => "thumb-ip",
            Self::ThumbTip => "thumb-tip",
            Self::IndexMcp => "index-mcp",
            Self::IndexPip => "index-pip",
            Self::IndexDip => "index-dip",
            Self::IndexTip => "index-tip",
            Self::MiddleMcp => "middle-mcp",
            Self::MiddlePip => "middle-pip",
            Self::MiddleDip => "middle-dip",
            Self::MiddleTip => "middle-tip",
            Self::RingMcp => "ring-mcp",
            Self::RingPip => "ring-pip",
            Self::RingDip => "ring-dip",
            Self::RingTip => "ring-tip",
            Self::PinkyMcp => "pinky-mcp",
            Self::PinkyPip => "pinky-pip",
            Self::PinkyDip => "pinky-dip",
            Self::PinkyTip => "pinky-tip",
        }
    }
}

// ── Handedness ─────────────────────────────────────────────

/// Which hand the estimator believes it saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// Parse the estimator's category label ("Left"/"Right").
    /// Anything else yields `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        if label.eq_ignore_ascii_case("left") {
            Some(Self::Left)
        } else if label.eq_ignore_ascii_case("right") {
            Some(Self::Right)
        } else {
            None
        }
    }
}

// ── Landmarks ──────────────────────────────────────────────

/// A single normalized landmark.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Planar (x, y) distance to another landmark.  Depth is ignored
    /// because the estimator's z is not on the same scale as x and y.
    pub fn planar_distance(&self, other: &Landmark) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Error building a landmark set from untrusted input.
#[derive(Debug, Error, PartialEq)]
pub enum FrameError {
    #[error("expected {LANDMARK_COUNT} landmarks, got {0}")]
    LandmarkCount(usize),
    #[error("landmark {index} is not a list of three numbers")]
    BadLandmark { index: usize },
    #[error("frame record has no :timestamp")]
    MissingTimestamp,
    #[error("malformed frame record: {0}")]
    Malformed(String),
}

/// The full, fixed-size landmark set for one hand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandLandmarks([Landmark; LANDMARK_COUNT]);

impl HandLandmarks {
    pub fn new(points: [Landmark; LANDMARK_COUNT]) -> Self {
        Self(points)
    }

    /// Build from a slice, failing unless it holds exactly 21 landmarks.
    pub fn from_slice(points: &[Landmark]) -> Result<Self, FrameError> {
        let points: [Landmark; LANDMARK_COUNT] = points
            .try_into()
            .map_err(|_| FrameError::LandmarkCount(points.len()))?;
        Ok(Self(points))
    }

    pub fn as_slice(&self) -> &[Landmark] {
        &self.0
    }

    /// Planar distance between two joints.
    pub fn joint_distance(&self, a: HandJoint, b: HandJoint) -> f32 {
        self[a].planar_distance(&self[b])
    }
}

impl Index<HandJoint> for HandLandmarks {
    type Output = Landmark;

    fn index(&self, joint: HandJoint) -> &Landmark {
        &self.0[joint.index()]
    }
}

// ── Frames ─────────────────────────────────────────────────

/// One hand as reported by the estimator.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedHand {
    pub landmarks: HandLandmarks,
    pub handedness: Option<Handedness>,
    /// Handedness confidence (0.0-1.0), if the estimator reported one.
    pub confidence: Option<f32>,
}

/// A timestamped estimator result.  Only the first hand is consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct HandFrame {
    /// Monotonic milliseconds.
    pub timestamp_ms: i64,
    pub hands: Vec<DetectedHand>,
}

impl HandFrame {
    /// A frame in which no hand was detected.
    pub fn empty(timestamp_ms: i64) -> Self {
        Self {
            timestamp_ms,
            hands: Vec::new(),
        }
    }

    pub fn with_hand(timestamp_ms: i64, hand: DetectedHand) -> Self {
        Self {
            timestamp_ms,
            hands: vec![hand],
        }
    }

    /// The hand this core tracks.
    pub fn primary_hand(&self) -> Option<&DetectedHand> {
        self.hands.first()
    }

    /// Parse a frame record:
    ///
    /// ```text
    /// (:timestamp 120
    ///  :hands ((:handedness "Right" :confidence 0.97
    ///           :landmarks ((0.51 0.62 0.0) ... ))))
    /// ```
    ///
    /// A missing or empty `:hands` is a frame with no hand.
    pub fn from_sexp(text: &str) -> Result<Self, FrameError> {
        let value = lexpr::from_str(text).map_err(|e| FrameError::Malformed(e.to_string()))?;
        let timestamp_ms = get_int(&value, "timestamp").ok_or(FrameError::MissingTimestamp)?;

        let hands = match get_value(&value, "hands") {
            Some(list) => list_items(list)
                .into_iter()
                .map(parse_hand)
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };
        Ok(Self {
            timestamp_ms,
            hands,
        })
    }

    /// Generate the record form accepted by [`from_sexp`](Self::from_sexp).
    pub fn to_sexp(&self) -> String {
        let hands: Vec<String> = self
            .hands
            .iter()
            .map(|hand| {
                let points: Vec<String> = hand
                    .landmarks
                    .as_slice()
                    .iter()
                    .map(|p| format!("({} {} {})", p.x, p.y, p.z))
                    .collect();
                let mut fields = Vec::new();
                if let Some(h) = hand.handedness {
                    fields.push(format!(":handedness \"{}\"", h.as_str()));
                }
                if let Some(c) = hand.confidence {
                    fields.push(format!(":confidence {}", c));
                }
                fields.push(format!(":landmarks ({})", points.join(" ")));
                format!("({})", fields.join(" "))
            })
            .collect();
        format!(
            "(:timestamp {} :hands ({}))",
            self.timestamp_ms,
            hands.join(" ")
        )
    }
}

fn parse_hand(value: &Value) -> Result<DetectedHand, FrameError> {
    let list = get_value(value, "landmarks")
        .ok_or_else(|| FrameError::Malformed("hand without :landmarks".to_string()))?;

    let points = list_items(list)
        .into_iter()
        .enumerate()
        .map(|(index, point)| {
            let coords: Option<Vec<f64>> = list_items(point).into_iter().map(as_number).collect();
            match coords.as_deref() {
                Some([x, y, z]) => Ok(Landmark::new(*x as f32, *y as f32, *z as f32)),
                _ => Err(FrameError::BadLandmark { index }),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DetectedHand {
        landmarks: HandLandmarks::from_slice(&points)?,
        handedness: get_keyword(value, "handedness").and_then(|l| Handedness::from_label(&l)),
        confidence: get_float(value, "confidence").map(|c| c as f32),
    })
}

// ── Test helpers ───────────────────────────────────────────

/// Every landmark at one position; tests move the joints they care about.
#[cfg(test)]
pub(crate) fn uniform_hand(x: f32, y: f32) -> HandLandmarks {
    HandLandmarks::new([Landmark::new(x, y, 0.0); LANDMARK_COUNT])
}

#[cfg(test)]
pub(crate) fn set_joint(hand: &mut HandLandmarks, joint: HandJoint, x: f32, y: f32) {
    hand.0[joint.index()] = Landmark::new(x, y, 0.0);
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_indices() {
        assert_eq!(HandJoint::Wrist.index(), 0);
        assert_eq!(HandJoint::ThumbTip.index(), 4);
        assert_eq!(HandJoint::IndexPip.index(), 6);
        assert_eq!(HandJoint::IndexTip.index(), 8);
        assert_eq!(HandJoint::PinkyTip.index(), 20);
        assert_eq!(HandJoint::PinkyTip.index() + 1, LANDMARK_COUNT);
    }

    #[test]
    fn test_joint_as_str() {
        assert_eq!(HandJoint::Wrist.as_str(), "wrist");
        assert_eq!(HandJoint::ThumbTip.as_str(), "thumb-tip");
        assert_eq!(HandJoint::IndexTip.as_str(), "index-tip");
        assert_eq!(HandJoint::PinkyTip.as_str(), "pinky-tip");
    }

    #[test]
    fn test_from_slice_wrong_count() {
        let points = vec![Landmark::default(); 10];
        assert_eq!(
            HandLandmarks::from_slice(&points),
            Err(FrameError::LandmarkCount(10))
        );
    }

    #[test]
    fn test_from_slice_indexing() {
        let points: Vec<Landmark> = (0..LANDMARK_COUNT)
            .map(|i| Landmark::new(i as f32 * 0.01, 0.0, 0.0))
            .collect();
        let hand = HandLandmarks::from_slice(&points).unwrap();
        assert!((hand[HandJoint::IndexTip].x - 0.08).abs() < 1e-6);
        assert_eq!(hand.as_slice().len(), LANDMARK_COUNT);
    }

    #[test]
    fn test_joint_distance() {
        let mut hand = uniform_hand(0.0, 0.0);
        set_joint(&mut hand, HandJoint::ThumbTip, 0.0, 0.0);
        set_joint(&mut hand, HandJoint::IndexTip, 0.3, 0.4);
        let dist = hand.joint_distance(HandJoint::ThumbTip, HandJoint::IndexTip);
        assert!((dist - 0.5).abs() < 1e-6, "Expected 0.5, got {}", dist);
    }

    #[test]
    fn test_handedness_from_label() {
        assert_eq!(Handedness::from_label("Left"), Some(Handedness::Left));
        assert_eq!(Handedness::from_label("right"), Some(Handedness::Right));
        assert_eq!(Handedness::from_label("Unknown"), None);
        assert_eq!(Handedness::Right.as_str(), "right");
    }

    #[test]
    fn test_primary_hand() {
        assert!(HandFrame::empty(0).primary_hand().is_none());
        let hand = DetectedHand {
            landmarks: uniform_hand(0.5, 0.5),
            handedness: Some(Handedness::Left),
            confidence: Some(0.9),
        };
        let frame = HandFrame::with_hand(10, hand.clone());
        assert_eq!(frame.primary_hand(), Some(&hand));
    }

    #[test]
    fn test_frame_from_sexp() {
        let points: Vec<String> = (0..LANDMARK_COUNT)
            .map(|i| format!("({} 0.5 0)", i as f32 * 0.01))
            .collect();
        let text = format!(
            "(:timestamp 120 :hands ((:handedness \"Right\" :confidence 0.97 :landmarks ({}))))",
            points.join(" ")
        );
        let frame = HandFrame::from_sexp(&text).unwrap();
        assert_eq!(frame.timestamp_ms, 120);
        let hand = frame.primary_hand().unwrap();
        assert_eq!(hand.handedness, Some(Handedness::Right));
        assert!((hand.landmarks[HandJoint::IndexTip].x - 0.08).abs() < 1e-6);
        assert!((hand.confidence.unwrap() - 0.97).abs() < 1e-6);
    }

    #[test]
    fn test_frame_from_sexp_no_hands() {
        assert_eq!(
            HandFrame::from_sexp("(:timestamp 5)").unwrap(),
            HandFrame::empty(5)
        );
        assert_eq!(
            HandFrame::from_sexp("(:timestamp 5 :hands ())").unwrap(),
            HandFrame::empty(5)
        );
    }

    #[test]
    fn test_frame_from_sexp_errors() {
        assert_eq!(
            HandFrame::from_sexp("(:hands ())"),
            Err(FrameError::MissingTimestamp)
        );
        assert_eq!(
            HandFrame::from_sexp("(:timestamp 1 :hands ((:landmarks ((0.1 0.2 0.0)))))"),
            Err(FrameError::LandmarkCount(1))
        );
        assert_eq!(
            HandFrame::from_sexp("(:timestamp 1 :hands ((:landmarks ((0.1)))))"),
            Err(FrameError::BadLandmark { index: 0 })
        );
        assert_eq!(
            HandFrame::from_sexp("(:timestamp 1 :hands ((:landmarks ((0.1 0.2)))))"),
            Err(FrameError::BadLandmark { index: 0 })
        );
        assert!(matches!(
            HandFrame::from_sexp("(:timestamp 1 :hands ((:handedness \"Left\")))"),
            Err(FrameError::Malformed(_))
        ));
        assert!(matches!(
            HandFrame::from_sexp("(:timestamp"),
            Err(FrameError::Malformed(_))
        ));
    }

    #[test]
    fn test_frame_from_sexp_rejects_non_numeric_coordinate() {
        let points: Vec<String> = (0..LANDMARK_COUNT)
            .map(|i| {
                if i == HandJoint::IndexTip.index() {
                    "(0.1 oops 0.9)".to_string()
                } else {
                    "(0.5 0.5 0.0)".to_string()
                }
            })
            .collect();
        let text = format!("(:timestamp 3 :hands ((:landmarks ({}))))", points.join(" "));
        assert_eq!(
            HandFrame::from_sexp(&text),
            Err(FrameError::BadLandmark { index: 8 })
        );
    }

    #[test]
    fn test_frame_sexp_reparses() {
        let hand = DetectedHand {
            landmarks: uniform_hand(0.25, 0.75),
            handedness: Some(Handedness::Left),
            confidence: None,
        };
        let frame = HandFrame::with_hand(42, hand);
        assert_eq!(HandFrame::from_sexp(&frame.to_sexp()).unwrap(), frame);
    }
}
