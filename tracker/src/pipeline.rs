//! Per-session tracking pipeline.
//!
//! Owns the classifier, state machine and coordinate mapper for one
//! tracking session.  `process` takes `&mut self`, so the single-writer
//! rule is enforced by ownership: whichever thread holds the pipeline
//! is the only one feeding it frames.

use tracing::{debug, info};

use crate::gesture::{
    ConfigError, CoordinateMapper, GestureConfig, GestureStateMachine, GestureType, HandFrame,
    HandJoint, HandLandmarks, Handedness, PoseClassifier, PoseLabel, ScreenPoint,
};

/// Stabilized output for one input frame.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureState {
    pub gesture: GestureType,
    /// Tracked point (index fingertip), normalized.  Zero when no hand.
    pub x: f32,
    pub y: f32,
    /// Tracked point in pixel space; `None` when no hand was present.
    pub pointer: Option<ScreenPoint>,
    pub timestamp_ms: i64,
    pub landmarks: Option<HandLandmarks>,
    pub handedness: Option<Handedness>,
}

impl GestureState {
    /// Generate s-expression for this state (landmarks omitted).
    pub fn to_sexp(&self) -> String {
        let pointer = match self.pointer {
            Some(p) => format!("({:.1} {:.1})", p.x, p.y),
            None => "nil".to_string(),
        };
        format!(
            "(:gesture {} :x {:.4} :y {:.4} :pointer {} :timestamp {} :handedness {})",
            self.gesture.as_str(),
            self.x,
            self.y,
            pointer,
            self.timestamp_ms,
            self.handedness.map(|h| h.as_str()).unwrap_or("nil"),
        )
    }
}

/// Classifier -> state machine -> mapper, for one tracking session.
pub struct TrackingPipeline {
    config: GestureConfig,
    classifier: PoseClassifier,
    machine: GestureStateMachine,
    mapper: CoordinateMapper,
    /// Frames processed this session.
    frames: u64,
    /// Frames this session that carried a hand.
    hand_frames: u64,
}

impl TrackingPipeline {
    /// Build a pipeline targeting a `width` x `height` pixel space.
    pub fn new(config: GestureConfig, width: u32, height: u32) -> Result<Self, ConfigError> {
        config.validate()?;
        let mapper = CoordinateMapper::new(width, height, &config)?;
        info!(
            width,
            height,
            heuristic = config.heuristic.as_str(),
            "tracking session started"
        );
        Ok(Self {
            classifier: PoseClassifier::new(&config),
            machine: GestureStateMachine::new(&config),
            mapper,
            config,
            frames: 0,
            hand_frames: 0,
        })
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Run one frame through the pipeline.
    pub fn process(&mut self, frame: &HandFrame) -> GestureState {
        self.frames += 1;
        let timestamp_ms = frame.timestamp_ms;

        let Some(hand) = frame.primary_hand() else {
            let gesture = self.machine.process(PoseLabel::Idle, timestamp_ms);
            return GestureState {
                gesture,
                x: 0.0,
                y: 0.0,
                pointer: None,
                timestamp_ms,
                landmarks: None,
                handedness: None,
            };
        };
        self.hand_frames += 1;

        let raw = self.classifier.classify(&hand.landmarks);
        let gesture = self.machine.process(raw, timestamp_ms);

        let tip = hand.landmarks[HandJoint::IndexTip];
        let pointer = self.mapper.map(tip.x, tip.y, timestamp_ms);
        debug!(
            raw = raw.as_str(),
            gesture = gesture.as_str(),
            x = pointer.x,
            y = pointer.y,
            timestamp_ms,
            "frame processed"
        );

        GestureState {
            gesture,
            x: tip.x,
            y: tip.y,
            pointer: Some(pointer),
            timestamp_ms,
            landmarks: Some(hand.landmarks),
            handedness: hand.handedness,
        }
    }

    /// Start a new tracking session: clear filter memory and return the
    /// state machine to Idle before the next frame is accepted.
    pub fn reset(&mut self) {
        self.mapper.reset();
        self.machine.reset();
        info!(
            frames = self.frames,
            hand_frames = self.hand_frames,
            "tracking session reset"
        );
        self.frames = 0;
        self.hand_frames = 0;
    }

    /// Generate s-expression for pipeline status.
    pub fn status_sexp(&self) -> String {
        let (width, height) = self.mapper.dimensions();
        format!(
            "(:frames {} :hand-frames {} :viewport ({} {}) :machine {})",
            self.frames,
            self.hand_frames,
            width,
            height,
            self.machine.status_sexp(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::hand_tracking::{set_joint, uniform_hand};
    use crate::gesture::DetectedHand;

    fn pipeline() -> TrackingPipeline {
        TrackingPipeline::new(GestureConfig::default(), 1000, 1000).unwrap()
    }

    /// Index extended, pinky curled, thumb away: pointing.
    fn pointing_hand(tip_x: f32, tip_y: f32) -> DetectedHand {
        let mut landmarks = uniform_hand(0.5, 0.9);
        set_joint(&mut landmarks, HandJoint::ThumbTip, 0.2, 0.9);
        set_joint(&mut landmarks, HandJoint::IndexTip, tip_x, tip_y);
        DetectedHand {
            landmarks,
            handedness: Some(Handedness::Right),
            confidence: Some(0.95),
        }
    }

    fn pinching_hand() -> DetectedHand {
        let mut hand = pointing_hand(0.5, 0.5);
        set_joint(&mut hand.landmarks, HandJoint::ThumbTip, 0.51, 0.5);
        hand
    }

    #[test]
    fn test_empty_frame_is_idle() {
        let mut p = pipeline();
        let state = p.process(&HandFrame::empty(0));
        assert_eq!(state.gesture, GestureType::Idle);
        assert!(state.pointer.is_none());
        assert!(state.landmarks.is_none());
    }

    #[test]
    fn test_tracks_index_tip() {
        let mut p = pipeline();
        let state = p.process(&HandFrame::with_hand(0, pointing_hand(0.5, 0.5)));
        assert_eq!(state.gesture, GestureType::Pointing);
        assert_eq!(state.handedness, Some(Handedness::Right));
        assert!((state.x - 0.5).abs() < 1e-6);
        let pointer = state.pointer.unwrap();
        assert!((pointer.x - 500.0).abs() < 1e-2, "x = {}", pointer.x);
        assert!((pointer.y - 500.0).abs() < 1e-2, "y = {}", pointer.y);
    }

    #[test]
    fn test_pinch_click_sequence() {
        let mut p = pipeline();
        let kinds: Vec<GestureType> = [
            HandFrame::with_hand(0, pointing_hand(0.5, 0.5)),
            HandFrame::with_hand(50, pinching_hand()),
            HandFrame::with_hand(100, pointing_hand(0.5, 0.5)),
            HandFrame::with_hand(150, pointing_hand(0.5, 0.5)),
        ]
        .iter()
        .map(|f| p.process(f).gesture)
        .collect();
        assert_eq!(
            kinds,
            vec![
                GestureType::Pointing,
                GestureType::PinchStart,
                GestureType::PinchRelease,
                GestureType::Pointing,
            ]
        );
    }

    #[test]
    fn test_only_first_hand_used() {
        let mut p = pipeline();
        let frame = HandFrame {
            timestamp_ms: 0,
            hands: vec![pointing_hand(0.5, 0.5), pinching_hand()],
        };
        assert_eq!(p.process(&frame).gesture, GestureType::Pointing);
    }

    #[test]
    fn test_reset_clears_session() {
        let mut p = pipeline();
        p.process(&HandFrame::with_hand(0, pointing_hand(0.5, 0.5)));
        p.process(&HandFrame::with_hand(50, pinching_hand()));
        p.process(&HandFrame::with_hand(400, pinching_hand()));
        assert!(p.status_sexp().contains(":state pinch-hold"));

        p.reset();
        assert!(p.status_sexp().contains(":frames 0"));
        assert!(p.status_sexp().contains(":state idle"));

        // no smoothing carried over: a far point lands exactly
        let state = p.process(&HandFrame::with_hand(500, pointing_hand(0.1, 0.9)));
        let pointer = state.pointer.unwrap();
        assert!((pointer.x - 1000.0).abs() < 1e-2, "x = {}", pointer.x);
        assert!((pointer.y - 1000.0).abs() < 1e-2, "y = {}", pointer.y);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = GestureConfig {
            margin_x: 0.7,
            ..GestureConfig::default()
        };
        assert!(TrackingPipeline::new(config, 100, 100).is_err());
        assert!(TrackingPipeline::new(GestureConfig::default(), 0, 100).is_err());
    }

    #[test]
    fn test_state_sexp() {
        let mut p = pipeline();
        let state = p.process(&HandFrame::with_hand(7, pointing_hand(0.5, 0.5)));
        let sexp = state.to_sexp();
        assert!(sexp.contains(":gesture pointing"));
        assert!(sexp.contains(":timestamp 7"));
        assert!(sexp.contains(":handedness right"));
        assert!(sexp.contains(":pointer (500.0 500.0)"));
    }
}
