//! Gesture subsystem: landmark model, smoothing, mapping, classification
//! and the pinch state machine.
//!
//! Everything here is single-writer per tracking session and free of
//! locking; see [`crate::pipeline`] for the owner of these pieces and
//! [`crate::channel`] for the thread-safe hand-off to consumers.

pub mod classifier;
pub mod config;
pub mod filter;
pub mod hand_tracking;
pub mod mapper;
pub mod state_machine;

pub use classifier::{PoseClassifier, PoseHeuristic, PoseLabel};
pub use config::{ConfigError, FilterConfig, GestureConfig};
pub use filter::AxisFilter;
pub use hand_tracking::{
    DetectedHand, FrameError, HandFrame, HandJoint, HandLandmarks, Handedness, Landmark,
    LANDMARK_COUNT,
};
pub use mapper::{CoordinateMapper, ScreenPoint};
pub use state_machine::{GestureStateMachine, GestureType, StateMachineContext};
