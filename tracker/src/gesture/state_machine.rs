//! Temporal gesture state machine.
//!
//! Turns the per-frame [`PoseLabel`] stream into stabilized gesture
//! states.  A fist/pinch pose enters `PinchStart`, becomes `PinchHold`
//! once held past the hold threshold, and ends in a one-frame
//! `PinchRelease`.  A release straight out of `PinchStart` is a click.

use tracing::debug;

use super::classifier::PoseLabel;
use super::config::GestureConfig;

// ── Gesture types ──────────────────────────────────────────

/// Stabilized gesture type emitted once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureType {
    Idle,
    OpenHand,
    Fist,
    Pointing,
    PinchStart,
    PinchHold,
    PinchRelease,
}

impl GestureType {
    /// String representation for records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::OpenHand => "open-hand",
            Self::Fist => "fist",
            Self::Pointing => "pointing",
            Self::PinchStart => "pinch-start",
            Self::PinchHold => "pinch-hold",
            Self::PinchRelease => "pinch-release",
        }
    }

    /// Whether the hand is currently closed (fist or pinch in progress).
    pub fn is_fist_class(&self) -> bool {
        matches!(self, Self::Fist | Self::PinchStart | Self::PinchHold)
    }
}

impl From<PoseLabel> for GestureType {
    fn from(label: PoseLabel) -> Self {
        match label {
            PoseLabel::Idle => Self::Idle,
            PoseLabel::OpenHand => Self::OpenHand,
            PoseLabel::Fist => Self::Fist,
            PoseLabel::Pointing => Self::Pointing,
        }
    }
}

// ── Context ────────────────────────────────────────────────

/// Current stabilized state and when it began.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateMachineContext {
    pub state: GestureType,
    pub since_ms: i64,
}

impl Default for StateMachineContext {
    fn default() -> Self {
        Self {
            state: GestureType::Idle,
            since_ms: 0,
        }
    }
}

// ── State machine ──────────────────────────────────────────

/// Pinch/hold/release state machine for one tracking session.
#[derive(Debug, Clone)]
pub struct GestureStateMachine {
    /// Time (ms) before PinchStart transitions to PinchHold.
    hold_threshold_ms: i64,
    context: StateMachineContext,
}

impl GestureStateMachine {
    pub fn new(config: &GestureConfig) -> Self {
        Self {
            hold_threshold_ms: config.hold_threshold_ms,
            context: StateMachineContext::default(),
        }
    }

    pub fn context(&self) -> StateMachineContext {
        self.context
    }

    /// Feed one raw pose and return the stabilized state for this frame.
    pub fn process(&mut self, raw: PoseLabel, timestamp_ms: i64) -> GestureType {
        let fist = raw.is_fist_class();
        let current = self.context.state;

        let next = match current {
            GestureType::Idle
            | GestureType::OpenHand
            | GestureType::Pointing
            | GestureType::Fist => {
                if fist {
                    GestureType::PinchStart
                } else {
                    raw.into()
                }
            }
            GestureType::PinchStart => {
                if !fist {
                    // Quick release: a click
                    GestureType::PinchRelease
                } else if timestamp_ms.saturating_sub(self.context.since_ms)
                    >= self.hold_threshold_ms
                {
                    GestureType::PinchHold
                } else {
                    GestureType::PinchStart
                }
            }
            GestureType::PinchHold => {
                if fist {
                    GestureType::PinchHold
                } else {
                    GestureType::PinchRelease
                }
            }
            // One-frame transient: follow the raw label.  A raw fist here
            // surfaces as Fist and becomes PinchStart on the next fist frame.
            GestureType::PinchRelease => raw.into(),
        };

        if next != current {
            self.transition(next, timestamp_ms);
        }
        next
    }

    fn transition(&mut self, state: GestureType, timestamp_ms: i64) {
        debug!(
            from = self.context.state.as_str(),
            to = state.as_str(),
            held_ms = timestamp_ms.saturating_sub(self.context.since_ms),
            "gesture transition"
        );
        self.context = StateMachineContext {
            state,
            since_ms: timestamp_ms,
        };
    }

    /// Back to Idle, as at session start.
    pub fn reset(&mut self) {
        self.context = StateMachineContext::default();
    }

    /// Generate s-expression for status reporting.
    pub fn status_sexp(&self) -> String {
        format!(
            "(:state {} :since-ms {} :hold-threshold-ms {})",
            self.context.state.as_str(),
            self.context.since_ms,
            self.hold_threshold_ms,
        )
    }
}

// ── Tests ──────────────────────────────────────────────────
