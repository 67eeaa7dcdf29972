//! Gesture states to control actions.
//!
//! Consumers of the event channel decide what a gesture means.  Two
//! modes are provided: a pointer mode (move, click on pinch release) and
//! a media mode (next/previous by vertical swipe or a held open hand,
//! volume stepping while the hand is closed).

use tracing::debug;

use crate::gesture::{GestureConfig, GestureType};
use crate::pipeline::GestureState;

/// How a controller interprets gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    Pointer,
    Media,
}

impl ControlMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pointer => "pointer",
            Self::Media => "media",
        }
    }
}

/// Output of an [`ActionController`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlAction {
    MovePointer { x: f32, y: f32 },
    Click { x: f32, y: f32 },
    Next,
    Previous,
    SetVolume { percent: u8 },
}

impl ControlAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::MovePointer { .. } => "move",
            Self::Click { .. } => "click",
            Self::Next => "next",
            Self::Previous => "previous",
            Self::SetVolume { .. } => "volume",
        }
    }

    /// Generate s-expression for this action.
    pub fn to_sexp(&self) -> String {
        match self {
            Self::MovePointer { x, y } | Self::Click { x, y } => {
                format!("(:action {} :x {:.1} :y {:.1})", self.name(), x, y)
            }
            Self::SetVolume { percent } => {
                format!("(:action {} :percent {})", self.name(), percent)
            }
            Self::Next | Self::Previous => format!("(:action {})", self.name()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VolumeDirection {
    Up,
    Down,
}

/// Per-consumer gesture interpreter.
#[derive(Debug, Clone)]
pub struct ActionController {
    mode: ControlMode,
    directional_debounce_ms: i64,
    open_hand_debounce_ms: i64,
    vertical_motion_threshold: f32,
    volume_step: u8,
    volume_step_interval_ms: i64,
    initial_volume: u8,

    /// Gesture seen on the previous call.
    previous: GestureType,
    /// Index-tip Y on the previous hand frame.
    last_tip_y: Option<f32>,
    last_directional_ms: Option<i64>,
    /// Start of the current open-hand hold, and whether it already fired.
    open_since: Option<i64>,
    open_fired: bool,
    volume: u8,
    direction: VolumeDirection,
    last_volume_step_ms: Option<i64>,
}

impl ActionController {
    pub fn new(config: &GestureConfig, mode: ControlMode) -> Self {
        Self {
            mode,
            directional_debounce_ms: config.directional_debounce_ms,
            open_hand_debounce_ms: config.open_hand_debounce_ms,
            vertical_motion_threshold: config.vertical_motion_threshold,
            volume_step: config.volume_step_percent,
            volume_step_interval_ms: config.volume_step_interval_ms,
            initial_volume: config.initial_volume_percent,
            previous: GestureType::Idle,
            last_tip_y: None,
            last_directional_ms: None,
            open_since: None,
            open_fired: false,
            volume: config.initial_volume_percent,
            direction: VolumeDirection::Down,
            last_volume_step_ms: None,
        }
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    /// Current volume level, percent.
    pub fn volume(&self) -> u8 {
        self.volume
    }

    /// Interpret one state.  States must arrive in timestamp order; a
    /// coalescing channel may skip some, which only makes debouncing
    /// coarser.
    pub fn handle(&mut self, state: &GestureState) -> Vec<ControlAction> {
        let actions = match self.mode {
            ControlMode::Pointer => self.pointer_actions(state),
            ControlMode::Media => self.media_actions(state),
        };
        self.previous = state.gesture;

        for action in &actions {
            debug!(
                mode = self.mode.as_str(),
                action = action.name(),
                gesture = state.gesture.as_str(),
                timestamp_ms = state.timestamp_ms,
                "control action"
            );
        }
        actions
    }

    /// Forget all temporal state and restore the initial volume.
    pub fn reset(&mut self) {
        self.previous = GestureType::Idle;
        self.last_tip_y = None;
        self.last_directional_ms = None;
        self.open_since = None;
        self.open_fired = false;
        self.volume = self.initial_volume;
        self.direction = VolumeDirection::Down;
        self.last_volume_step_ms = None;
    }

    // ── Pointer mode ───────────────────────────────────────

    fn pointer_actions(&self, state: &GestureState) -> Vec<ControlAction> {
        // A release caused by losing the hand has no position: no click.
        let Some(p) = state.pointer else {
            return Vec::new();
        };
        let moved = ControlAction::MovePointer { x: p.x, y: p.y };

        match state.gesture {
            GestureType::Idle => Vec::new(),
            GestureType::OpenHand
            | GestureType::Fist
            | GestureType::Pointing
            | GestureType::PinchStart
            | GestureType::PinchHold => vec![moved],
            GestureType::PinchRelease => vec![moved, ControlAction::Click { x: p.x, y: p.y }],
        }
    }

    // ── Media mode ─────────────────────────────────────────

    fn media_actions(&mut self, state: &GestureState) -> Vec<ControlAction> {
        let ts = state.timestamp_ms;
        let mut actions = Vec::new();

        if state.pointer.is_some() {
            // Baseline follows every hand frame; only pointing motion counts.
            if let (Some(last_y), GestureType::Pointing) = (self.last_tip_y, state.gesture) {
                // y grows downward, so a positive delta is upward motion
                let delta = last_y - state.y;
                if delta.abs() > self.vertical_motion_threshold && self.directional_ready(ts) {
                    actions.push(if delta > 0.0 {
                        ControlAction::Next
                    } else {
                        ControlAction::Previous
                    });
                    self.last_directional_ms = Some(ts);
                }
            }
            self.last_tip_y = Some(state.y);
        } else {
            self.last_tip_y = None;
        }

        if state.gesture != GestureType::OpenHand {
            self.open_since = None;
            self.open_fired = false;
        }

        match state.gesture {
            GestureType::OpenHand => {
                let since = *self.open_since.get_or_insert(ts);
                if !self.open_fired && ts.saturating_sub(since) >= self.open_hand_debounce_ms {
                    self.open_fired = true;
                    self.last_directional_ms = Some(ts);
                    actions.push(ControlAction::Previous);
                }
            }
            GestureType::PinchStart => {
                if self.previous != GestureType::PinchStart {
                    self.direction = match self.direction {
                        VolumeDirection::Up => VolumeDirection::Down,
                        VolumeDirection::Down => VolumeDirection::Up,
                    };
                }
                actions.extend(self.volume_step(ts));
            }
            GestureType::PinchHold | GestureType::Fist => actions.extend(self.volume_step(ts)),
            GestureType::Idle | GestureType::Pointing | GestureType::PinchRelease => {}
        }
        actions
    }

    fn directional_ready(&self, ts: i64) -> bool {
        self.last_directional_ms
            .map_or(true, |last| ts.saturating_sub(last) >= self.directional_debounce_ms)
    }

    fn volume_step(&mut self, ts: i64) -> Option<ControlAction> {
        if let Some(last) = self.last_volume_step_ms {
            if ts.saturating_sub(last) < self.volume_step_interval_ms {
                return None;
            }
        }
        self.last_volume_step_ms = Some(ts);

        let next = match self.direction {
            VolumeDirection::Up => self.volume.saturating_add(self.volume_step).min(100),
            VolumeDirection::Down => self.volume.saturating_sub(self.volume_step),
        };
        if next == self.volume {
            return None;
        }
        self.volume = next;
        Some(ControlAction::SetVolume { percent: next })
    }
}
