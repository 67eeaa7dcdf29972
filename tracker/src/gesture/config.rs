//! Tunable thresholds for smoothing, mapping, classification and timing.

use thiserror::Error;

use super::classifier::PoseHeuristic;
use crate::sexp::{get_float, get_int, get_keyword};

/// Error validating or loading a [`GestureConfig`].
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{key} = {value} is out of range: {expected}")]
    OutOfRange {
        key: &'static str,
        value: f64,
        expected: &'static str,
    },
    #[error("unknown pose heuristic {0:?} (expected distance or curl)")]
    UnknownHeuristic(String),
    #[error("viewport must be non-empty, got {width}x{height}")]
    EmptyViewport { width: u32, height: u32 },
    #[error("malformed config s-expression: {0}")]
    Parse(String),
}

/// Parameters of one [`AxisFilter`](super::filter::AxisFilter).
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    /// Minimum cutoff frequency (Hz).
    pub min_cutoff: f32,
    /// Speed coefficient.
    pub beta: f32,
    /// Derivative cutoff frequency (Hz).
    pub d_cutoff: f32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_cutoff: 1.0,
            beta: 0.007,
            d_cutoff: 1.0,
        }
    }
}

/// Configuration for the whole gesture pipeline and its consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureConfig {
    /// Pointer smoothing, shared by the X and Y filters.
    pub filter: FilterConfig,
    /// Fraction of the input range ignored on each side of X.
    pub margin_x: f32,
    /// Fraction of the input range ignored on each side of Y.
    pub margin_y: f32,
    /// Which pose heuristic the classifier applies.
    pub heuristic: PoseHeuristic,
    /// Maximum thumb-tip to index-tip distance for a pinch.
    pub pinch_distance: f32,
    /// Minimum index-tip to wrist distance for an open hand.
    pub open_index_distance: f32,
    /// Minimum pinky-tip to wrist distance for an open hand.
    pub open_pinky_distance: f32,
    /// Time (ms) a pinch must be held before PinchStart becomes PinchHold.
    pub hold_threshold_ms: i64,
    /// Minimum time (ms) between two next/previous actions.
    pub directional_debounce_ms: i64,
    /// Time (ms) an open hand must be held to trigger "previous".
    pub open_hand_debounce_ms: i64,
    /// Upward index-tip travel (normalized) that triggers "next".
    pub vertical_motion_threshold: f32,
    /// Volume change per step, percent of full scale.
    pub volume_step_percent: u8,
    /// Minimum time (ms) between two volume steps.
    pub volume_step_interval_ms: i64,
    /// Volume level a new controller starts from.
    pub initial_volume_percent: u8,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            filter: FilterConfig::default(),
            margin_x: 0.1,
            margin_y: 0.1,
            heuristic: PoseHeuristic::Distance,
            pinch_distance: 0.08,
            open_index_distance: 0.2,
            open_pinky_distance: 0.15,
            hold_threshold_ms: 200,
            directional_debounce_ms: 600,
            open_hand_debounce_ms: 800,
            vertical_motion_threshold: 0.05,
            volume_step_percent: 10,
            volume_step_interval_ms: 200,
            initial_volume_percent: 50,
        }
    }
}

fn check(
    key: &'static str,
    value: f64,
    ok: bool,
    expected: &'static str,
) -> Result<(), ConfigError> {
    if ok && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            key,
            value,
            expected,
        })
    }
}

impl GestureConfig {
    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let f = &self.filter;
        check("min-cutoff", f.min_cutoff as f64, f.min_cutoff > 0.0, "> 0")?;
        check("beta", f.beta as f64, f.beta >= 0.0, ">= 0")?;
        check("d-cutoff", f.d_cutoff as f64, f.d_cutoff > 0.0, "> 0")?;
        for (key, margin) in [("margin-x", self.margin_x), ("margin-y", self.margin_y)] {
            check(key, margin as f64, (0.0..0.5).contains(&margin), "in [0, 0.5)")?;
        }
        for (key, dist) in [
            ("pinch-distance", self.pinch_distance),
            ("open-index-distance", self.open_index_distance),
            ("open-pinky-distance", self.open_pinky_distance),
            ("vertical-motion-threshold", self.vertical_motion_threshold),
        ] {
            check(key, dist as f64, dist > 0.0, "> 0")?;
        }
        for (key, ms) in [
            ("hold-threshold-ms", self.hold_threshold_ms),
            ("directional-debounce-ms", self.directional_debounce_ms),
            ("open-hand-debounce-ms", self.open_hand_debounce_ms),
            ("volume-step-interval-ms", self.volume_step_interval_ms),
        ] {
            check(key, ms as f64, ms >= 0, ">= 0")?;
        }
        check(
            "volume-step-percent",
            self.volume_step_percent as f64,
            (1..=100).contains(&self.volume_step_percent),
            "in 1..=100",
        )?;
        check(
            "initial-volume-percent",
            self.initial_volume_percent as f64,
            self.initial_volume_percent <= 100,
            "<= 100",
        )?;
        Ok(())
    }

    /// Load from a keyword plist, overriding defaults only for keys present.
    ///
    /// ```text
    /// (:min-cutoff 1.0 :beta 0.007 :hold-threshold-ms 250 :heuristic :curl)
    /// ```
    pub fn from_sexp(text: &str) -> Result<Self, ConfigError> {
        let value = lexpr::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut config = Self::default();

        if let Some(v) = get_float(&value, "min-cutoff") {
            config.filter.min_cutoff = v as f32;
        }
        if let Some(v) = get_float(&value, "beta") {
            config.filter.beta = v as f32;
        }
        if let Some(v) = get_float(&value, "d-cutoff") {
            config.filter.d_cutoff = v as f32;
        }
        if let Some(v) = get_float(&value, "margin-x") {
            config.margin_x = v as f32;
        }
        if let Some(v) = get_float(&value, "margin-y") {
            config.margin_y = v as f32;
        }
        if let Some(name) = get_keyword(&value, "heuristic") {
            config.heuristic =
                PoseHeuristic::parse(&name).ok_or(ConfigError::UnknownHeuristic(name))?;
        }
        if let Some(v) = get_float(&value, "pinch-distance") {
            config.pinch_distance = v as f32;
        }
        if let Some(v) = get_float(&value, "open-index-distance") {
            config.open_index_distance = v as f32;
        }
        if let Some(v) = get_float(&value, "open-pinky-distance") {
            config.open_pinky_distance = v as f32;
        }
        if let Some(v) = get_int(&value, "hold-threshold-ms") {
            config.hold_threshold_ms = v;
        }
        if let Some(v) = get_int(&value, "directional-debounce-ms") {
            config.directional_debounce_ms = v;
        }
        if let Some(v) = get_int(&value, "open-hand-debounce-ms") {
            config.open_hand_debounce_ms = v;
        }
        if let Some(v) = get_float(&value, "vertical-motion-threshold") {
            config.vertical_motion_threshold = v as f32;
        }
        if let Some(v) = get_int(&value, "volume-step-percent") {
            config.volume_step_percent = percent("volume-step-percent", v)?;
        }
        if let Some(v) = get_int(&value, "volume-step-interval-ms") {
            config.volume_step_interval_ms = v;
        }
        if let Some(v) = get_int(&value, "initial-volume-percent") {
            config.initial_volume_percent = percent("initial-volume-percent", v)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Generate s-expression for the active configuration.
    pub fn config_sexp(&self) -> String {
        format!(
            "(:min-cutoff {:.3} :beta {:.4} :d-cutoff {:.3} :margin-x {:.2} :margin-y {:.2} :heuristic :{} :pinch-distance {:.3} :open-index-distance {:.3} :open-pinky-distance {:.3} :hold-threshold-ms {} :directional-debounce-ms {} :open-hand-debounce-ms {} :vertical-motion-threshold {:.3} :volume-step-percent {} :volume-step-interval-ms {} :initial-volume-percent {})",
            self.filter.min_cutoff,
            self.filter.beta,
            self.filter.d_cutoff,
            self.margin_x,
            self.margin_y,
            self.heuristic.as_str(),
            self.pinch_distance,
            self.open_index_distance,
            self.open_pinky_distance,
            self.hold_threshold_ms,
            self.directional_debounce_ms,
            self.open_hand_debounce_ms,
            self.vertical_motion_threshold,
            self.volume_step_percent,
            self.volume_step_interval_ms,
            self.initial_volume_percent,
        )
    }
}

fn percent(key: &'static str, v: i64) -> Result<u8, ConfigError> {
    u8::try_from(v)
        .ok()
        .filter(|p| *p <= 100)
        .ok_or(ConfigError::OutOfRange {
            key,
            value: v as f64,
            expected: "in 0..=100",
        })
}
