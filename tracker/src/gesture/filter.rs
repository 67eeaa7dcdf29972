//! Adaptive single-axis low-pass filter (One Euro).
//!
//! Smooth when the signal is slow, responsive when it moves fast: the
//! cutoff frequency rises with the filtered speed of the signal.

use std::f32::consts::PI;

use super::config::FilterConfig;

/// Previous sample, held after the first call for the life of a session.
#[derive(Debug, Clone, Copy, PartialEq)]
struct FilterMemory {
    value: f32,
    derivative: f32,
    timestamp_ms: i64,
}

/// One-axis adaptive low-pass filter.
#[derive(Debug, Clone)]
pub struct AxisFilter {
    /// Minimum cutoff frequency (Hz) - lower = smoother at rest
    min_cutoff: f32,
    /// Speed coefficient - higher = less lag during fast motion
    beta: f32,
    /// Derivative cutoff frequency (Hz)
    d_cutoff: f32,

    memory: Option<FilterMemory>,
}

impl AxisFilter {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            min_cutoff: config.min_cutoff,
            beta: config.beta,
            d_cutoff: config.d_cutoff,
            memory: None,
        }
    }

    /// One-pole blend of `value` toward `prev` at cutoff `cutoff` (Hz).
    fn low_pass(value: f32, prev: f32, dt: f32, cutoff: f32) -> f32 {
        let rc = 1.0 / (2.0 * PI * cutoff);
        let alpha = dt / (dt + rc);
        prev + alpha * (value - prev)
    }

    /// Filter one sample taken at `timestamp_ms`.
    ///
    /// The first sample passes through unchanged.  A sample whose timestamp
    /// does not advance returns the previous output and leaves state alone.
    pub fn filter(&mut self, value: f32, timestamp_ms: i64) -> f32 {
        let prev = match self.memory {
            Some(m) => m,
            None => {
                self.memory = Some(FilterMemory {
                    value,
                    derivative: 0.0,
                    timestamp_ms,
                });
                return value;
            }
        };

        let dt = timestamp_ms.saturating_sub(prev.timestamp_ms) as f32 / 1000.0;
        if dt <= 0.0 {
            return prev.value;
        }

        // 1. Estimate derivative (velocity)
        let dx = (value - prev.value) / dt;
        let edx = Self::low_pass(dx, prev.derivative, dt, self.d_cutoff);

        // 2. Adaptive cutoff: more smoothing when slow, less when fast
        let cutoff = self.min_cutoff + self.beta * edx.abs();
        let output = Self::low_pass(value, prev.value, dt, cutoff);

        self.memory = Some(FilterMemory {
            value: output,
            derivative: edx,
            timestamp_ms,
        });
        output
    }

    /// Last output, if any sample has been seen this session.
    pub fn last_value(&self) -> Option<f32> {
        self.memory.map(|m| m.value)
    }

    /// Forget all history; the next sample passes through unchanged.
    pub fn reset(&mut self) {
        self.memory = None;
    }
}
