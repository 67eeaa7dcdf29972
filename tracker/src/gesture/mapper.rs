//! Normalized landmark position to smoothed screen pixels.
//!
//! Mirror X for the front camera, stretch the central region of the
//! camera frame to the full screen so corners are reachable, scale to
//! pixels, then smooth each axis with its own [`AxisFilter`].

use super::config::{ConfigError, GestureConfig};
use super::filter::AxisFilter;

/// A point in target pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

/// Maps normalized coordinates into a `width` x `height` pixel target.
#[derive(Debug, Clone)]
pub struct CoordinateMapper {
    width: u32,
    height: u32,
    margin_x: f32,
    margin_y: f32,
    filter_x: AxisFilter,
    filter_y: AxisFilter,
}

/// Linear remap of `[margin, 1 - margin]` onto `[0, 1]`, clamped.
fn rescale(value: f32, margin: f32) -> f32 {
    ((value - margin) / (1.0 - 2.0 * margin)).clamp(0.0, 1.0)
}

impl CoordinateMapper {
    pub fn new(width: u32, height: u32, config: &GestureConfig) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyViewport { width, height });
        }
        Ok(Self {
            width,
            height,
            margin_x: config.margin_x,
            margin_y: config.margin_y,
            filter_x: AxisFilter::new(&config.filter),
            filter_y: AxisFilter::new(&config.filter),
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Map one normalized position sampled at `timestamp_ms`.
    pub fn map(&mut self, norm_x: f32, norm_y: f32, timestamp_ms: i64) -> ScreenPoint {
        // 1. Mirror X (front camera image is mirrored)
        let mirrored_x = 1.0 - norm_x;

        // 2. Region of interest: central portion covers the whole target
        let scaled_x = rescale(mirrored_x, self.margin_x);
        let scaled_y = rescale(norm_y, self.margin_y);

        // 3. Pixels
        let pixel_x = scaled_x * self.width as f32;
        let pixel_y = scaled_y * self.height as f32;

        // 4. Smooth
        ScreenPoint {
            x: self.filter_x.filter(pixel_x, timestamp_ms),
            y: self.filter_y.filter(pixel_y, timestamp_ms),
        }
    }

    /// Clear both filters; call when a tracking session restarts.
    pub fn reset(&mut self) {
        self.filter_x.reset();
        self.filter_y.reset();
    }
}
