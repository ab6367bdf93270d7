//! The interpolation capability.
//!
//! The engine treats frame synthesis as an opaque capability: given two frames
//! and a fractional time it returns one synthesized frame. Model-backed
//! implementations plug in through [`FrameInterpolator`]. Their per-run
//! settings are explicit state on the implementation, reconfigured before each
//! run instead of living in a process-wide singleton.

use slowmo_models::{FrameBuffer, ProcessConfig};

use crate::error::InterpolationError;

/// The only time fraction the engine ever requests.
pub const MIDPOINT: f32 = 0.5;

/// Model settings that may change from one run to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterpolatorSettings {
    /// Frames are padded so both dimensions are multiples of this value.
    pub align: u32,
    /// `[height, width]` tiling used to process large frames piecewise.
    pub block_shape: [u32; 2],
}

impl Default for InterpolatorSettings {
    fn default() -> Self {
        Self::from(&ProcessConfig::default())
    }
}

impl From<&ProcessConfig> for InterpolatorSettings {
    fn from(config: &ProcessConfig) -> Self {
        Self {
            align: config.align,
            block_shape: config.block_shape(),
        }
    }
}

/// A frame synthesis capability.
pub trait FrameInterpolator: Send + Sync {
    /// Synthesize the frame at time `t` between `a` (t = 0) and `b` (t = 1).
    fn interpolate(
        &self,
        a: &FrameBuffer,
        b: &FrameBuffer,
        t: f32,
    ) -> Result<FrameBuffer, InterpolationError>;

    /// Current settings.
    fn settings(&self) -> &InterpolatorSettings;

    /// Replace the settings used by subsequent calls.
    fn configure(&mut self, settings: InterpolatorSettings);

    /// Name used in logs.
    fn name(&self) -> &'static str {
        "interpolator"
    }
}

/// Per-pixel linear blend `a * (1 - t) + b * t`.
///
/// A reference capability with no motion estimation. It honors the
/// interface contract (dimension checks, time range) and is what the worker
/// uses when no model-backed capability is linked in.
#[derive(Debug, Clone, Default)]
pub struct LinearBlendInterpolator {
    settings: InterpolatorSettings,
}

impl LinearBlendInterpolator {
    pub fn new(settings: InterpolatorSettings) -> Self {
        Self { settings }
    }
}

impl FrameInterpolator for LinearBlendInterpolator {
    fn interpolate(
        &self,
        a: &FrameBuffer,
        b: &FrameBuffer,
        t: f32,
    ) -> Result<FrameBuffer, InterpolationError> {
        if !a.same_dimensions(b) {
            return Err(InterpolationError::new(format!(
                "frame dimensions differ: {}x{} vs {}x{}",
                a.width(),
                a.height(),
                b.width(),
                b.height()
            )));
        }
        if !(0.0..=1.0).contains(&t) {
            return Err(InterpolationError::new(format!("time {} is outside [0, 1]", t)));
        }

        let data = a
            .data()
            .iter()
            .zip(b.data())
            .map(|(&x, &y)| x * (1.0 - t) + y * t)
            .collect();

        FrameBuffer::new(a.width(), a.height(), data)
            .map_err(|e| InterpolationError::new(e.to_string()))
    }

    fn settings(&self) -> &InterpolatorSettings {
        &self.settings
    }

    fn configure(&mut self, settings: InterpolatorSettings) {
        self.settings = settings;
    }

    fn name(&self) -> &'static str {
        "linear_blend"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_midpoint() {
        let red = FrameBuffer::filled(2, 2, [1.0, 0.0, 0.0]);
        let blue = FrameBuffer::filled(2, 2, [0.0, 0.0, 1.0]);

        let mid = LinearBlendInterpolator::default()
            .interpolate(&red, &blue, MIDPOINT)
            .unwrap();
        assert_eq!(mid, FrameBuffer::filled(2, 2, [0.5, 0.0, 0.5]));
    }

    #[test]
    fn test_blend_rejects_mismatched_frames() {
        let a = FrameBuffer::filled(2, 2, [0.0; 3]);
        let b = FrameBuffer::filled(3, 2, [0.0; 3]);

        let err = LinearBlendInterpolator::default()
            .interpolate(&a, &b, MIDPOINT)
            .unwrap_err();
        assert!(err.message().contains("dimensions"));
    }

    #[test]
    fn test_blend_rejects_time_out_of_range() {
        let a = FrameBuffer::filled(1, 1, [0.0; 3]);
        assert!(LinearBlendInterpolator::default().interpolate(&a, &a, 1.5).is_err());
    }

    #[test]
    fn test_configure_replaces_settings() {
        let mut interpolator = LinearBlendInterpolator::default();
        assert_eq!(interpolator.settings().align, 64);
        assert_eq!(interpolator.settings().block_shape, [1, 1]);

        interpolator.configure(InterpolatorSettings {
            align: 32,
            block_shape: [2, 3],
        });
        assert_eq!(
            *interpolator.settings(),
            InterpolatorSettings {
                align: 32,
                block_shape: [2, 3]
            }
        );
    }
}
