//! Frame interpolation engine.
//!
//! This crate provides:
//! - The [`FrameInterpolator`] capability and a linear-blend reference implementation
//! - Recursive midpoint expansion of anchor frames, sequential or one task per pair
//! - Progress observation hooks

pub mod engine;
pub mod error;
pub mod interpolator;

pub use engine::{
    expanded_len, synthesized_count, CountingObserver, ProgressObserver,
    RecursiveInterpolationEngine,
};
pub use error::{EngineError, EngineResult, InterpolationError};
pub use interpolator::{FrameInterpolator, InterpolatorSettings, LinearBlendInterpolator, MIDPOINT};
