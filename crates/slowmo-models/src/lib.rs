//! Shared data models for the slow-motion frame pipeline.
//!
//! This crate provides:
//! - In-memory frames and ordered frame sequences
//! - Per-run process configuration with lenient archive parsing
//! - File naming and encoding constants
//! - The run result contract

pub mod config;
pub mod encoding;
pub mod frame;
pub mod naming;
pub mod result;

// Re-export common types
pub use config::{
    ArchiveConfig, ConfigFallback, FallbackReason, ProcessConfig, MAX_TIMES_TO_INTERPOLATE,
};
pub use frame::{Frame, FrameBuffer, FrameBufferError, FrameSequence, CHANNELS};
pub use result::{PipelineResult, PipelineStatus};
