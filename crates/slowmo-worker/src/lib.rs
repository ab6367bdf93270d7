//! Slow-motion frame synthesis worker.
//!
//! This crate provides:
//! - Environment configuration and the service context shared across runs
//! - Archive loading with per-run configuration resolution
//! - The pipeline orchestrator: decode, interpolate, encode, transfer
//! - Structured run logging

pub mod config;
pub mod context;
pub mod error;
pub mod loader;
pub mod logging;
pub mod parallel;
pub mod pipeline;
pub mod writer;

pub use config::WorkerConfig;
pub use context::{ServiceContext, SharedInterpolator};
pub use error::{WorkerError, WorkerResult};
pub use loader::{FrameSetLoader, LoadedFrameSet};
pub use logging::RunLogger;
pub use pipeline::{PhaseTimings, PipelineOrchestrator, RunReport};
pub use writer::{FrameWriter, WrittenFrames};
