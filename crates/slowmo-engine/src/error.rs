//! Engine error types.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Failure reported by an interpolation capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct InterpolationError {
    message: String,
}

impl InterpolationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors that abort an interpolation run.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Interpolation failed between anchors {pair} and {next}: {source}", next = .pair + 1)]
    Interpolation {
        /// Index of the left anchor of the failing pair
        pair: usize,
        #[source]
        source: InterpolationError,
    },

    #[error("Recursion depth {requested} exceeds the supported maximum of {max}")]
    DepthTooLarge { requested: u32, max: u32 },
}
