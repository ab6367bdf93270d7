//! Worker error types.

use std::path::PathBuf;

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("No decodable input frames in {0}")]
    NoInputFrames(PathBuf),

    #[error("Processing failed: {0}")]
    ProcessingFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Media error: {0}")]
    Media(#[from] slowmo_media::MediaError),

    #[error("Engine error: {0}")]
    Engine(#[from] slowmo_engine::EngineError),

    #[error("Storage error: {0}")]
    Storage(#[from] slowmo_storage::StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn processing_failed(msg: impl Into<String>) -> Self {
        Self::ProcessingFailed(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Name of the stage that produced the error, used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerError::NoInputFrames(_) => "no_input_frames",
            WorkerError::ProcessingFailed(_) => "processing",
            WorkerError::ConfigError(_) => "config",
            WorkerError::Media(_) => "media",
            WorkerError::Engine(_) => "interpolation",
            WorkerError::Storage(_) => "transfer",
            WorkerError::Io(_) => "io",
        }
    }
}
