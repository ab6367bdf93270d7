//! Input frame set loading.

use std::path::{Path, PathBuf};

use tracing::debug;

use slowmo_media::{allocate_workdir, unpack_archive};
use slowmo_models::naming::{is_input_frame, CONFIG_MEMBER};
use slowmo_models::{ArchiveConfig, FallbackReason, ProcessConfig};

use crate::error::{WorkerError, WorkerResult};
use crate::logging::RunLogger;

/// An unpacked archive ready for decoding.
#[derive(Debug, Clone)]
pub struct LoadedFrameSet {
    /// Working directory the archive was unpacked into
    pub dir: PathBuf,
    /// Resolved process configuration
    pub config: ProcessConfig,
    /// Raw document, kept for the storage overrides
    pub archive_config: ArchiveConfig,
    /// Input frames in file name order
    pub frame_paths: Vec<PathBuf>,
}

/// Unpacks archives into fresh working directories.
#[derive(Debug, Clone)]
pub struct FrameSetLoader {
    base_dir: PathBuf,
}

impl FrameSetLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Unpack archive bytes, resolve configuration and list the input frames.
    pub async fn load_bytes(
        &self,
        bytes: Vec<u8>,
        logger: &RunLogger,
    ) -> WorkerResult<LoadedFrameSet> {
        let dir = allocate_workdir(&self.base_dir).await?;

        let unpack_dir = dir.clone();
        let members = tokio::task::spawn_blocking(move || unpack_archive(&bytes, &unpack_dir))
            .await
            .map_err(|e| WorkerError::processing_failed(format!("archive task failed: {}", e)))??;
        debug!(members, dir = %dir.display(), "Archive unpacked");

        let archive_config = read_archive_config(&dir, logger).await?;
        let (config, fallbacks) = archive_config.resolve();
        for fallback in &fallbacks {
            match fallback.reason {
                FallbackReason::Clamped { .. } => logger.log_warning(&fallback.to_string()),
                _ => debug!(field = fallback.field, "{}", fallback),
            }
        }

        let frame_paths = list_input_frames(&dir).await?;
        logger.log_progress(&format!(
            "loaded {} input frames (align={}, block_shape={:?}, times_to_interpolate={})",
            frame_paths.len(),
            config.align,
            config.block_shape(),
            config.times_to_interpolate
        ));

        Ok(LoadedFrameSet {
            dir,
            config,
            archive_config,
            frame_paths,
        })
    }
}

async fn read_archive_config(dir: &Path, logger: &RunLogger) -> WorkerResult<ArchiveConfig> {
    let path = dir.join(CONFIG_MEMBER);
    if !tokio::fs::try_exists(&path).await? {
        debug!("No {} in archive, using defaults", CONFIG_MEMBER);
        return Ok(ArchiveConfig::default());
    }

    let bytes = tokio::fs::read(&path).await?;
    let (archive_config, invalid) = ArchiveConfig::parse_lenient(&bytes);
    for fallback in &invalid {
        logger.log_warning(&format!("{}: {}", CONFIG_MEMBER, fallback));
    }
    Ok(archive_config)
}

/// Input frame files directly inside `dir`, sorted by file name.
pub async fn list_input_frames(dir: &Path) -> WorkerResult<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut frames = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() && is_input_frame(&path) {
            frames.push(path);
        }
    }

    frames.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(frames)
}
