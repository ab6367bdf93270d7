//! Output frame persistence.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::debug;

use slowmo_media::{allocate_workdir, encode_frame};
use slowmo_models::naming::output_frame_name;
use slowmo_models::{Frame, FrameSequence};

use crate::error::WorkerResult;
use crate::parallel::map_blocking;

/// Frames written by one [`FrameWriter::write`] call.
#[derive(Debug, Clone)]
pub struct WrittenFrames {
    pub dir: PathBuf,
    /// In sequence order
    pub paths: Vec<PathBuf>,
}

/// Writes a sequence as `frame_NNNNNNN.jpg` files into a fresh directory.
#[derive(Debug, Clone)]
pub struct FrameWriter {
    base_dir: PathBuf,
    permits: Arc<Semaphore>,
}

impl FrameWriter {
    pub fn new(base_dir: impl Into<PathBuf>, permits: Arc<Semaphore>) -> Self {
        Self {
            base_dir: base_dir.into(),
            permits,
        }
    }

    /// Create the fresh output directory for one run.
    pub async fn allocate(&self) -> WorkerResult<PathBuf> {
        Ok(allocate_workdir(&self.base_dir).await?)
    }

    /// Encode every frame of `sequence` into `dir`.
    pub async fn write(&self, dir: &Path, sequence: FrameSequence) -> WorkerResult<WrittenFrames> {
        let count = sequence.len();

        let target = dir.to_path_buf();
        let frames = sequence.into_frames();
        let paths = map_blocking(self.permits.clone(), frames, move |frame: Frame| {
            encode_frame(target.join(output_frame_name(frame.index)), &frame.buffer)
        })
        .await?;

        debug!(frames = count, dir = %dir.display(), "Frames written");
        Ok(WrittenFrames {
            dir: dir.to_path_buf(),
            paths,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slowmo_media::decode_frame;
    use slowmo_models::FrameBuffer;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_writes_numbered_frames_in_order() {
        let work = TempDir::new().unwrap();
        let writer = FrameWriter::new(work.path(), Arc::new(Semaphore::new(2)));

        let sequence: FrameSequence = (0..12)
            .map(|i| FrameBuffer::filled(4, 4, [i as f32 / 11.0; 3]))
            .collect();
        let dir = writer.allocate().await.unwrap();
        let written = writer.write(&dir, sequence).await.unwrap();

        assert_eq!(written.paths.len(), 12);
        for (i, path) in written.paths.iter().enumerate() {
            assert_eq!(path.parent().unwrap(), written.dir);
            assert_eq!(path.file_name().unwrap().to_string_lossy(), format!("frame_{:07}.jpg", i));
        }

        let first = decode_frame(&written.paths[0]).unwrap();
        let last = decode_frame(&written.paths[11]).unwrap();
        assert!(first.data()[0] < 0.02);
        assert!(last.data()[0] > 0.98);
    }

    #[tokio::test]
    async fn test_empty_sequence_still_allocates() {
        let work = TempDir::new().unwrap();
        let writer = FrameWriter::new(work.path(), Arc::new(Semaphore::new(1)));

        let dir = writer.allocate().await.unwrap();
        let written = writer.write(&dir, FrameSequence::new()).await.unwrap();
        assert!(written.paths.is_empty());
        assert!(written.dir.is_dir());
    }
}
