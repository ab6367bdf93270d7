//! Video frame extraction and reassembly.
//!
//! Both directions shell out to FFmpeg with fixed parameters. Failures are
//! returned to the caller: a failed extraction never yields a silently empty
//! frame directory.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use slowmo_models::encoding::{
    ASSEMBLY_PIXEL_FORMAT, ASSEMBLY_VIDEO_CODEC, DEFAULT_FRAME_RATE, EXTRACT_QMIN, EXTRACT_QSCALE,
};
use slowmo_models::naming::{ASSEMBLY_FRAME_GLOB, EXTRACTED_FRAME_PATTERN, LOSSY_EXTENSION};

use crate::command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::workdir::allocate_workdir;

/// Extracts frames from videos and reassembles frame directories into videos.
#[derive(Debug, Clone)]
pub struct VideoAssembler {
    /// Parent directory for extracted frame directories
    base_dir: PathBuf,
    runner: FfmpegRunner,
}

impl VideoAssembler {
    /// Create an assembler that allocates frame directories under `base_dir`.
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            runner: FfmpegRunner::new(),
        }
    }

    /// Bound every FFmpeg invocation by `secs`.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.runner = self.runner.with_timeout(secs);
        self
    }

    /// Extract every frame of `video_path` into a fresh directory.
    ///
    /// Frames are written as `frame-NNNNNNN.jpg` at the best JPEG quality.
    pub async fn extract_frames(&self, video_path: impl AsRef<Path>) -> MediaResult<PathBuf> {
        let video_path = video_path.as_ref();
        if !video_path.exists() {
            return Err(MediaError::FileNotFound(video_path.to_path_buf()));
        }
        check_ffmpeg()?;

        let frame_dir = allocate_workdir(&self.base_dir).await?;
        let cmd = extract_command(video_path, &frame_dir);

        let result = self
            .runner
            .run_with_progress(&cmd, |progress| {
                debug!(frame = progress.frame, fps = progress.fps, "Extracting frames");
            })
            .await;

        let outcome = match result {
            Ok(()) => match count_assembly_frames(&frame_dir).await {
                Ok(0) => Err(MediaError::NoFrames(frame_dir.clone())),
                Ok(frames) => {
                    info!(
                        video = %video_path.display(),
                        frame_dir = %frame_dir.display(),
                        frames,
                        "Extracted frames"
                    );
                    return Ok(frame_dir);
                }
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };

        if let Err(e) = tokio::fs::remove_dir_all(&frame_dir).await {
            warn!(
                path = %frame_dir.display(),
                error = %e,
                "Failed to remove frame directory after failed extraction"
            );
        }
        outcome
    }

    /// Encode the `frame*.jpg` files of `frame_dir` into `output_path`.
    ///
    /// Frames are read in lexicographic order.
    pub async fn create_video(
        &self,
        frame_dir: impl AsRef<Path>,
        output_path: impl AsRef<Path>,
        frame_rate: u32,
    ) -> MediaResult<()> {
        let frame_dir = frame_dir.as_ref();
        let output_path = output_path.as_ref();

        if !frame_dir.is_dir() {
            return Err(MediaError::FileNotFound(frame_dir.to_path_buf()));
        }

        let total = count_assembly_frames(frame_dir).await?;
        if total == 0 {
            return Err(MediaError::NoFrames(frame_dir.to_path_buf()));
        }

        let cmd = create_command(frame_dir, output_path, frame_rate);
        self.runner
            .run_with_progress(&cmd, move |progress| {
                debug!(
                    frame = progress.frame,
                    percent = progress.frame_percentage(total as u64),
                    "Encoding video"
                );
            })
            .await?;

        info!(
            frame_dir = %frame_dir.display(),
            output = %output_path.display(),
            frames = total,
            frame_rate,
            "Created video"
        );
        Ok(())
    }
}

/// Extract frames of `video_path` into a new directory under `base_dir`.
pub async fn extract_frames(
    video_path: impl AsRef<Path>,
    base_dir: impl AsRef<Path>,
) -> MediaResult<PathBuf> {
    VideoAssembler::new(base_dir).extract_frames(video_path).await
}

/// Reassemble `frame_dir` into `output_path` at the default 60 fps.
pub async fn create_video(
    frame_dir: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
) -> MediaResult<()> {
    let frame_dir = frame_dir.as_ref();
    let base = frame_dir.parent().unwrap_or(frame_dir);
    VideoAssembler::new(base)
        .create_video(frame_dir, output_path, DEFAULT_FRAME_RATE)
        .await
}

/// FFmpeg invocation that dumps every frame of a video as JPEG.
pub fn extract_command(video_path: &Path, frame_dir: &Path) -> FfmpegCommand {
    FfmpegCommand::new(video_path, frame_dir.join(EXTRACTED_FRAME_PATTERN))
        .image_quality(EXTRACT_QMIN, EXTRACT_QSCALE)
}

/// FFmpeg invocation that encodes a globbed frame sequence into H.264.
pub fn create_command(frame_dir: &Path, output_path: &Path, frame_rate: u32) -> FfmpegCommand {
    FfmpegCommand::new(frame_dir.join(ASSEMBLY_FRAME_GLOB), output_path)
        .input_frame_rate(frame_rate)
        .glob_input()
        .video_codec(ASSEMBLY_VIDEO_CODEC)
        .pixel_format(ASSEMBLY_PIXEL_FORMAT)
}

/// Whether a file name matches the `frame*.jpg` assembly glob.
fn matches_assembly_glob(name: &str) -> bool {
    name.starts_with("frame")
        && name
            .rsplit_once('.')
            .map(|(_, ext)| ext == LOSSY_EXTENSION)
            .unwrap_or(false)
}

async fn count_assembly_frames(dir: &Path) -> MediaResult<usize> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut count = 0;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_name().to_str().map(matches_assembly_glob).unwrap_or(false) {
            count += 1;
        }
    }
    Ok(count)
}
