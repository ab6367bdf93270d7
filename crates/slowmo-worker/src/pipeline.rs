//! End-to-end run orchestration.
//!
//! A run is strictly sequential: load, decode, interpolate, encode, then the
//! optional transfer. Decode and encode fan out over the bounded codec pool;
//! interpolation runs on the blocking pool while holding the shared
//! interpolator, so the settings configured for a run stay in effect for all
//! of its capability calls.
//!
//! The destination is fixed as soon as the output directory exists. Runs that
//! fail after that point still report it.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use tracing::{debug, info, Instrument};

use slowmo_engine::{
    expanded_len, FrameInterpolator, InterpolatorSettings, ProgressObserver,
    RecursiveInterpolationEngine,
};
use slowmo_media::decode_frame;
use slowmo_models::{ArchiveConfig, FrameBuffer, FrameSequence, PipelineResult, ProcessConfig};
use slowmo_storage::RemoteLocation;

use crate::context::ServiceContext;
use crate::error::{WorkerError, WorkerResult};
use crate::loader::{FrameSetLoader, LoadedFrameSet};
use crate::logging::RunLogger;
use crate::parallel::map_blocking;
use crate::writer::FrameWriter;

const PHASE_HISTOGRAM: &str = "slowmo_phase_duration_seconds";
const RUNS_COUNTER: &str = "slowmo_runs_total";
const SYNTHESIZED_COUNTER: &str = "slowmo_frames_synthesized_total";

/// Wall-clock time spent in each compute phase.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhaseTimings {
    pub decode: Duration,
    pub interpolate: Duration,
    pub encode: Duration,
}

impl PhaseTimings {
    fn record(&self) {
        for (phase, elapsed) in [
            ("decode", self.decode),
            ("interpolate", self.interpolate),
            ("encode", self.encode),
        ] {
            histogram!(PHASE_HISTOGRAM, "phase" => phase).record(elapsed.as_secs_f64());
        }
    }
}

/// Everything a successful run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub result: PipelineResult,
    /// Local directory holding the written frames
    pub output_dir: PathBuf,
    pub input_frames: usize,
    pub frames_written: usize,
    pub config: ProcessConfig,
    pub timings: PhaseTimings,
}

/// Where a run's frames end up.
#[derive(Debug, Clone)]
enum Destination {
    Local(PathBuf),
    Remote(RemoteLocation),
}

impl Destination {
    fn location(&self) -> String {
        match self {
            Destination::Local(dir) => dir.display().to_string(),
            Destination::Remote(remote) => remote.to_string(),
        }
    }
}

/// Drives archives through the whole pipeline.
#[derive(Clone)]
pub struct PipelineOrchestrator {
    ctx: Arc<ServiceContext>,
}

impl PipelineOrchestrator {
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Run an archive file. Never fails: errors become a FAILED result.
    pub async fn run_archive(&self, archive: &Path) -> PipelineResult {
        let logger = RunLogger::new("interpolate_archive");
        let span = logger.create_span();

        async {
            logger.log_start(&format!("archive {}", archive.display()));
            match tokio::fs::read(archive).await {
                Ok(bytes) => self.run_tracked(bytes, &logger).await,
                Err(e) => self.finish(Err(e.into()), None, &logger),
            }
        }
        .instrument(span)
        .await
    }

    /// Run in-memory archive bytes. Never fails: errors become a FAILED result.
    pub async fn run_bytes(&self, bytes: Vec<u8>) -> PipelineResult {
        let logger = RunLogger::new("interpolate_archive");
        let span = logger.create_span();

        async {
            logger.log_start(&format!("{} archive bytes", bytes.len()));
            self.run_tracked(bytes, &logger).await
        }
        .instrument(span)
        .await
    }

    async fn run_tracked(&self, bytes: Vec<u8>, logger: &RunLogger) -> PipelineResult {
        let mut destination = None;
        let outcome = self.run_stages(bytes, logger, &mut destination).await;
        self.finish(outcome, destination, logger)
    }

    fn finish(
        &self,
        outcome: WorkerResult<RunReport>,
        destination: Option<Destination>,
        logger: &RunLogger,
    ) -> PipelineResult {
        match outcome {
            Ok(report) => {
                counter!(RUNS_COUNTER, "status" => "success").increment(1);
                logger.log_completion(&format!(
                    "{} -> {} frames at {}",
                    report.input_frames, report.frames_written, report.result.output_location
                ));
                report.result
            }
            Err(e) => {
                counter!(RUNS_COUNTER, "status" => "failed", "stage" => e.kind()).increment(1);
                logger.log_error(&e.to_string());
                let location = destination.map(|d| d.location()).unwrap_or_default();
                PipelineResult::failed(location)
            }
        }
    }

    /// Run every stage and return the detailed report.
    pub async fn execute(&self, bytes: Vec<u8>, logger: &RunLogger) -> WorkerResult<RunReport> {
        self.run_stages(bytes, logger, &mut None).await
    }

    async fn run_stages(
        &self,
        bytes: Vec<u8>,
        logger: &RunLogger,
        destination: &mut Option<Destination>,
    ) -> WorkerResult<RunReport> {
        let loader = FrameSetLoader::new(&self.ctx.config.work_dir);
        let LoadedFrameSet {
            dir,
            config,
            archive_config,
            frame_paths,
        } = loader.load_bytes(bytes, logger).await?;

        if frame_paths.is_empty() {
            return Err(WorkerError::NoInputFrames(dir));
        }
        let input_frames = frame_paths.len();
        let mut timings = PhaseTimings::default();

        let started = Instant::now();
        let permits = self.ctx.codec_semaphore.clone();
        let anchors = map_blocking(permits, frame_paths, |path: PathBuf| decode_frame(path)).await?;
        timings.decode = started.elapsed();
        logger.log_progress(&format!(
            "decoded {} frames in {:.2?}",
            input_frames, timings.decode
        ));

        let started = Instant::now();
        let sequence = self.interpolate(anchors, &config).await?;
        timings.interpolate = started.elapsed();
        counter!(SYNTHESIZED_COUNTER).increment((sequence.len() - input_frames) as u64);
        logger.log_progress(&format!(
            "interpolated to {} frames in {:.2?}",
            sequence.len(),
            timings.interpolate
        ));

        let started = Instant::now();
        let writer = FrameWriter::new(&self.ctx.config.work_dir, self.ctx.codec_semaphore.clone());
        let out_dir = writer.allocate().await?;
        let target = destination.insert(self.destination(&out_dir, &archive_config)?).clone();
        let written = writer.write(&out_dir, sequence).await?;
        timings.encode = started.elapsed();
        logger.log_progress(&format!(
            "encoded {} frames in {:.2?}",
            written.paths.len(),
            timings.encode
        ));

        timings.record();
        info!(
            decode_secs = timings.decode.as_secs_f64(),
            interpolate_secs = timings.interpolate.as_secs_f64(),
            encode_secs = timings.encode.as_secs_f64(),
            "Phase timings"
        );

        if let Destination::Remote(remote) = &target {
            self.deliver(&written.dir, remote).await?;
        }

        Ok(RunReport {
            result: PipelineResult::success(target.location()),
            output_dir: written.dir,
            input_frames,
            frames_written: written.paths.len(),
            config,
            timings,
        })
    }

    async fn interpolate(
        &self,
        anchors: Vec<FrameBuffer>,
        config: &ProcessConfig,
    ) -> WorkerResult<FrameSequence> {
        let engine = RecursiveInterpolationEngine::new(config.times_to_interpolate)?;
        let settings = InterpolatorSettings::from(config);
        let ctx = self.ctx.clone();
        let span = tracing::Span::current();

        tokio::task::spawn_blocking(move || -> WorkerResult<FrameSequence> {
            let _entered = span.enter();
            let mut guard = ctx
                .interpolator
                .lock()
                .map_err(|_| WorkerError::processing_failed("interpolator lock poisoned"))?;
            guard.configure(settings);

            let interpolator: &dyn FrameInterpolator = &**guard;
            let observer = ProgressLogger::new(anchors.len(), engine.depth());
            let sequence = match &ctx.pair_pool {
                Some(pool) => {
                    engine.interpolate_parallel(pool, interpolator, anchors, Some(&observer))?
                }
                None => engine.interpolate(interpolator, anchors, Some(&observer))?,
            };
            Ok(sequence)
        })
        .await
        .map_err(|e| WorkerError::processing_failed(format!("interpolation task failed: {}", e)))?
    }

    /// Local output directory, or its remote counterpart when a bucket is
    /// configured for the run.
    fn destination(&self, dir: &Path, archive: &ArchiveConfig) -> WorkerResult<Destination> {
        let bucket = archive.s3_bucket.as_deref();
        let prefix = archive.s3_prefix.as_deref();
        let Some(base) = self.ctx.config.remote_base(bucket, prefix) else {
            return Ok(Destination::Local(dir.to_path_buf()));
        };
        let base = base?;

        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                let message = format!("output directory {} has no name", dir.display());
                WorkerError::processing_failed(message)
            })?;
        Ok(Destination::Remote(base.child(&name)))
    }

    async fn deliver(&self, dir: &Path, remote: &RemoteLocation) -> WorkerResult<()> {
        let transfer = self.ctx.transfer.as_ref().ok_or_else(|| {
            WorkerError::config_error(format!("no transfer client for {}", remote))
        })?;
        transfer.transfer(dir, remote).await?;
        Ok(())
    }
}

/// Logs interpolation progress every tenth of the way.
struct ProgressLogger {
    total: AtomicU64,
    done: AtomicU64,
    expected_frames: usize,
}

impl ProgressLogger {
    fn new(anchors: usize, depth: u32) -> Self {
        Self {
            total: AtomicU64::new(0),
            done: AtomicU64::new(0),
            expected_frames: expanded_len(anchors, depth),
        }
    }
}

impl ProgressObserver for ProgressLogger {
    fn on_start(&self, total_midpoints: u64) {
        self.total.store(total_midpoints, Ordering::Relaxed);
        debug!(
            midpoints = total_midpoints,
            frames = self.expected_frames,
            "Interpolation started"
        );
    }

    fn on_midpoint(&self) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        let total = self.total.load(Ordering::Relaxed);
        let step = (total / 10).max(1);
        if done % step == 0 || done == total {
            debug!(done, total, "Interpolation progress");
        }
    }
}
