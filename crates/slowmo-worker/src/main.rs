//! Slow-motion worker binary.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use slowmo_media::{make_archive, VideoAssembler};
use slowmo_models::encoding::DEFAULT_FRAME_RATE;
use slowmo_models::naming::DEFAULT_ARCHIVE_NAME;
use slowmo_worker::{PipelineOrchestrator, ServiceContext, WorkerConfig};

#[derive(Parser)]
#[command(author, version, about = "Synthesize slow-motion frame sequences", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interpolate an archive of frames and print the result as JSON
    Run {
        #[arg(short, long)]
        archive: PathBuf,
    },
    /// Extract every frame of a video into a new working directory
    ExtractFrames {
        #[arg(short, long)]
        video: PathBuf,
        /// Parent of the frame directory (defaults to SLOWMO_WORK_DIR)
        #[arg(short, long)]
        base_dir: Option<PathBuf>,
        /// Kill FFmpeg after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Encode a directory of frame*.jpg files into an H.264 video
    CreateVideo {
        #[arg(short, long)]
        frames: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short = 'r', long, default_value_t = DEFAULT_FRAME_RATE)]
        frame_rate: u32,
        /// Kill FFmpeg after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Pack a frame folder into a gzip-compressed tar archive
    MakeArchive {
        #[arg(short, long)]
        folder: PathBuf,
        /// Defaults to input_frames.tar.gz inside the folder
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn assembler(base_dir: &Path, timeout_secs: Option<u64>) -> VideoAssembler {
    let assembler = VideoAssembler::new(base_dir);
    match timeout_secs {
        Some(secs) => assembler.with_timeout(secs),
        None => assembler,
    }
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("slowmo=info,aws_config=warn,aws_smithy_runtime=warn"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = WorkerConfig::from_env();

    match cli.command {
        Commands::Run { archive } => {
            info!("Worker config: {:?}", config);
            let ctx = ServiceContext::from_config(config)
                .await
                .context("failed to initialize worker")?;
            let orchestrator = PipelineOrchestrator::new(Arc::new(ctx));

            let result = orchestrator.run_archive(&archive).await;
            println!("{}", serde_json::to_string(&result)?);
            if !result.is_success() {
                std::process::exit(1);
            }
        }
        Commands::ExtractFrames {
            video,
            base_dir,
            timeout_secs,
        } => {
            let base_dir = base_dir.unwrap_or(config.work_dir);
            let frame_dir = assembler(&base_dir, timeout_secs)
                .extract_frames(&video)
                .await
                .with_context(|| format!("failed to extract frames from {}", video.display()))?;
            println!("{}", frame_dir.display());
        }
        Commands::CreateVideo {
            frames,
            output,
            frame_rate,
            timeout_secs,
        } => {
            assembler(&config.work_dir, timeout_secs)
                .create_video(&frames, &output, frame_rate)
                .await
                .with_context(|| format!("failed to create {}", output.display()))?;
            println!("{}", output.display());
        }
        Commands::MakeArchive { folder, output } => {
            let output = output.unwrap_or_else(|| folder.join(DEFAULT_ARCHIVE_NAME));
            let archive =
                tokio::task::spawn_blocking(move || make_archive(&folder, &output)).await??;
            println!("{}", archive.display());
        }
    }

    Ok(())
}
