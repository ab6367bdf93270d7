use std::path::Path;

use slowmo_media::{allocate_workdir, check_ffmpeg};
use slowmo_worker::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = WorkerConfig::from_env();

    println!(
        "worker-selfcheck: starting with work_dir={}",
        config.work_dir.display()
    );
    ensure_workdir(&config.work_dir).await?;
    let ffmpeg = check_ffmpeg().map_err(|e| anyhow::anyhow!("ffmpeg not available: {}", e))?;
    println!("worker-selfcheck: ffmpeg at {}", ffmpeg.display());

    match config.remote_base(None, None) {
        Some(remote) => println!("worker-selfcheck: transfer enabled to {}", remote?),
        None => println!("worker-selfcheck: transfer disabled (SLOWMO_S3_BUCKET not set)"),
    }

    println!("worker-selfcheck: ok");
    Ok(())
}

/// Allocate and remove a probe directory to prove the work dir is writable.
async fn ensure_workdir(path: &Path) -> anyhow::Result<()> {
    let probe = allocate_workdir(path).await?;
    tokio::fs::write(probe.join("probe"), b"ok").await?;
    tokio::fs::remove_dir_all(&probe).await?;
    Ok(())
}
