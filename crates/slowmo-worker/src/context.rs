//! Service-wide state shared by every run.

use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;
use tracing::info;

use slowmo_engine::{FrameInterpolator, LinearBlendInterpolator};
use slowmo_storage::{Transfer, TransferClient};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};

/// Interpolator handle shared between runs and reconfigured by each one.
pub type SharedInterpolator = Arc<Mutex<Box<dyn FrameInterpolator>>>;

/// Built once at startup and threaded through every run.
pub struct ServiceContext {
    pub config: WorkerConfig,
    pub interpolator: SharedInterpolator,
    pub transfer: Option<Arc<dyn Transfer>>,
    pub codec_semaphore: Arc<Semaphore>,
    /// Present when anchor pairs are interpolated in parallel
    pub pair_pool: Option<Arc<rayon::ThreadPool>>,
}

impl ServiceContext {
    /// Context without remote transfer.
    pub fn new(
        config: WorkerConfig,
        interpolator: Box<dyn FrameInterpolator>,
    ) -> WorkerResult<Self> {
        let codec_semaphore = Arc::new(Semaphore::new(config.max_codec_parallel.max(1)));

        let pair_pool = if config.parallel_pairs {
            let pool = rayon::ThreadPoolBuilder::new()
                .thread_name(|i| format!("slowmo-pair-{}", i))
                .build()
                .map_err(|e| {
                    WorkerError::config_error(format!("failed to build pair pool: {}", e))
                })?;
            Some(Arc::new(pool))
        } else {
            None
        };

        Ok(Self {
            config,
            interpolator: Arc::new(Mutex::new(interpolator)),
            transfer: None,
            codec_semaphore,
            pair_pool,
        })
    }

    pub fn with_transfer(mut self, transfer: Arc<dyn Transfer>) -> Self {
        self.transfer = Some(transfer);
        self
    }

    /// Production context: linear-blend interpolator plus an S3 transfer client.
    ///
    /// When a default bucket is configured its access is verified before the
    /// context is returned.
    pub async fn from_config(config: WorkerConfig) -> WorkerResult<Self> {
        let client = TransferClient::new(config.transfer_config()).await?;

        if let Some(remote) = config.remote_base(None, None) {
            let remote = remote?;
            client.check_access(&remote).await?;
            info!(location = %remote, "Transfer destination ready");
        }

        let interpolator: Box<dyn FrameInterpolator> = Box::new(LinearBlendInterpolator::default());
        Ok(Self::new(config, interpolator)?.with_transfer(Arc::new(client)))
    }
}
