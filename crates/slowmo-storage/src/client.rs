//! S3-compatible transfer client.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info, warn};

use crate::error::{StorageError, StorageResult};
use crate::location::RemoteLocation;

/// Default bound on a whole directory transfer.
pub const DEFAULT_TRANSFER_TIMEOUT_SECS: u64 = 30;
/// Bound on the startup access check.
pub const ACCESS_CHECK_TIMEOUT_SECS: u64 = 15;

const DEFAULT_REGION: &str = "us-east-1";

/// Moves a finished output directory to remote storage.
#[async_trait]
pub trait Transfer: Send + Sync {
    /// Upload every file under `local_dir` below `remote`.
    async fn transfer(&self, local_dir: &Path, remote: &RemoteLocation) -> StorageResult<()>;

    /// Verify that `remote` can be listed.
    async fn check_access(&self, remote: &RemoteLocation) -> StorageResult<()>;
}

/// Configuration for [`TransferClient`].
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Custom endpoint for S3-compatible services
    pub endpoint_url: Option<String>,
    /// Region, defaults to `us-east-1`
    pub region: Option<String>,
    /// Bound on one directory transfer
    pub timeout: Duration,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            endpoint_url: None,
            region: None,
            timeout: Duration::from_secs(DEFAULT_TRANSFER_TIMEOUT_SECS),
        }
    }
}

/// S3 client bound to a transfer timeout.
#[derive(Clone)]
pub struct TransferClient {
    client: Client,
    timeout: Duration,
}

impl TransferClient {
    /// Create a client using the default AWS credential chain.
    pub async fn new(config: TransferConfig) -> StorageResult<Self> {
        let region = config.region.unwrap_or_else(|| DEFAULT_REGION.to_string());
        if region.trim().is_empty() {
            return Err(StorageError::config_error("region must not be empty"));
        }

        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region))
            .load()
            .await;

        let mut builder = Builder::from(&shared);
        if let Some(endpoint) = config.endpoint_url {
            debug!(endpoint = %endpoint, "Using custom S3 endpoint");
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
            timeout: config.timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Upload a directory without applying the timeout. Returns the file count.
    pub async fn upload_directory(
        &self,
        local_dir: &Path,
        remote: &RemoteLocation,
    ) -> StorageResult<usize> {
        let files = collect_files(local_dir).await?;
        debug!(
            files = files.len(),
            source = %local_dir.display(),
            destination = %remote,
            "Uploading directory"
        );

        for (path, relative) in &files {
            let key = remote.key_for(relative);
            self.upload_file(path, remote.bucket(), &key).await?;
        }

        Ok(files.len())
    }

    async fn upload_file(&self, path: &Path, bucket: &str, key: &str) -> StorageResult<()> {
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::upload_failed(format!("{}: {}", path.display(), e)))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .content_type(content_type_for(path))
            .send()
            .await
            .map_err(|e| {
                StorageError::upload_failed(format!("{}: {}", key, DisplayErrorContext(&e)))
            })?;

        debug!("Uploaded {} to {}", path.display(), key);
        Ok(())
    }
}

#[async_trait]
impl Transfer for TransferClient {
    async fn transfer(&self, local_dir: &Path, remote: &RemoteLocation) -> StorageResult<()> {
        let secs = self.timeout.as_secs();
        match tokio::time::timeout(self.timeout, self.upload_directory(local_dir, remote)).await {
            Ok(result) => {
                let count = result?;
                info!(files = count, destination = %remote, "Transfer complete");
                Ok(())
            }
            Err(_) => {
                warn!(destination = %remote, "Transfer timed out after {} seconds", secs);
                Err(StorageError::Timeout(secs))
            }
        }
    }

    async fn check_access(&self, remote: &RemoteLocation) -> StorageResult<()> {
        let mut request = self.client.list_objects_v2().bucket(remote.bucket()).max_keys(1);
        if !remote.prefix().is_empty() {
            request = request.prefix(remote.prefix());
        }

        let limit = Duration::from_secs(ACCESS_CHECK_TIMEOUT_SECS);
        match tokio::time::timeout(limit, request.send()).await {
            Ok(Ok(_)) => {
                info!(location = %remote, "Storage access verified");
                Ok(())
            }
            Ok(Err(e)) => Err(StorageError::access_denied(
                remote,
                DisplayErrorContext(&e).to_string(),
            )),
            Err(_) => Err(StorageError::Timeout(ACCESS_CHECK_TIMEOUT_SECS)),
        }
    }
}

/// All regular files under `root` with their `/`-separated relative paths, sorted.
pub async fn collect_files(root: &Path) -> StorageResult<Vec<(PathBuf, String)>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() {
                let relative = path
                    .strip_prefix(root)
                    .map_err(|e| StorageError::upload_failed(e.to_string()))?
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                files.push((path, relative));
            }
        }
    }

    files.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(files)
}

fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("mp4") => "video/mp4",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}
