//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use slowmo_storage::{RemoteLocation, StorageResult, TransferConfig, DEFAULT_TRANSFER_TIMEOUT_SECS};

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Base directory for per-run working directories
    pub work_dir: PathBuf,
    /// Maximum concurrent frame decode/encode tasks
    pub max_codec_parallel: usize,
    /// Interpolate anchor pairs on a thread pool instead of sequentially
    pub parallel_pairs: bool,
    /// Bound on uploading one output directory
    pub transfer_timeout: Duration,
    /// Default destination bucket; transfer is disabled when unset
    pub s3_bucket: Option<String>,
    /// Default key prefix inside the bucket
    pub s3_prefix: Option<String>,
    /// Custom endpoint for S3-compatible storage
    pub s3_endpoint_url: Option<String>,
    /// Storage region
    pub s3_region: Option<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("/tmp/slowmo"),
            max_codec_parallel: 4,
            parallel_pairs: false,
            transfer_timeout: Duration::from_secs(DEFAULT_TRANSFER_TIMEOUT_SECS),
            s3_bucket: None,
            s3_prefix: None,
            s3_endpoint_url: None,
            s3_region: None,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let text = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let parsed = |key: &str| text(key).and_then(|v| v.parse::<u64>().ok());

        Self {
            work_dir: text("SLOWMO_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            max_codec_parallel: parsed("SLOWMO_MAX_CODEC_PARALLEL")
                .map(|n| n as usize)
                .filter(|&n| n > 0)
                .unwrap_or(defaults.max_codec_parallel),
            parallel_pairs: text("SLOWMO_PARALLEL_PAIRS")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.parallel_pairs),
            transfer_timeout: parsed("SLOWMO_TRANSFER_TIMEOUT_SECS")
                .filter(|&secs| secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.transfer_timeout),
            s3_bucket: text("SLOWMO_S3_BUCKET"),
            s3_prefix: text("SLOWMO_S3_PREFIX"),
            s3_endpoint_url: text("SLOWMO_S3_ENDPOINT_URL"),
            s3_region: text("SLOWMO_S3_REGION"),
        }
    }

    /// Same configuration rooted at another work directory.
    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    /// Settings for the transfer client.
    pub fn transfer_config(&self) -> TransferConfig {
        TransferConfig {
            endpoint_url: self.s3_endpoint_url.clone(),
            region: self.s3_region.clone(),
            timeout: self.transfer_timeout,
        }
    }

    /// Where output goes, given optional per-run overrides.
    ///
    /// Returns `None` when neither the run nor the service names a bucket.
    pub fn remote_base(
        &self,
        bucket: Option<&str>,
        prefix: Option<&str>,
    ) -> Option<StorageResult<RemoteLocation>> {
        let bucket = bucket.or(self.s3_bucket.as_deref())?;
        let prefix = prefix.or(self.s3_prefix.as_deref()).unwrap_or("");
        Some(RemoteLocation::new(bucket, prefix))
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::from_lookup(lookup(&[]));
        assert_eq!(config.work_dir, PathBuf::from("/tmp/slowmo"));
        assert_eq!(config.max_codec_parallel, 4);
        assert!(!config.parallel_pairs);
        assert_eq!(config.transfer_timeout, Duration::from_secs(30));
        assert!(config.s3_bucket.is_none());
        assert!(config.remote_base(None, None).is_none());
    }

    #[test]
    fn test_env_overrides() {
        let config = WorkerConfig::from_lookup(lookup(&[
            ("SLOWMO_WORK_DIR", "/data/runs"),
            ("SLOWMO_MAX_CODEC_PARALLEL", "8"),
            ("SLOWMO_PARALLEL_PAIRS", "yes"),
            ("SLOWMO_TRANSFER_TIMEOUT_SECS", "90"),
            ("SLOWMO_S3_BUCKET", "frames"),
            ("SLOWMO_S3_PREFIX", "slowmo"),
            ("SLOWMO_S3_ENDPOINT_URL", "http://localhost:9000"),
        ]));

        assert_eq!(config.work_dir, PathBuf::from("/data/runs"));
        assert_eq!(config.max_codec_parallel, 8);
        assert!(config.parallel_pairs);
        assert_eq!(config.transfer_timeout, Duration::from_secs(90));

        let transfer = config.transfer_config();
        assert_eq!(transfer.endpoint_url.as_deref(), Some("http://localhost:9000"));
        assert_eq!(transfer.timeout, Duration::from_secs(90));
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = WorkerConfig::from_lookup(lookup(&[
            ("SLOWMO_MAX_CODEC_PARALLEL", "0"),
            ("SLOWMO_PARALLEL_PAIRS", "sometimes"),
            ("SLOWMO_TRANSFER_TIMEOUT_SECS", "soon"),
            ("SLOWMO_S3_BUCKET", "   "),
        ]));
        assert_eq!(config.max_codec_parallel, 4);
        assert!(!config.parallel_pairs);
        assert_eq!(config.transfer_timeout, Duration::from_secs(30));
        assert!(config.s3_bucket.is_none());
    }

    #[test]
    fn test_run_overrides_take_precedence() {
        let config = WorkerConfig {
            s3_bucket: Some("service".to_string()),
            s3_prefix: Some("default".to_string()),
            ..Default::default()
        };

        let base = config.remote_base(None, None).unwrap().unwrap();
        assert_eq!(base.to_string(), "s3://service/default/");

        let base = config.remote_base(Some("run-bucket"), Some("custom")).unwrap().unwrap();
        assert_eq!(base.to_string(), "s3://run-bucket/custom/");

        let unconfigured = WorkerConfig::default();
        let base = unconfigured.remote_base(Some("only-run"), None).unwrap().unwrap();
        assert_eq!(base.to_string(), "s3://only-run/");
    }
}
