//! Remote object locations.

use std::fmt;
use std::str::FromStr;

use crate::error::{StorageError, StorageResult};

const SCHEME: &str = "s3://";

/// A bucket plus a key prefix, written `s3://bucket/prefix/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteLocation {
    bucket: String,
    /// Normalized prefix without leading or trailing slashes, possibly empty
    prefix: String,
}

impl RemoteLocation {
    pub fn new(bucket: impl Into<String>, prefix: impl AsRef<str>) -> StorageResult<Self> {
        let bucket = bucket.into();
        if bucket.is_empty() || bucket.contains('/') {
            return Err(StorageError::invalid_location(format!("bad bucket name '{}'", bucket)));
        }
        Ok(Self {
            bucket,
            prefix: normalize(prefix.as_ref()),
        })
    }

    /// Parse an `s3://bucket[/prefix]` URI.
    pub fn parse(uri: &str) -> StorageResult<Self> {
        let rest = uri.strip_prefix(SCHEME).ok_or_else(|| {
            StorageError::invalid_location(format!("'{}' is not an s3:// URI", uri))
        })?;

        let (bucket, prefix) = rest.split_once('/').unwrap_or((rest, ""));
        Self::new(bucket, prefix)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Location one level below this one.
    pub fn child(&self, name: &str) -> Self {
        Self {
            bucket: self.bucket.clone(),
            prefix: join(&self.prefix, &normalize(name)),
        }
    }

    /// Object key for a path relative to this location.
    pub fn key_for(&self, relative: &str) -> String {
        join(&self.prefix, relative.trim_start_matches('/'))
    }
}

impl fmt::Display for RemoteLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix.is_empty() {
            write!(f, "{}{}/", SCHEME, self.bucket)
        } else {
            write!(f, "{}{}/{}/", SCHEME, self.bucket, self.prefix)
        }
    }
}

impl FromStr for RemoteLocation {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn normalize(prefix: &str) -> String {
    prefix
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

fn join(prefix: &str, rest: &str) -> String {
    match (prefix.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{}/{}", prefix, rest),
    }
}
