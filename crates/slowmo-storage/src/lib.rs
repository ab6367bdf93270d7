//! Remote storage for pipeline output.
//!
//! This crate provides:
//! - `s3://bucket/prefix/` location parsing
//! - Directory upload to any S3-compatible endpoint with a bounded timeout
//! - A startup access check

pub mod client;
pub mod error;
pub mod location;

pub use client::{
    Transfer, TransferClient, TransferConfig, ACCESS_CHECK_TIMEOUT_SECS,
    DEFAULT_TRANSFER_TIMEOUT_SECS,
};
pub use error::{StorageError, StorageResult};
pub use location::RemoteLocation;
