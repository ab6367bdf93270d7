//! Working directory allocation.
//!
//! Every run owns its directories exclusively. Names are drawn at random and
//! probed; the winning candidate is then created with an exclusive
//! `create_dir`, so two allocators racing for the same name cannot both
//! succeed. A lost race simply draws another candidate.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rand::Rng;
use tokio::fs;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Candidates drawn before giving up.
pub const MAX_ALLOCATION_ATTEMPTS: u32 = 64;

/// Upper bound (inclusive) of random directory names.
const CANDIDATE_RANGE: u32 = 1_000_000;

/// Allocate a fresh, uniquely named directory under `base`.
pub async fn allocate_workdir(base: impl AsRef<Path>) -> MediaResult<PathBuf> {
    allocate_workdir_with(base, random_candidate).await
}

/// Allocate a directory under `base` using names produced by `next_candidate`.
///
/// Creates `base` if needed. Never returns a path that existed before the
/// call.
pub async fn allocate_workdir_with<F>(
    base: impl AsRef<Path>,
    mut next_candidate: F,
) -> MediaResult<PathBuf>
where
    F: FnMut() -> String,
{
    let base = base.as_ref();
    fs::create_dir_all(base).await?;

    for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
        let candidate = base.join(next_candidate());

        if fs::try_exists(&candidate).await? {
            debug!(
                attempt,
                path = %candidate.display(),
                "Working directory candidate taken, retrying"
            );
            continue;
        }

        match fs::create_dir(&candidate).await {
            Ok(()) => {
                debug!(attempt, path = %candidate.display(), "Allocated working directory");
                return Ok(candidate);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!(attempt, path = %candidate.display(), "Lost allocation race, retrying");
            }
            Err(e) => return Err(MediaError::from(e)),
        }
    }

    Err(MediaError::WorkdirExhausted {
        base: base.to_path_buf(),
        attempts: MAX_ALLOCATION_ATTEMPTS,
    })
}

fn random_candidate() -> String {
    rand::rng().random_range(0..=CANDIDATE_RANGE).to_string()
}
