//! Bounded blocking work.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;

use crate::error::{WorkerError, WorkerResult};

/// Run `f` over `items` on the blocking pool, at most `permits` at a time.
///
/// Results come back in input order regardless of completion order. After the
/// first failure no further items are started; the call returns once every job
/// already running has finished, with the earliest failing item's error.
pub async fn map_blocking<T, R, E, F>(
    permits: Arc<Semaphore>,
    items: Vec<T>,
    f: F,
) -> WorkerResult<Vec<R>>
where
    T: Send + 'static,
    R: Send + 'static,
    E: Into<WorkerError> + Send + 'static,
    F: Fn(T) -> Result<R, E> + Send + Sync + 'static,
{
    let f = Arc::new(f);
    let failed = Arc::new(AtomicBool::new(false));

    let tasks = items.into_iter().map(|item| {
        let permits = permits.clone();
        let f = f.clone();
        let failed = failed.clone();
        async move {
            let outcome = run_one(&permits, &failed, f, item).await;
            if outcome.is_err() {
                failed.store(true, Ordering::SeqCst);
            }
            outcome
        }
    });

    let mut results = Vec::new();
    for outcome in join_all(tasks).await {
        // Skipped items only exist alongside a failure, which is returned here.
        if let Some(result) = outcome? {
            results.push(result);
        }
    }
    Ok(results)
}

/// Run one item, or skip it (`None`) when another item has already failed.
async fn run_one<T, R, E, F>(
    permits: &Semaphore,
    failed: &AtomicBool,
    f: Arc<F>,
    item: T,
) -> WorkerResult<Option<R>>
where
    T: Send + 'static,
    R: Send + 'static,
    E: Into<WorkerError> + Send + 'static,
    F: Fn(T) -> Result<R, E> + Send + Sync + 'static,
{
    let _permit = permits
        .acquire()
        .await
        .map_err(|e| WorkerError::processing_failed(format!("worker pool closed: {}", e)))?;
    if failed.load(Ordering::SeqCst) {
        return Ok(None);
    }

    tokio::task::spawn_blocking(move || f(item))
        .await
        .map_err(|e| WorkerError::processing_failed(format!("blocking task failed: {}", e)))?
        .map(Some)
        .map_err(Into::into)
}
