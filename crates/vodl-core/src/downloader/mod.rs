//! Chunk fetcher: downloads every segment of a playlist into the job
//! workspace with bounded parallelism and per-segment retry.
//!
//! Workers are OS threads (the transfers are blocking curl calls); callers on
//! the async side run [`fetch_all`] under `spawn_blocking`. Cancellation is
//! polled before each segment and during retry waits, never in the middle of
//! a transfer.

mod pool;
mod source;

pub use source::{CurlSource, RemoteSource};

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::control::CancelToken;
use crate::error::FetchError;
use crate::job::JobHandle;
use crate::manifest::Playlist;
use crate::retry::RetryPolicy;

use self::pool::{run_worker, Shared};

/// Tuning for one fetch run.
#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    /// Maximum concurrent segment transfers.
    pub parallelism: usize,
    pub retry: RetryPolicy,
}

/// How a fetch run ended when no segment failed fatally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Every segment file exists and is complete.
    Completed,
    /// The cancel token was observed; remaining segments were not started.
    Canceled,
}

/// Percentage of `completed` out of `total` segments; an empty set is complete.
pub fn percentage(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    completed.min(total) as f64 / total as f64 * 100.0
}

/// Downloads all segments of `playlist` to their local paths.
///
/// The first segment that still fails after the retry limit aborts the run
/// with [`FetchError::Fatal`]; workers stop picking up new segments as soon
/// as they observe it.
pub fn fetch_all(
    playlist: &Playlist,
    opts: &FetchOptions,
    source: &dyn RemoteSource,
    cancel: &CancelToken,
    job: &dyn JobHandle,
) -> Result<FetchOutcome, FetchError> {
    let total = playlist.len();
    let workers = opts.parallelism.max(1).min(total.max(1));

    job.append_log("\n\nStarting parallel video chunk download");
    job.append_log(&format!("\nNumber of video chunks to download: {}", total));
    job.append_log(&format!("\nMaximum connection count: {}", workers));
    job.set_status("Downloading");
    tracing::debug!(total, workers, "starting segment download");

    let shared = Shared {
        work: Mutex::new(playlist.iter().collect::<VecDeque<_>>()),
        total,
        completed: AtomicUsize::new(0),
        abort: AtomicBool::new(false),
        first_error: Mutex::new(None),
        source,
        policy: opts.retry,
        cancel,
        job,
    };

    let panicked = std::thread::scope(|s| {
        let handles: Vec<_> = (0..workers).map(|_| s.spawn(|| run_worker(&shared))).collect();
        handles
            .into_iter()
            .fold(false, |panicked, h| h.join().is_err() || panicked)
    });

    if let Some(err) = shared.take_error() {
        job.append_log(&format!("\n\nChunk download failed: {}", err));
        return Err(err);
    }
    if panicked {
        return Err(FetchError::WorkerPanicked);
    }

    let completed = shared.completed.load(Ordering::Acquire);
    if completed < total {
        tracing::debug!(completed, total, "segment download canceled");
        return Ok(FetchOutcome::Canceled);
    }

    job.set_progress(100.0);
    job.append_log("\n\nDownload of all video chunks complete!");
    Ok(FetchOutcome::Completed)
}
