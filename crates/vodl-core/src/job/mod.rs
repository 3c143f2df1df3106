//! Download jobs: parameters, lifecycle state and the per-job handle the
//! pipeline reports through.

mod handle;
mod params;
mod state;

pub use handle::JobHandle;
pub use params::DownloadParams;
pub use state::DownloadState;

#[cfg(test)]
pub(crate) use params::sample_params;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Queue-unique job identifier, assigned in enqueue order.
pub type JobId = u64;

pub const STATUS_INITIALIZING: &str = "Initializing";

#[derive(Debug)]
struct Mutable {
    state: DownloadState,
    status: String,
    log: String,
}

/// One user-requested download, tracked from enqueue through terminal state.
///
/// State, status and log sit behind one small lock; progress and the
/// indeterminate flag are atomics so the fetch workers can update them
/// without touching the lock.
#[derive(Debug)]
pub struct DownloadJob {
    id: JobId,
    params: DownloadParams,
    inner: Mutex<Mutable>,
    /// f64 bits of the progress percentage.
    progress: AtomicU64,
    indeterminate: AtomicBool,
}

/// Point-in-time copy of a job for listings.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSnapshot {
    pub id: JobId,
    pub state: DownloadState,
    pub status: String,
    pub progress: f64,
    pub indeterminate: bool,
    pub title: String,
    pub output: std::path::PathBuf,
}

impl DownloadJob {
    pub fn new(id: JobId, params: DownloadParams) -> Self {
        Self {
            id,
            params,
            inner: Mutex::new(Mutable {
                state: DownloadState::Queued,
                status: STATUS_INITIALIZING.to_string(),
                log: String::new(),
            }),
            progress: AtomicU64::new(0f64.to_bits()),
            indeterminate: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Mutable> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn params(&self) -> &DownloadParams {
        &self.params
    }

    pub fn state(&self) -> DownloadState {
        self.lock().state
    }

    pub fn status(&self) -> String {
        self.lock().status.clone()
    }

    pub fn log(&self) -> String {
        self.lock().log.clone()
    }

    pub fn progress(&self) -> f64 {
        f64::from_bits(self.progress.load(Ordering::Relaxed))
    }

    pub fn is_indeterminate(&self) -> bool {
        self.indeterminate.load(Ordering::Relaxed)
    }

    /// Retry reset: empty log, zero progress, status back to initializing, Queued.
    pub(crate) fn reset_for_retry(&self) {
        let mut inner = self.lock();
        inner.log.clear();
        inner.status = STATUS_INITIALIZING.to_string();
        inner.state = DownloadState::Queued;
        drop(inner);
        self.set_progress(0.0);
        self.set_indeterminate(false);
    }

    pub fn snapshot(&self) -> JobSnapshot {
        let inner = self.lock();
        JobSnapshot {
            id: self.id,
            state: inner.state,
            status: inner.status.clone(),
            progress: self.progress(),
            indeterminate: self.is_indeterminate(),
            title: self.params.video.title().to_string(),
            output: self.params.output.clone(),
        }
    }
}

impl JobHandle for DownloadJob {
    fn set_state(&self, state: DownloadState) {
        self.lock().state = state;
    }

    fn append_log(&self, text: &str) {
        self.lock().log.push_str(text);
    }

    fn set_status(&self, status: &str) {
        self.lock().status = status.to_string();
    }

    fn set_progress(&self, percent: f64) {
        let clamped = percent.clamp(0.0, 100.0);
        self.progress.store(clamped.to_bits(), Ordering::Relaxed);
    }

    fn set_indeterminate(&self, on: bool) {
        self.indeterminate.store(on, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_job_is_queued_and_empty() {
        let job = DownloadJob::new(1, sample_params());
        assert_eq!(job.state(), DownloadState::Queued);
        assert_eq!(job.progress(), 0.0);
        assert!(job.log().is_empty());
        assert_eq!(job.status(), STATUS_INITIALIZING);
    }

    #[test]
    fn handle_updates_are_visible() {
        let job = DownloadJob::new(7, sample_params());
        let handle: &dyn JobHandle = &job;
        handle.set_state(DownloadState::Downloading);
        handle.append_log("a");
        handle.append_log("b");
        handle.set_status("Downloading");
        handle.set_progress(42.5);
        handle.set_indeterminate(true);
        let snap = job.snapshot();
        assert_eq!(snap.id, 7);
        assert_eq!(snap.state, DownloadState::Downloading);
        assert_eq!(snap.status, "Downloading");
        assert_eq!(snap.progress, 42.5);
        assert!(snap.indeterminate);
        assert_eq!(job.log(), "ab");
    }

    #[test]
    fn progress_is_clamped() {
        let job = DownloadJob::new(1, sample_params());
        job.set_progress(150.0);
        assert_eq!(job.progress(), 100.0);
        job.set_progress(-3.0);
        assert_eq!(job.progress(), 0.0);
    }

    #[test]
    fn reset_for_retry_clears_log_and_progress() {
        let job = DownloadJob::new(1, sample_params());
        job.set_state(DownloadState::Error);
        job.append_log("boom");
        job.set_progress(100.0);
        job.set_status("Error");
        job.reset_for_retry();
        assert_eq!(job.state(), DownloadState::Queued);
        assert!(job.log().is_empty());
        assert_eq!(job.progress(), 0.0);
        assert_eq!(job.status(), STATUS_INITIALIZING);
    }
}
