//! Bounded worker pool over the playlist's segments.

use std::collections::VecDeque;
use std::fs;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::control::CancelToken;
use crate::error::FetchError;
use crate::job::JobHandle;
use crate::manifest::Segment;
use crate::retry::{run_with_retry, RetryPolicy, SegmentError};

use super::{percentage, RemoteSource};

/// State shared by the workers of one fetch run.
pub(super) struct Shared<'a> {
    pub work: Mutex<VecDeque<&'a Segment>>,
    pub total: usize,
    pub completed: AtomicUsize,
    /// Set on the first fatal segment failure; stops all workers.
    pub abort: AtomicBool,
    pub first_error: Mutex<Option<FetchError>>,
    pub source: &'a dyn RemoteSource,
    pub policy: RetryPolicy,
    pub cancel: &'a CancelToken,
    pub job: &'a dyn JobHandle,
}

impl Shared<'_> {
    fn next_segment(&self) -> Option<&Segment> {
        if self.cancel.is_canceled() || self.abort.load(Ordering::Relaxed) {
            return None;
        }
        self.work
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
    }

    fn record_failure(&self, err: FetchError) {
        self.abort.store(true, Ordering::Relaxed);
        let mut slot = self.first_error.lock().unwrap_or_else(|e| e.into_inner());
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    pub(super) fn take_error(&self) -> Option<FetchError> {
        self.first_error
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }
}

/// Result of one segment that did not fail.
enum Fetched {
    Stored,
    /// Cancel arrived while the segment was waiting for a retry.
    Canceled,
}

/// Worker body: pull segments until the queue is empty, the job is canceled
/// or another worker failed fatally.
pub(super) fn run_worker(shared: &Shared<'_>) {
    while let Some(segment) = shared.next_segment() {
        match fetch_segment(shared, segment) {
            Ok(Fetched::Stored) => {
                let done = shared.completed.fetch_add(1, Ordering::AcqRel) + 1;
                // 100% is reported once by the caller after all workers finish.
                if done < shared.total {
                    shared.job.set_progress(percentage(done, shared.total));
                }
            }
            Ok(Fetched::Canceled) => break,
            Err(e) => {
                tracing::warn!(segment = segment.index, "segment failed: {}", e);
                shared.record_failure(e);
                break;
            }
        }
    }
}

/// Replaces whatever a previous attempt left at `segment`'s local path.
fn store(segment: &Segment, bytes: &[u8]) -> Result<(), SegmentError> {
    match fs::remove_file(&segment.local_path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(SegmentError::Storage(e)),
    }
    fs::write(&segment.local_path, bytes).map_err(SegmentError::Storage)
}

/// Downloads one segment with retry and stores it at its local path.
/// Transfer failures are retried; storage failures end the segment at once.
fn fetch_segment(shared: &Shared<'_>, segment: &Segment) -> Result<Fetched, FetchError> {
    let res = run_with_retry(
        &shared.policy,
        shared.cancel,
        |retry, err, delay| {
            tracing::warn!(
                url = %segment.remote_url,
                retry,
                "segment download failed, retrying in {:?}: {}",
                delay,
                err
            );
            shared.job.append_log(&format!(
                "\n\nDownloading file '{}' failed! Trying again in {}s\n{}",
                segment.remote_url,
                delay.as_secs(),
                err
            ));
        },
        || {
            let bytes = shared.source.get(&segment.remote_url)?;
            store(segment, &bytes)
        },
    );
    match res {
        Ok(()) => Ok(Fetched::Stored),
        Err((SegmentError::Canceled, _)) => Ok(Fetched::Canceled),
        Err((SegmentError::Storage(source), _)) => Err(FetchError::Storage {
            path: segment.local_path.clone(),
            source,
        }),
        Err((other, retries)) => Err(FetchError::Fatal {
            url: segment.remote_url.clone(),
            retries,
            last_error: other.to_string(),
        }),
    }
}
