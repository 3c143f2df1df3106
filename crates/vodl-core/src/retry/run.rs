//! Retry loop: run a closure until success or policy says stop.

use std::time::{Duration, Instant};

use crate::control::CancelToken;

use super::error::SegmentError;
use super::policy::{RetryDecision, RetryPolicy};

/// Granularity of the cancel check while waiting between attempts.
const CANCEL_POLL: Duration = Duration::from_millis(100);

/// Sleeps for `delay` unless `cancel` fires first. Returns false when canceled.
fn wait_unless_canceled(delay: Duration, cancel: &CancelToken) -> bool {
    let deadline = Instant::now() + delay;
    loop {
        if cancel.is_canceled() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        std::thread::sleep(CANCEL_POLL.min(deadline - now));
    }
}

/// Runs `f` until it succeeds or the retry policy says to stop.
///
/// Before each retry `on_retry(retry_number, &error, delay)` is called
/// (1-based), then the thread waits for the delay. A cancel observed before
/// or during that wait ends the loop with [`SegmentError::Canceled`]. On
/// failure the last error is returned together with the number of retries
/// performed.
pub fn run_with_retry<T, F, R>(
    policy: &RetryPolicy,
    cancel: &CancelToken,
    mut on_retry: R,
    mut f: F,
) -> Result<T, (SegmentError, u32)>
where
    F: FnMut() -> Result<T, SegmentError>,
    R: FnMut(u32, &SegmentError, Duration),
{
    let mut retries = 0u32;
    loop {
        match f() {
            Ok(v) => return Ok(v),
            Err(e) => match policy.decide(retries, &e) {
                RetryDecision::NoRetry => return Err((e, retries)),
                RetryDecision::RetryAfter(d) => {
                    if cancel.is_canceled() {
                        return Err((SegmentError::Canceled, retries));
                    }
                    retries += 1;
                    on_retry(retries, &e, d);
                    if !wait_unless_canceled(d, cancel) {
                        return Err((SegmentError::Canceled, retries));
                    }
                }
            },
        }
    }
}
