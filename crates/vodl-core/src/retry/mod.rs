//! Segment retry policy.
//!
//! Transport and HTTP failures are retried on the same segment with a fixed
//! delay, a fixed number of times. Local storage failures are never retried,
//! and a canceled job stops waiting for its next attempt.

mod error;
mod policy;
mod run;

pub use error::SegmentError;
pub use policy::{RetryDecision, RetryPolicy};
pub use run::run_with_retry;
