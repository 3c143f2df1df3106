//! Segment fetch error type for retry classification.

use std::fmt;

/// Error returned by a single segment fetch (curl failure, HTTP error, or storage failure).
#[derive(Debug)]
pub enum SegmentError {
    /// Curl reported an error (timeout, connection, etc.).
    Curl(curl::Error),
    /// HTTP response had a non-2xx status.
    Http(u32),
    /// Any other transport failure (used by non-curl sources).
    Transport(String),
    /// Disk/storage write failed (e.g. disk full, permission denied). Not retried.
    Storage(std::io::Error),
    /// The job was canceled while waiting for the next attempt.
    Canceled,
}

impl SegmentError {
    /// Transient errors are worth another attempt on the same segment.
    pub fn is_transient(&self) -> bool {
        !matches!(self, SegmentError::Storage(_) | SegmentError::Canceled)
    }
}

impl fmt::Display for SegmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentError::Curl(e) => write!(f, "{}", e),
            SegmentError::Http(code) => write!(f, "HTTP {}", code),
            SegmentError::Transport(msg) => write!(f, "{}", msg),
            SegmentError::Storage(e) => write!(f, "storage: {}", e),
            SegmentError::Canceled => f.write_str("canceled"),
        }
    }
}

impl std::error::Error for SegmentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SegmentError::Curl(e) => Some(e),
            SegmentError::Storage(e) => Some(e),
            SegmentError::Http(_) | SegmentError::Transport(_) | SegmentError::Canceled => None,
        }
    }
}
