use std::fmt;

/// Lifecycle of a job: `Queued → Downloading → {Done, Error, Canceled}`.
/// `Error` and `Canceled` can go back to `Queued` through a retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DownloadState {
    Queued,
    Downloading,
    Done,
    Error,
    Canceled,
}

impl DownloadState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DownloadState::Done | DownloadState::Error | DownloadState::Canceled
        )
    }

    pub fn is_retryable(self) -> bool {
        matches!(self, DownloadState::Error | DownloadState::Canceled)
    }

    /// Queued or downloading jobs block shutdown and reserve their output path.
    pub fn is_pending(self) -> bool {
        matches!(self, DownloadState::Queued | DownloadState::Downloading)
    }
}

impl fmt::Display for DownloadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DownloadState::Queued => "queued",
            DownloadState::Downloading => "downloading",
            DownloadState::Done => "done",
            DownloadState::Error => "error",
            DownloadState::Canceled => "canceled",
        };
        f.write_str(s)
    }
}
