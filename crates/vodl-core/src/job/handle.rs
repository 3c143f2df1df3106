use super::DownloadState;

/// Reporting capability handed to pipeline stages, the fetcher and the encoder.
pub trait JobHandle: Send + Sync {
    fn set_state(&self, state: DownloadState);
    /// Appends raw text to the job log (callers include their own newlines).
    fn append_log(&self, text: &str);
    fn set_status(&self, status: &str);
    /// Progress percentage in `[0, 100]`.
    fn set_progress(&self, percent: f64);
    fn set_indeterminate(&self, on: bool);
}
