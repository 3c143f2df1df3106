//! Completion handling: runs exactly once per pipeline, whatever the outcome.

use std::path::Path;

use crate::error::Error;
use crate::job::{DownloadJob, DownloadState, JobHandle};
use crate::workspace;

use crate::scheduler::messages::PipelineOutcome;

/// Cleans the workspace, settles progress and records the terminal state.
pub(super) async fn complete(
    job: &DownloadJob,
    workspace_dir: &Path,
    result: Result<(), Error>,
) -> PipelineOutcome {
    job.append_log("\n\nStarting temporary download folder cleanup!");
    let dir = workspace_dir.to_path_buf();
    let removed = tokio::task::spawn_blocking(move || workspace::cleanup(&dir))
        .await
        .unwrap_or(false);
    if !removed {
        job.append_log(&format!(
            "\nCould not remove temporary download folder '{}'",
            workspace_dir.display()
        ));
    }

    job.set_progress(100.0);
    job.set_indeterminate(false);

    match result {
        Ok(()) => {
            job.set_state(DownloadState::Done);
            job.append_log("\n\nDownload task ended successfully!");
            PipelineOutcome::Done
        }
        Err(Error::Canceled) => {
            job.set_state(DownloadState::Canceled);
            job.append_log("\n\nDownload task was canceled!");
            PipelineOutcome::Canceled
        }
        Err(e) => {
            let detail = format!("{:#}", anyhow::Error::from(e));
            tracing::error!(job = job.id(), "download failed: {}", detail);
            job.set_state(DownloadState::Error);
            job.append_log("\n\nDownload task ended with an error!");
            job.append_log(&format!("\n\n{}", detail));
            PipelineOutcome::Failed
        }
    }
}
