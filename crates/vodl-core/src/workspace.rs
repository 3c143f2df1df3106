//! Per-job staging directory for downloaded segments.
//!
//! Each job owns `temp_root/vodl-<id>` for its whole lifetime. A run only
//! starts in an empty directory, and the directory is removed whatever the
//! outcome.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::WorkspaceError;
use crate::job::JobId;

/// Workspace directory name prefix.
pub const WORKSPACE_PREFIX: &str = "vodl-";

/// Workspace path for a job: `temp_root/vodl-<id>`.
pub fn job_dir(temp_root: &Path, job_id: JobId) -> PathBuf {
    temp_root.join(format!("{}{}", WORKSPACE_PREFIX, job_id))
}

/// Creates `dir` if needed and checks that it is empty, so stale files from an
/// earlier run cannot end up in the concatenated output.
pub fn prepare(dir: &Path) -> Result<(), WorkspaceError> {
    let io_err = |source| WorkspaceError::Io {
        path: dir.to_path_buf(),
        source,
    };
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(io_err)?;
        tracing::debug!(path = %dir.display(), "created workspace");
    }
    let mut entries = fs::read_dir(dir).map_err(io_err)?;
    if entries.next().is_some() {
        return Err(WorkspaceError::NotEmpty(dir.to_path_buf()));
    }
    Ok(())
}

/// Best-effort recursive delete. Returns whether the directory is gone.
pub fn cleanup(dir: &Path) -> bool {
    match fs::remove_dir_all(dir) {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(e) => {
            tracing::debug!(path = %dir.display(), "workspace cleanup failed: {}", e);
            false
        }
    }
}
