//! Error taxonomy for the download engine.
//!
//! Every stage of a job pipeline returns one of the stage errors below; the
//! pipeline boundary folds them into [`Error`] and maps the result to a
//! terminal job state.

use std::path::PathBuf;
use thiserror::Error;

/// Missing or malformed required input, rejected before any work starts.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid input: {0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ManifestError {
    #[error("the playlist is empty")]
    Empty,
    #[error("the playlist does not contain any segments")]
    NoSegments,
    #[error("invalid segment duration on line {line}: {value:?}")]
    InvalidDuration { line: usize, value: String },
    #[error("cannot resolve segment url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("temporary download directory '{0}' is not empty")]
    NotEmpty(PathBuf),
    #[error("workspace {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("could not download '{url}' after {retries} retries: {last_error}")]
    Fatal {
        url: String,
        retries: u32,
        last_error: String,
    },
    #[error("could not write segment {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("segment worker panicked")]
    WorkerPanicked,
}

#[derive(Debug, Error)]
pub enum EncoderError {
    #[error("could not start encoder '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("encoder exited with {status}: {detail}")]
    Failed { status: String, detail: String },
    #[error("encoder i/o on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure of a call on the scheduler handle.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("scheduler has stopped")]
    Stopped,
}

/// Error surfaced at the pipeline boundary.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    #[error(transparent)]
    FatalDownload(#[from] FetchError),
    #[error(transparent)]
    Encoder(#[from] EncoderError),
    #[error("retrieving playlist '{url}' failed: {detail}")]
    Playlist { url: String, detail: String },
    /// Cooperative unwind after the job's cancel token was set. Not a failure.
    #[error("download canceled")]
    Canceled,
    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl Error {
    pub fn is_canceled(&self) -> bool {
        matches!(self, Error::Canceled)
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
