//! Commands accepted by the scheduler actor.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::oneshot;

use crate::error::ValidationError;
use crate::job::{DownloadJob, DownloadParams, JobId, JobSnapshot};

pub(super) type Reply<T> = oneshot::Sender<T>;

#[derive(Debug)]
pub(super) enum Command {
    Enqueue {
        params: Box<DownloadParams>,
        reply: Reply<Result<Option<JobId>, ValidationError>>,
    },
    Cancel {
        id: JobId,
        reply: Reply<bool>,
    },
    Retry {
        id: JobId,
        reply: Reply<bool>,
    },
    Remove {
        id: JobId,
        reply: Reply<bool>,
    },
    Pause(Reply<()>),
    Resume(Reply<()>),
    Shutdown(Reply<()>),
    CanShutdown(Reply<bool>),
    Jobs(Reply<Vec<JobSnapshot>>),
    Job {
        id: JobId,
        reply: Reply<Option<Arc<DownloadJob>>>,
    },
    IsFileNameUsed {
        path: PathBuf,
        reply: Reply<bool>,
    },
}

/// How a pipeline ended; sent by the pipeline task after completion handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PipelineOutcome {
    Done,
    Canceled,
    Failed,
}

#[derive(Debug)]
pub(crate) struct Finished {
    pub id: JobId,
    pub outcome: PipelineOutcome,
}
