//! Job queue and lifecycle.
//!
//! A single actor task owns the queue and the one download slot; the
//! cloneable [`Scheduler`] handle talks to it over a channel. Promotion of the
//! next queued job happens on enqueue, retry, resume and job completion, with
//! a periodic timer as a safety net.

mod actor;
mod execute;
mod messages;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::config::VodlConfig;
use crate::downloader::{CurlSource, RemoteSource};
use crate::encoder::{Encoder, FfmpegEncoder};
use crate::error::SchedulerError;
use crate::events::Notifier;
use crate::job::{DownloadJob, DownloadParams, JobId, JobSnapshot};

use self::actor::SchedulerActor;
use self::execute::PipelineContext;
use self::messages::{Command, Reply};

const MAILBOX_CAPACITY: usize = 64;

/// External collaborators a scheduler drives its pipelines with.
#[derive(Clone)]
pub struct Services {
    pub source: Arc<dyn RemoteSource>,
    pub encoder: Arc<dyn Encoder>,
    pub notifier: Arc<dyn Notifier>,
}

impl Services {
    /// libcurl for the network and the configured ffmpeg for encoding.
    pub fn standard(config: &VodlConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            source: Arc::new(CurlSource::default()),
            encoder: Arc::new(FfmpegEncoder::new(&config.ffmpeg_path)),
            notifier,
        }
    }
}

/// Handle to the scheduler actor. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Scheduler {
    tx: mpsc::Sender<Command>,
}

impl Scheduler {
    /// Spawns the actor on the current tokio runtime. The actor runs until
    /// every handle is dropped; the join handle resolves after that.
    pub fn start(config: VodlConfig, services: Services) -> (Self, JoinHandle<()>) {
        let config = Arc::new(config);
        let ctx = Arc::new(PipelineContext {
            source: services.source,
            encoder: services.encoder,
            config: Arc::clone(&config),
        });
        let (tx, rx) = mpsc::channel(MAILBOX_CAPACITY);
        let actor = SchedulerActor::new(config, ctx, services.notifier, rx);
        let task = tokio::spawn(actor.run());
        (Self { tx }, task)
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, SchedulerError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| SchedulerError::Stopped)?;
        rx.await.map_err(|_| SchedulerError::Stopped)
    }

    /// Queues a download. `Ok(None)` while paused.
    pub async fn enqueue(&self, params: DownloadParams) -> Result<Option<JobId>, SchedulerError> {
        let res = self
            .request(|reply| Command::Enqueue {
                params: Box::new(params),
                reply,
            })
            .await?;
        Ok(res?)
    }

    /// Signals the job's running pipeline. Returns false when it has none.
    pub async fn cancel(&self, id: JobId) -> Result<bool, SchedulerError> {
        self.request(|reply| Command::Cancel { id, reply }).await
    }

    /// Requeues a canceled or failed job with an empty log and zero progress.
    pub async fn retry(&self, id: JobId) -> Result<bool, SchedulerError> {
        self.request(|reply| Command::Retry { id, reply }).await
    }

    /// Drops a job that is not running.
    pub async fn remove(&self, id: JobId) -> Result<bool, SchedulerError> {
        self.request(|reply| Command::Remove { id, reply }).await
    }

    pub async fn pause(&self) -> Result<(), SchedulerError> {
        self.request(Command::Pause).await
    }

    pub async fn resume(&self) -> Result<(), SchedulerError> {
        self.request(Command::Resume).await
    }

    /// Pauses, cancels and awaits running downloads (bounded by
    /// `shutdown_timeout_secs`), then empties the queue.
    pub async fn shutdown(&self) -> Result<(), SchedulerError> {
        self.request(Command::Shutdown).await
    }

    /// True when no job is queued or downloading.
    pub async fn can_shutdown(&self) -> Result<bool, SchedulerError> {
        self.request(Command::CanShutdown).await
    }

    pub async fn jobs(&self) -> Result<Vec<JobSnapshot>, SchedulerError> {
        self.request(Command::Jobs).await
    }

    pub async fn job(&self, id: JobId) -> Result<Option<Arc<DownloadJob>>, SchedulerError> {
        self.request(|reply| Command::Job { id, reply }).await
    }

    /// Whether a queued or running job already writes to `path`
    /// (compared case-insensitively).
    pub async fn is_file_name_used(
        &self,
        path: impl Into<PathBuf>,
    ) -> Result<bool, SchedulerError> {
        let path = path.into();
        self.request(|reply| Command::IsFileNameUsed { path, reply })
            .await
    }
}

#[cfg(test)]
mod tests;
