//! The scheduler actor: sole owner of the job queue and the download slot.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::VodlConfig;
use crate::control::CancelToken;
use crate::error::ValidationError;
use crate::events::{Notifier, SchedulerEvent};
use crate::job::{DownloadJob, DownloadParams, DownloadState, JobHandle, JobId, JobSnapshot};

use super::execute::{spawn_pipeline, PipelineContext};
use super::messages::{Command, Finished, PipelineOutcome};

struct ActivePipeline {
    cancel: CancelToken,
    handle: JoinHandle<()>,
}

pub(super) struct SchedulerActor {
    config: Arc<VodlConfig>,
    ctx: Arc<PipelineContext>,
    notifier: Arc<dyn Notifier>,
    /// Enqueue order; promotion picks the first Queued entry.
    jobs: Vec<Arc<DownloadJob>>,
    active: HashMap<JobId, ActivePipeline>,
    next_id: JobId,
    paused: bool,
    commands: mpsc::Receiver<Command>,
    finished_tx: mpsc::UnboundedSender<Finished>,
    finished_rx: mpsc::UnboundedReceiver<Finished>,
}

impl SchedulerActor {
    pub(super) fn new(
        config: Arc<VodlConfig>,
        ctx: Arc<PipelineContext>,
        notifier: Arc<dyn Notifier>,
        commands: mpsc::Receiver<Command>,
    ) -> Self {
        let (finished_tx, finished_rx) = mpsc::unbounded_channel();
        Self {
            config,
            ctx,
            notifier,
            jobs: Vec::new(),
            active: HashMap::new(),
            next_id: 1,
            paused: false,
            commands,
            finished_tx,
            finished_rx,
        }
    }

    pub(super) async fn run(mut self) {
        let mut tick = tokio::time::interval(self.config.promote_interval());
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                Some(done) = self.finished_rx.recv() => self.on_finished(done),
                cmd = self.commands.recv() => match cmd {
                    Some(Command::Shutdown(reply)) => {
                        self.shutdown().await;
                        let _ = reply.send(());
                    }
                    Some(cmd) => self.handle(cmd),
                    None => {
                        self.shutdown().await;
                        break;
                    }
                },
                _ = tick.tick() => self.promote_next(),
            }
        }
        tracing::debug!("scheduler actor stopped");
    }

    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Enqueue { params, reply } => {
                let _ = reply.send(self.enqueue(*params));
            }
            Command::Cancel { id, reply } => {
                let _ = reply.send(self.cancel(id));
            }
            Command::Retry { id, reply } => {
                let _ = reply.send(self.retry(id));
            }
            Command::Remove { id, reply } => {
                let _ = reply.send(self.remove(id));
            }
            Command::Pause(reply) => {
                self.paused = true;
                tracing::info!("scheduler paused");
                let _ = reply.send(());
            }
            Command::Resume(reply) => {
                self.paused = false;
                tracing::info!("scheduler resumed");
                self.promote_next();
                let _ = reply.send(());
            }
            Command::CanShutdown(reply) => {
                let _ = reply.send(self.can_shutdown());
            }
            Command::Jobs(reply) => {
                let _ = reply.send(self.snapshots());
            }
            Command::Job { id, reply } => {
                let _ = reply.send(self.find(id).cloned());
            }
            Command::IsFileNameUsed { path, reply } => {
                let _ = reply.send(self.is_file_name_used(&path));
            }
            // Handled in `run` so the loop can await it.
            Command::Shutdown(reply) => {
                let _ = reply.send(());
            }
        }
    }

    fn find(&self, id: JobId) -> Option<&Arc<DownloadJob>> {
        self.jobs.iter().find(|j| j.id() == id)
    }

    fn publish_count(&self) {
        self.notifier
            .publish(SchedulerEvent::DownloadsCountChanged(self.jobs.len()));
    }

    fn enqueue(&mut self, params: DownloadParams) -> Result<Option<JobId>, ValidationError> {
        if self.paused {
            tracing::debug!("enqueue ignored while paused");
            return Ok(None);
        }
        params.validate()?;

        let id = self.next_id;
        self.next_id += 1;
        tracing::info!(
            job = id,
            video = params.video.id(),
            quality = params.quality.id(),
            "job queued"
        );
        self.jobs.push(Arc::new(DownloadJob::new(id, params)));
        self.publish_count();
        self.promote_next();
        Ok(Some(id))
    }

    /// Signals the job's pipeline. State changes once the pipeline unwinds.
    fn cancel(&mut self, id: JobId) -> bool {
        match self.active.get(&id) {
            Some(active) => {
                tracing::info!(job = id, "cancel requested");
                active.cancel.cancel();
                true
            }
            None => false,
        }
    }

    fn retry(&mut self, id: JobId) -> bool {
        if self.paused || self.active.contains_key(&id) {
            return false;
        }
        let Some(job) = self.find(id) else {
            return false;
        };
        if !job.state().is_retryable() {
            return false;
        }
        job.reset_for_retry();
        tracing::info!(job = id, "job requeued");
        self.promote_next();
        true
    }

    fn remove(&mut self, id: JobId) -> bool {
        if self.active.contains_key(&id) {
            return false;
        }
        let Some(pos) = self.jobs.iter().position(|j| j.id() == id) else {
            return false;
        };
        self.jobs.remove(pos);
        tracing::debug!(job = id, "job removed");
        self.publish_count();
        true
    }

    fn can_shutdown(&self) -> bool {
        !self.jobs.iter().any(|j| j.state().is_pending())
    }

    fn snapshots(&self) -> Vec<JobSnapshot> {
        self.jobs.iter().map(|j| j.snapshot()).collect()
    }

    fn is_file_name_used(&self, path: &Path) -> bool {
        let wanted = path.to_string_lossy().to_lowercase();
        self.jobs.iter().any(|j| {
            j.state().is_pending()
                && j.params().output.to_string_lossy().to_lowercase() == wanted
        })
    }

    /// Starts the earliest queued job when the slot is free.
    fn promote_next(&mut self) {
        if self.paused || !self.active.is_empty() {
            return;
        }
        let Some(job) = self
            .jobs
            .iter()
            .find(|j| j.state() == DownloadState::Queued)
            .cloned()
        else {
            return;
        };

        let id = job.id();
        let cancel = CancelToken::new();
        job.set_state(DownloadState::Downloading);
        let handle = spawn_pipeline(
            Arc::clone(&self.ctx),
            job,
            cancel.clone(),
            self.finished_tx.clone(),
        );
        self.active.insert(id, ActivePipeline { cancel, handle });
        tracing::info!(job = id, "download started");
    }

    fn on_finished(&mut self, done: Finished) {
        self.active.remove(&done.id);
        tracing::info!(job = done.id, outcome = ?done.outcome, "download finished");

        if done.outcome == PipelineOutcome::Done && self.config.remove_completed {
            self.notifier
                .publish(SchedulerEvent::RemoveRequested(done.id));
            self.remove(done.id);
        }
        self.promote_next();
    }

    /// Pauses, cancels and awaits every running pipeline (bounded by the
    /// shutdown timeout), then drops every job.
    ///
    /// Pipelines still running when the timeout expires stay in `active`
    /// and keep the download slot until their completion message arrives.
    async fn shutdown(&mut self) {
        self.paused = true;
        for active in self.active.values() {
            active.cancel.cancel();
        }
        let running = self.active.len();
        let limit = self.config.shutdown_timeout();

        let active = &mut self.active;
        let wait_all = async move {
            for pipeline in active.values_mut() {
                // Pipeline failures are irrelevant at this point.
                let _ = (&mut pipeline.handle).await;
            }
        };
        if tokio::time::timeout(limit, wait_all).await.is_err() {
            tracing::warn!(running, "shutdown timed out waiting for running downloads");
        }
        self.active.retain(|_, a| !a.handle.is_finished());

        while let Ok(done) = self.finished_rx.try_recv() {
            self.active.remove(&done.id);
        }
        if !self.active.is_empty() {
            tracing::warn!(
                still_running = self.active.len(),
                "downloads keep the slot until they stop"
            );
        }

        let removed = self.jobs.len();
        self.jobs.clear();
        self.publish_count();
        tracing::info!(removed, "scheduler shut down");
    }
}
