//! Scheduler notifications for front-ends.

use std::fmt;

use tokio::sync::broadcast;

use crate::job::JobId;

const DEFAULT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// A job finished successfully and `remove_completed` is on; the front-end
    /// should drop it from its list (and call `remove`).
    RemoveRequested(JobId),
    /// Number of jobs in the queue changed.
    DownloadsCountChanged(usize),
}

impl fmt::Display for SchedulerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerEvent::RemoveRequested(id) => write!(f, "remove requested for job {}", id),
            SchedulerEvent::DownloadsCountChanged(n) => write!(f, "download count is now {}", n),
        }
    }
}

/// Fire-and-forget event sink. Must not block the scheduler.
pub trait Notifier: Send + Sync {
    fn publish(&self, event: SchedulerEvent);
}

/// Fans events out over a tokio broadcast channel. Events published while
/// nobody is subscribed are dropped.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<SchedulerEvent>,
}

impl BroadcastNotifier {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SchedulerEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for BroadcastNotifier {
    fn publish(&self, event: SchedulerEvent) {
        tracing::trace!("publishing scheduler event: {}", event);
        // no receivers is fine
        let _ = self.sender.send(event);
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn publish(&self, _event: SchedulerEvent) {}
}
