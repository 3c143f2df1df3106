use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

use super::*;
use crate::crop::CropInfo;
use crate::error::EncoderError;
use crate::events::{BroadcastNotifier, NoopNotifier, SchedulerEvent};
use crate::job::{sample_params, DownloadState, JobHandle};
use crate::retry::SegmentError;
use crate::workspace;

const SEGMENTS: usize = 4;

/// Blocks segment transfers until opened.
struct Gate {
    open: Mutex<bool>,
    cv: Condvar,
}

impl Gate {
    fn new(open: bool) -> Self {
        Self {
            open: Mutex::new(open),
            cv: Condvar::new(),
        }
    }

    fn wait(&self) {
        let mut open = self.open.lock().unwrap();
        while !*open {
            open = self.cv.wait(open).unwrap();
        }
    }

    fn open(&self) {
        *self.open.lock().unwrap() = true;
        self.cv.notify_all();
    }
}

/// In-memory CDN: one manifest, `SEGMENTS` segments.
struct FakeCdn {
    manifest_failures: AtomicU32,
    segment_starts: AtomicUsize,
    gate: Gate,
}

impl FakeCdn {
    fn new(gate_open: bool) -> Arc<Self> {
        Arc::new(Self {
            manifest_failures: AtomicU32::new(0),
            segment_starts: AtomicUsize::new(0),
            gate: Gate::new(gate_open),
        })
    }
}

impl RemoteSource for FakeCdn {
    fn get(&self, url: &str) -> Result<Vec<u8>, SegmentError> {
        if url.ends_with(".m3u8") {
            let failing = self
                .manifest_failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err(SegmentError::Http(404));
            }
            let mut body = String::from("#EXTM3U\n#EXT-X-TARGETDURATION:10\n");
            for i in 0..SEGMENTS {
                body.push_str(&format!("#EXTINF:10.000,\n{}.ts\n", i));
            }
            body.push_str("#EXT-X-ENDLIST\n");
            return Ok(body.into_bytes());
        }
        self.segment_starts.fetch_add(1, Ordering::SeqCst);
        self.gate.wait();
        let name = url.rsplit('/').next().unwrap_or_default();
        Ok(format!("[{}]", name).into_bytes())
    }
}

/// Joins files like the real encoder and copies on convert.
struct CopyEncoder;

impl Encoder for CopyEncoder {
    fn concatenate(
        &self,
        files: &[PathBuf],
        output: &Path,
        _job: &dyn JobHandle,
    ) -> Result<(), EncoderError> {
        let mut joined = Vec::new();
        for f in files {
            joined.extend(std::fs::read(f).map_err(|source| EncoderError::Io {
                path: f.clone(),
                source,
            })?);
        }
        std::fs::write(output, joined).map_err(|source| EncoderError::Io {
            path: output.to_path_buf(),
            source,
        })
    }

    fn convert(
        &self,
        input: &Path,
        output: &Path,
        _crop: &CropInfo,
        _job: &dyn JobHandle,
    ) -> Result<(), EncoderError> {
        std::fs::copy(input, output)
            .map(|_| ())
            .map_err(|source| EncoderError::Io {
                path: output.to_path_buf(),
                source,
            })
    }
}

struct Harness {
    scheduler: Scheduler,
    cdn: Arc<FakeCdn>,
    dir: tempfile::TempDir,
}

impl Harness {
    fn start(gate_open: bool, notifier: Arc<dyn Notifier>, remove_completed: bool) -> Self {
        Self::start_with(gate_open, notifier, |cfg| cfg.remove_completed = remove_completed)
    }

    fn start_with(
        gate_open: bool,
        notifier: Arc<dyn Notifier>,
        tweak: impl FnOnce(&mut VodlConfig),
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = VodlConfig {
            max_connections: 3,
            temp_dir: Some(dir.path().join("tmp")),
            retry: Some(crate::config::RetryConfig {
                max_retries: 1,
                delay_secs: 0,
            }),
            promote_interval_secs: 1,
            shutdown_timeout_secs: 5,
            ..VodlConfig::default()
        };
        tweak(&mut config);
        let cdn = FakeCdn::new(gate_open);
        let services = Services {
            source: cdn.clone(),
            encoder: Arc::new(CopyEncoder),
            notifier,
        };
        let (scheduler, _task) = Scheduler::start(config, services);
        Self {
            scheduler,
            cdn,
            dir,
        }
    }

    fn params(&self, name: &str) -> DownloadParams {
        let mut params = sample_params();
        params.output = self.dir.path().join(name);
        params
    }

    async fn wait_for(&self, id: JobId, want: DownloadState) -> Arc<DownloadJob> {
        let job = self.scheduler.job(id).await.unwrap().expect("job exists");
        tokio::time::timeout(Duration::from_secs(10), async {
            while job.state() != want {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("job {} never reached {:?}; log:\n{}", id, want, job.log()));
        job
    }

    async fn wait_for_segment_start(&self) {
        tokio::time::timeout(Duration::from_secs(10), async {
            while self.cdn.segment_starts.load(Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("segment download never started");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn single_job_runs_to_done() {
    let h = Harness::start(true, Arc::new(NoopNotifier), false);
    let id = h.scheduler.enqueue(h.params("video.mp4")).await.unwrap().unwrap();

    let job = h.wait_for(id, DownloadState::Done).await;

    let out = std::fs::read_to_string(h.dir.path().join("video.mp4")).unwrap();
    assert_eq!(out, "[0.ts][1.ts][2.ts][3.ts]");
    assert_eq!(job.progress(), 100.0);
    assert!(job.log().contains("Download task ended successfully!"));
    // workspace is gone
    assert!(!workspace::job_dir(&h.dir.path().join("tmp"), id).exists());
    assert!(h.scheduler.can_shutdown().await.unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn disabled_conversion_writes_joined_stream_to_output() {
    let h = Harness::start(true, Arc::new(NoopNotifier), false);
    let mut params = h.params("raw.ts");
    params.disable_conversion = true;
    let id = h.scheduler.enqueue(params).await.unwrap().unwrap();

    h.wait_for(id, DownloadState::Done).await;
    let out = std::fs::read_to_string(h.dir.path().join("raw.ts")).unwrap();
    assert_eq!(out, "[0.ts][1.ts][2.ts][3.ts]");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn at_most_one_job_downloads() {
    let h = Harness::start(false, Arc::new(NoopNotifier), false);
    let mut ids = Vec::new();
    for i in 0..3 {
        let params = h.params(&format!("v{}.mp4", i));
        ids.push(h.scheduler.enqueue(params).await.unwrap().unwrap());
    }
    h.wait_for_segment_start().await;

    let jobs = h.scheduler.jobs().await.unwrap();
    let downloading: Vec<_> = jobs
        .iter()
        .filter(|j| j.state == DownloadState::Downloading)
        .map(|j| j.id)
        .collect();
    assert_eq!(downloading, vec![ids[0]]);
    assert!(!h.scheduler.can_shutdown().await.unwrap());

    h.cdn.gate.open();
    for id in &ids {
        h.wait_for(*id, DownloadState::Done).await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancel_mid_fetch_ends_canceled() {
    let h = Harness::start(false, Arc::new(NoopNotifier), false);
    let id = h.scheduler.enqueue(h.params("video.mp4")).await.unwrap().unwrap();
    h.wait_for_segment_start().await;

    assert!(h.scheduler.cancel(id).await.unwrap());
    h.cdn.gate.open();

    let job = h.wait_for(id, DownloadState::Canceled).await;
    assert!(job.log().contains("Download task was canceled!"));
    assert!(!h.dir.path().join("video.mp4").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn retry_resets_failed_job() {
    let h = Harness::start(true, Arc::new(NoopNotifier), false);
    // The manifest request of the first run gets a 404.
    h.cdn.manifest_failures.store(1, Ordering::SeqCst);
    let id = h.scheduler.enqueue(h.params("video.mp4")).await.unwrap().unwrap();

    let job = h.wait_for(id, DownloadState::Error).await;
    assert!(job.log().contains("Download task ended with an error!"));

    // The slot is released right after the terminal state is recorded.
    tokio::time::timeout(Duration::from_secs(5), async {
        while !h.scheduler.retry(id).await.unwrap() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
    h.wait_for(id, DownloadState::Done).await;
    assert!(!job.log().contains("ended with an error"));

    // Done is terminal.
    assert!(!h.scheduler.retry(id).await.unwrap());
    assert_eq!(job.state(), DownloadState::Done);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn paused_scheduler_ignores_enqueue_and_retry() {
    let h = Harness::start(true, Arc::new(NoopNotifier), false);
    h.scheduler.pause().await.unwrap();
    assert_eq!(h.scheduler.enqueue(h.params("a.mp4")).await.unwrap(), None);
    assert!(h.scheduler.jobs().await.unwrap().is_empty());

    h.scheduler.resume().await.unwrap();
    let id = h.scheduler.enqueue(h.params("a.mp4")).await.unwrap().unwrap();
    h.wait_for(id, DownloadState::Done).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn invalid_params_are_rejected() {
    let h = Harness::start(true, Arc::new(NoopNotifier), false);
    let mut params = h.params("a.mp4");
    params.output = PathBuf::from("/");
    let err = h.scheduler.enqueue(params).await.unwrap_err();
    assert!(matches!(err, SchedulerError::Validation(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn output_path_reservation_is_case_insensitive() {
    let h = Harness::start(false, Arc::new(NoopNotifier), false);
    let id = h.scheduler.enqueue(h.params("Video.MP4")).await.unwrap().unwrap();
    assert!(h
        .scheduler
        .is_file_name_used(h.dir.path().join("video.mp4"))
        .await
        .unwrap());
    assert!(!h
        .scheduler
        .is_file_name_used(h.dir.path().join("other.mp4"))
        .await
        .unwrap());

    h.cdn.gate.open();
    h.wait_for(id, DownloadState::Done).await;
    assert!(!h
        .scheduler
        .is_file_name_used(h.dir.path().join("video.mp4"))
        .await
        .unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn running_job_cannot_be_removed() {
    let h = Harness::start(false, Arc::new(NoopNotifier), false);
    let id = h.scheduler.enqueue(h.params("a.mp4")).await.unwrap().unwrap();
    h.wait_for_segment_start().await;
    assert!(!h.scheduler.remove(id).await.unwrap());

    h.cdn.gate.open();
    h.wait_for(id, DownloadState::Done).await;
    // Completion is recorded before the slot is released; retry until it is.
    tokio::time::timeout(Duration::from_secs(5), async {
        while !h.scheduler.remove(id).await.unwrap() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
    assert!(h.scheduler.job(id).await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn completed_job_requests_removal_when_configured() {
    let notifier = Arc::new(BroadcastNotifier::new());
    let mut events = notifier.subscribe();
    let h = Harness::start(true, notifier, true);
    let id = h.scheduler.enqueue(h.params("a.mp4")).await.unwrap().unwrap();

    let removed = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            if let Ok(SchedulerEvent::RemoveRequested(got)) = events.recv().await {
                return got;
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(removed, id);
    assert!(h.scheduler.job(id).await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_empties_the_queue() {
    let h = Harness::start(false, Arc::new(NoopNotifier), false);
    let mut held = Vec::new();
    for i in 0..4 {
        let id = h
            .scheduler
            .enqueue(h.params(&format!("v{}.mp4", i)))
            .await
            .unwrap()
            .unwrap();
        held.push(h.scheduler.job(id).await.unwrap().unwrap());
    }
    h.wait_for_segment_start().await;

    let cdn = h.cdn.clone();
    let opener = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cdn.gate.open();
    });
    h.scheduler.shutdown().await.unwrap();
    opener.await.unwrap();

    assert!(h.scheduler.jobs().await.unwrap().is_empty());
    assert!(h.scheduler.can_shutdown().await.unwrap());
    // The running job was canceled, the others never started.
    assert_eq!(held[0].state(), DownloadState::Canceled);
    assert!(held[1..].iter().all(|j| j.state() == DownloadState::Queued));
    // Paused afterwards.
    assert_eq!(h.scheduler.enqueue(h.params("late.mp4")).await.unwrap(), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn pipeline_outliving_shutdown_keeps_the_slot() {
    let h = Harness::start_with(false, Arc::new(NoopNotifier), |cfg| {
        cfg.shutdown_timeout_secs = 0;
    });
    let first = h.scheduler.enqueue(h.params("a.mp4")).await.unwrap().unwrap();
    let first = h.scheduler.job(first).await.unwrap().unwrap();
    h.wait_for_segment_start().await;

    // Workers are stuck behind the gate, so the zero timeout expires.
    h.scheduler.shutdown().await.unwrap();
    assert_eq!(first.state(), DownloadState::Downloading);

    h.scheduler.resume().await.unwrap();
    let second = h.scheduler.enqueue(h.params("b.mp4")).await.unwrap().unwrap();
    let starts_before = h.cdn.segment_starts.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(1_500)).await;

    let job = h.scheduler.job(second).await.unwrap().unwrap();
    assert_eq!(job.state(), DownloadState::Queued);
    assert_eq!(h.cdn.segment_starts.load(Ordering::SeqCst), starts_before);

    // Once the old pipeline unwinds, the slot is handed to the new job.
    h.cdn.gate.open();
    h.wait_for(second, DownloadState::Done).await;
    assert_eq!(first.state(), DownloadState::Canceled);
}
