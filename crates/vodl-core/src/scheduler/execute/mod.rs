//! One job's pipeline: workspace → manifest → crop → segments → encoder.
//!
//! Stages run strictly in sequence and check the job's cancel token in
//! between. Blocking work (disk, curl, ffmpeg) runs under `spawn_blocking`.

mod finish;
mod info;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::VodlConfig;
use crate::control::CancelToken;
use crate::crop;
use crate::downloader::{self, FetchOptions, FetchOutcome, RemoteSource};
use crate::encoder::Encoder;
use crate::error::{Error, Result};
use crate::job::{DownloadJob, JobHandle, STATUS_INITIALIZING};
use crate::manifest::{url_prefix_of, Playlist};
use crate::retry::RetryPolicy;
use crate::workspace;

use super::messages::Finished;

/// Collaborators shared by every pipeline of one scheduler.
pub(crate) struct PipelineContext {
    pub source: Arc<dyn RemoteSource>,
    pub encoder: Arc<dyn Encoder>,
    pub config: Arc<VodlConfig>,
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

/// Intermediate file the segments are joined into before conversion.
fn concat_path(workspace_dir: &Path, output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    workspace_dir.join(format!("{}.ts", stem))
}

/// Spawns the pipeline for `job` plus its completion handling; the actor is
/// told through `done_tx` once the job reached its terminal state.
pub(super) fn spawn_pipeline(
    ctx: Arc<PipelineContext>,
    job: Arc<DownloadJob>,
    cancel: CancelToken,
    done_tx: mpsc::UnboundedSender<Finished>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let id = job.id();
        let workspace_dir = workspace::job_dir(&ctx.config.temp_root(), id);

        // Inner task so a panic still reaches completion handling.
        let inner = {
            let ctx = Arc::clone(&ctx);
            let job = Arc::clone(&job);
            let dir = workspace_dir.clone();
            tokio::spawn(async move { run_pipeline(&ctx, &job, &cancel, &dir).await })
        };
        let result = inner.await.unwrap_or_else(|e| Err(Error::Join(e)));

        let outcome = finish::complete(&job, &workspace_dir, result).await;
        let _ = done_tx.send(Finished { id, outcome });
    })
}

async fn run_pipeline(
    ctx: &PipelineContext,
    job: &Arc<DownloadJob>,
    cancel: &CancelToken,
    workspace_dir: &Path,
) -> Result<()> {
    let params = job.params().clone();
    let handle: Arc<dyn JobHandle> = job.clone();

    job.set_status(STATUS_INITIALIZING);
    job.append_log("Download task has been started!");
    info::write_download_info(job.as_ref(), &params, &ctx.config, workspace_dir);

    job.append_log(&format!(
        "\n\nPreparing temporary download directory '{}'...",
        workspace_dir.display()
    ));
    {
        let dir = workspace_dir.to_path_buf();
        blocking(move || workspace::prepare(&dir).map_err(Error::from)).await?;
    }
    job.append_log(" done!");
    cancel.check()?;

    let playlist_url = params.video.playlist_url(&params.quality);
    job.append_log(&format!(
        "\n\nPlaylist url for selected quality {} is {}",
        params.quality.display_string(),
        playlist_url
    ));
    cancel.check()?;

    job.append_log("\n\nRetrieving playlist...");
    let manifest = {
        let source = Arc::clone(&ctx.source);
        let url = playlist_url.clone();
        blocking(move || {
            source.get_text(&url).map_err(|e| Error::Playlist {
                detail: e.to_string(),
                url,
            })
        })
        .await?
    };
    job.append_log(" done!");

    job.append_log("\nParsing playlist...");
    let mut playlist = Playlist::parse(workspace_dir, &manifest, url_prefix_of(&playlist_url))?;
    job.append_log(" done!");
    job.append_log(&format!("\nNumber of video chunks: {}", playlist.len()));
    cancel.check()?;

    let crop_info = crop::plan(&mut playlist, &params.crop);
    tracing::debug!(
        job = job.id(),
        segments = playlist.len(),
        start = crop_info.start,
        length = crop_info.length,
        "playlist cropped"
    );
    cancel.check()?;

    let playlist = Arc::new(playlist);
    let opts = FetchOptions {
        parallelism: ctx.config.parallel_segments(),
        retry: RetryPolicy::from(&ctx.config.retry_config()),
    };
    let fetched = {
        let playlist = Arc::clone(&playlist);
        let source = Arc::clone(&ctx.source);
        let cancel = cancel.clone();
        let handle = Arc::clone(&handle);
        blocking(move || {
            downloader::fetch_all(&playlist, &opts, source.as_ref(), &cancel, handle.as_ref())
                .map_err(Error::from)
        })
        .await?
    };
    if fetched == FetchOutcome::Canceled {
        return Err(Error::Canceled);
    }
    cancel.check()?;

    let concat_target = if params.disable_conversion {
        params.output.clone()
    } else {
        concat_path(workspace_dir, &params.output)
    };
    {
        let encoder = Arc::clone(&ctx.encoder);
        let files = playlist.local_files();
        let target = concat_target.clone();
        let handle = Arc::clone(&handle);
        blocking(move || {
            encoder
                .concatenate(&files, &target, handle.as_ref())
                .map_err(Error::from)
        })
        .await?;
    }

    if !params.disable_conversion {
        cancel.check()?;
        let encoder = Arc::clone(&ctx.encoder);
        let output = params.output.clone();
        blocking(move || {
            encoder
                .convert(&concat_target, &output, &crop_info, handle.as_ref())
                .map_err(Error::from)
        })
        .await?;
    }

    Ok(())
}
