//! `vodl download` – queue one recording and drive the scheduler until it ends.

use anyhow::{bail, Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use vodl_core::config::VodlConfig;
use vodl_core::crop::CropSpec;
use vodl_core::events::BroadcastNotifier;
use vodl_core::job::{DownloadParams, DownloadState};
use vodl_core::resolver::{AuthProvider, KnownVideo, MetadataProvider, StaticAuth};
use vodl_core::scheduler::{Scheduler, Services};
use vodl_core::video::{BroadcastKind, Quality, VideoDescriptor, VideoFields, VodAuthInfo};

use crate::cli::parse_offset;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Args)]
pub struct DownloadArgs {
    /// Playlist base URL (everything before `/<quality>/index-dvr.m3u8`).
    #[arg(long)]
    pub base: String,
    /// Video id.
    #[arg(long)]
    pub id: String,
    /// Broadcast type: archive, highlight or upload.
    #[arg(long, default_value = "archive")]
    pub kind: BroadcastKind,
    /// Quality id, e.g. chunked (source), 720p60, audio_only.
    #[arg(long, default_value = "chunked")]
    pub quality: String,
    /// Destination media file.
    #[arg(long, short)]
    pub output: PathBuf,
    /// Channel name, used in logs.
    #[arg(long, default_value = "unknown")]
    pub channel: String,
    #[arg(long)]
    pub title: Option<String>,
    /// Full recording length (HH:MM:SS or seconds); needed for --crop-start alone.
    #[arg(long, value_parser = parse_offset, value_name = "TIME")]
    pub length: Option<Duration>,
    #[arg(long, value_parser = parse_offset, value_name = "TIME")]
    pub crop_start: Option<Duration>,
    #[arg(long, value_parser = parse_offset, value_name = "TIME")]
    pub crop_end: Option<Duration>,
    /// Keep the joined transport stream instead of converting it.
    #[arg(long)]
    pub no_convert: bool,
    /// Playback access token (JSON) for sub-only videos.
    #[arg(long, requires = "sig")]
    pub token: Option<String>,
    /// Signature belonging to --token.
    #[arg(long, requires = "token")]
    pub sig: Option<String>,
}

impl DownloadArgs {
    fn descriptor(&self) -> Result<VideoDescriptor> {
        let length = self.length.or(self.crop_end).unwrap_or_default();
        let video = VideoDescriptor::new(VideoFields {
            channel: self.channel.clone(),
            title: self.title.clone(),
            id: self.id.clone(),
            kind: self.kind,
            playlist_base: self.base.clone(),
            game: None,
            qualities: vec![Quality::new(self.quality.clone())],
            views: 0,
            length,
            recorded_at: 0,
            thumbnail: None,
            sub_only: false,
        })?;
        Ok(video)
    }

    fn auth(&self) -> Result<VodAuthInfo> {
        match (&self.token, &self.sig) {
            (Some(token), Some(sig)) => Ok(VodAuthInfo::from_access_token(token, sig)?),
            _ => Ok(VodAuthInfo::anonymous()),
        }
    }

    /// Builds job parameters through the resolver interfaces.
    pub fn params(&self) -> Result<DownloadParams> {
        let metadata = KnownVideo(self.descriptor()?);
        let auth = StaticAuth(self.auth()?);
        let video = metadata.resolve_video(&self.id)?;
        let auth = auth.auth_info(video.id())?;

        if self.crop_start.is_some() && self.crop_end.is_none() && video.length().is_zero() {
            bail!("--crop-start without --crop-end needs --length");
        }
        let crop = CropSpec {
            crop_start: self.crop_start.is_some(),
            crop_end: self.crop_end.is_some(),
            start: self.crop_start.unwrap_or_default(),
            end: self.crop_end.unwrap_or_else(|| video.length()),
        };
        let quality = video
            .best_quality()
            .cloned()
            .unwrap_or_else(Quality::source);

        let params = DownloadParams {
            video,
            quality,
            output: self.output.clone(),
            crop,
            disable_conversion: self.no_convert,
            auth,
        };
        params.validate()?;
        Ok(params)
    }
}

pub async fn run_download(cfg: VodlConfig, args: DownloadArgs) -> Result<()> {
    let params = args.params()?;
    if let Some(parent) = params.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output directory {}", parent.display()))?;
    }

    let notifier = Arc::new(BroadcastNotifier::new());
    let services = Services::standard(&cfg, notifier);
    let (scheduler, task) = Scheduler::start(cfg, services);

    let id = scheduler
        .enqueue(params)
        .await?
        .context("scheduler refused the job")?;
    let job = scheduler
        .job(id)
        .await?
        .context("job disappeared from the queue")?;
    tracing::info!(job = id, "download queued");

    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let state = job.state();
                let bar = if job.is_indeterminate() {
                    "  ...".to_string()
                } else {
                    format!("{:5.1}%", job.progress())
                };
                eprint!("\r  {:<18} {}  ", job.status(), bar);
                if state.is_terminal() {
                    eprintln!();
                    break;
                }
            }
            _ = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                eprintln!("\ncanceling...");
                scheduler.cancel(id).await?;
            }
        }
    }

    let state = job.state();
    scheduler.shutdown().await?;
    drop(scheduler);
    let _ = task.await;

    match state {
        DownloadState::Done => {
            println!("{}", job.params().output.display());
            Ok(())
        }
        DownloadState::Canceled => bail!("download canceled"),
        _ => {
            let log = job.log();
            let tail: Vec<&str> = log.lines().rev().take(15).collect();
            for line in tail.into_iter().rev() {
                eprintln!("{}", line);
            }
            bail!("download failed")
        }
    }
}
