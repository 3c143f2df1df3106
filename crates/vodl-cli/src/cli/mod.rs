//! CLI for the vodl VOD downloader.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use vodl_core::config;

use commands::{run_download, run_parse_id, run_plan, DownloadArgs};

/// Top-level CLI for the vodl downloader.
#[derive(Debug, Parser)]
#[command(name = "vodl")]
#[command(about = "vodl: segmented VOD downloader", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download one recording and wait until it finishes.
    Download(DownloadArgs),

    /// Show which segments of a local manifest a crop keeps.
    Plan {
        /// Path to an m3u8 manifest.
        manifest: PathBuf,
        /// Trim the beginning at this offset (HH:MM:SS or seconds).
        #[arg(long, value_parser = parse_offset, value_name = "TIME")]
        crop_start: Option<Duration>,
        /// Trim the end at this offset (HH:MM:SS or seconds).
        #[arg(long, value_parser = parse_offset, value_name = "TIME")]
        crop_end: Option<Duration>,
    },

    /// Extract the numeric video id from an id or video URL.
    ParseId {
        /// Bare id or URL such as https://www.twitch.tv/videos/123.
        input: String,
    },
}

/// Parses `HH:MM:SS`, `MM:SS` or plain (fractional) seconds.
pub fn parse_offset(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let mut secs = 0f64;
    for part in s.split(':') {
        let v: f64 = part
            .trim()
            .parse()
            .map_err(|_| format!("invalid time '{}'", s))?;
        if !v.is_finite() || v < 0.0 {
            return Err(format!("invalid time '{}'", s));
        }
        secs = secs * 60.0 + v;
    }
    if s.split(':').count() > 3 {
        return Err(format!("invalid time '{}'", s));
    }
    Ok(Duration::from_millis((secs * 1000.0).round() as u64))
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Download(args) => {
                let cfg = config::load_or_init().context("load config")?;
                tracing::debug!("loaded config: {:?}", cfg);
                run_download(cfg, args).await?
            }
            CliCommand::Plan {
                manifest,
                crop_start,
                crop_end,
            } => run_plan(&manifest, crop_start, crop_end)?,
            CliCommand::ParseId { input } => run_parse_id(&input)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
