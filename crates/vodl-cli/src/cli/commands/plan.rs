//! `vodl plan` – dry-run the crop planner on a local manifest.

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;
use vodl_core::crop::{self, CropSpec};
use vodl_core::manifest::Playlist;

pub fn run_plan(
    manifest: &Path,
    crop_start: Option<Duration>,
    crop_end: Option<Duration>,
) -> Result<()> {
    let text = std::fs::read_to_string(manifest)
        .with_context(|| format!("read manifest {}", manifest.display()))?;
    let mut playlist = Playlist::parse(Path::new("."), &text, "")
        .with_context(|| format!("parse manifest {}", manifest.display()))?;
    let total = playlist.len();
    let full_length = Duration::from_secs_f64(playlist.total_duration());

    let spec = CropSpec {
        crop_start: crop_start.is_some(),
        crop_end: crop_end.is_some(),
        start: crop_start.unwrap_or_default(),
        end: crop_end.unwrap_or(full_length),
    };
    let info = crop::plan(&mut playlist, &spec);

    println!("segments: {} of {} kept", playlist.len(), total);
    if let (Some(first), Some(last)) = (playlist.segments().first(), playlist.segments().last()) {
        println!("range:    #{} .. #{}", first.index, last.index);
    }
    println!("offset:   {:.3}s", info.start);
    println!("length:   {:.3}s", info.length);
    Ok(())
}
