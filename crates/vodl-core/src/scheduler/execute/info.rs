//! Header written to the job log before any work starts.

use std::path::Path;
use std::time::Duration;

use crate::config::VodlConfig;
use crate::job::{DownloadParams, JobHandle};

const RULE: &str = "\n--------------------------------------------------------------------------------";

/// `HH:MM:SS`, hours not wrapped at a day.
pub(super) fn format_clock(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

pub(super) fn write_download_info(
    job: &dyn JobHandle,
    params: &DownloadParams,
    config: &VodlConfig,
    workspace: &Path,
) {
    let crop = &params.crop;
    let crop_line = |on: bool, at: Duration| {
        if on {
            format!("Yes ({})", format_clock(at))
        } else {
            "No".to_string()
        }
    };
    let auth = &params.auth;

    let lines = [
        "\n\nVOD INFO".to_string(),
        RULE.to_string(),
        format!("\nVOD ID: {}", params.video.id()),
        format!("\nSelected Quality: {}", params.quality.display_string()),
        format!("\nDownload Url: {}", params.video.page_url()),
        format!("\nCrop Start: {}", crop_line(crop.crop_start, crop.start)),
        format!("\nCrop End: {}", crop_line(crop.crop_end, crop.end)),
        "\n\nOUTPUT INFO".to_string(),
        RULE.to_string(),
        format!("\nDisable Conversion: {}", yes_no(params.disable_conversion)),
        format!("\nOutput File: {}", params.output.display()),
        format!("\nFFMPEG Path: {}", config.ffmpeg_path),
        format!("\nTemporary Download Folder: {}", workspace.display()),
        "\n\nACCESS INFO".to_string(),
        RULE.to_string(),
        format!("\nSub-Only: {}", yes_no(auth.sub_only)),
        format!("\nPrivileged: {}", yes_no(auth.privileged)),
    ];
    for line in &lines {
        job.append_log(line);
    }
}
