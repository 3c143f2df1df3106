//! Line-oriented m3u8 parsing.

use std::path::Path;

use super::Segment;
use crate::error::ManifestError;

const EXTINF: &str = "#EXTINF:";

/// Everything up to and including the last `/` of `playlist_url`; relative
/// segment URLs are resolved against it.
pub fn url_prefix_of(playlist_url: &str) -> &str {
    match playlist_url.rfind('/') {
        Some(pos) => &playlist_url[..=pos],
        None => "",
    }
}

pub(super) fn parse_segments(
    workspace_dir: &Path,
    manifest: &str,
    url_prefix: &str,
) -> Result<Vec<Segment>, ManifestError> {
    if manifest.trim().is_empty() {
        return Err(ManifestError::Empty);
    }

    let mut segments = Vec::new();
    let mut pending_duration: Option<f64> = None;

    for (line_no, line) in manifest.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix(EXTINF) {
            pending_duration = Some(parse_duration(rest, line_no + 1)?);
            continue;
        }
        if line.starts_with('#') {
            continue;
        }

        let index = segments.len() + 1;
        segments.push(Segment {
            index,
            remote_url: resolve_url(url_prefix, line)?,
            local_path: workspace_dir.join(Segment::local_file_name(index)),
            duration: pending_duration.take().unwrap_or(0.0),
        });
    }

    if segments.is_empty() {
        return Err(ManifestError::NoSegments);
    }
    Ok(segments)
}

/// `#EXTINF:<duration>[,<title>]`
fn parse_duration(rest: &str, line: usize) -> Result<f64, ManifestError> {
    let value = rest.split(',').next().unwrap_or("").trim();
    value
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| ManifestError::InvalidDuration {
            line,
            value: value.to_string(),
        })
}

fn resolve_url(url_prefix: &str, line: &str) -> Result<String, ManifestError> {
    if line.starts_with("http://") || line.starts_with("https://") {
        return Ok(line.to_string());
    }
    if url_prefix.is_empty() {
        return Ok(line.to_string());
    }
    let base = url::Url::parse(url_prefix).map_err(|e| ManifestError::InvalidUrl {
        url: url_prefix.to_string(),
        reason: e.to_string(),
    })?;
    base.join(line)
        .map(|u| u.to_string())
        .map_err(|e| ManifestError::InvalidUrl {
            url: line.to_string(),
            reason: e.to_string(),
        })
}
