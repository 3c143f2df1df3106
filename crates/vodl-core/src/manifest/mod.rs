//! Segment manifest model.
//!
//! A [`Playlist`] is the ordered list of media segments of one recording,
//! parsed from the platform's m3u8 text. Order is playback order and is
//! preserved by every mutation, so the local files can be concatenated in
//! sequence once downloaded.

mod parse;

pub use parse::url_prefix_of;

use std::path::{Path, PathBuf};

use crate::error::ManifestError;

/// One downloadable chunk of the recording.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// 1-based position in the original manifest.
    pub index: usize,
    pub remote_url: String,
    /// Staging path inside the job workspace; derived from `index` only.
    pub local_path: PathBuf,
    /// Declared duration in seconds.
    pub duration: f64,
}

impl Segment {
    /// Deterministic staging file name for a 1-based segment index.
    pub fn local_file_name(index: usize) -> String {
        format!("{:06}.ts", index)
    }
}

/// Ordered segment list of one recording.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Playlist {
    segments: Vec<Segment>,
}

impl Playlist {
    /// Parses `manifest` into segments staged under `workspace_dir`.
    /// Relative segment URLs are resolved against `url_prefix`.
    pub fn parse(
        workspace_dir: &Path,
        manifest: &str,
        url_prefix: &str,
    ) -> Result<Self, ManifestError> {
        let segments = parse::parse_segments(workspace_dir, manifest, url_prefix)?;
        Ok(Self { segments })
    }

    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.segments.iter()
    }

    /// Sum of declared segment durations in seconds.
    pub fn total_duration(&self) -> f64 {
        self.segments.iter().map(|s| s.duration).sum()
    }

    /// Local files in playback order, for concatenation.
    pub fn local_files(&self) -> Vec<PathBuf> {
        self.segments.iter().map(|s| s.local_path.clone()).collect()
    }

    /// Removes every segment whose manifest index is in `indices`; survivors
    /// keep their relative order.
    pub fn remove_indices(&mut self, indices: &[usize]) {
        if indices.is_empty() {
            return;
        }
        self.segments.retain(|s| !indices.contains(&s.index));
    }
}

impl<'a> IntoIterator for &'a Playlist {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

#[cfg(test)]
pub(crate) fn playlist_of(durations: &[f64]) -> Playlist {
    let segments = durations
        .iter()
        .enumerate()
        .map(|(i, d)| Segment {
            index: i + 1,
            remote_url: format!("https://cdn.example.com/{}.ts", i + 1),
            local_path: PathBuf::from("/tmp/ws").join(Segment::local_file_name(i + 1)),
            duration: *d,
        })
        .collect();
    Playlist::from_segments(segments)
}
