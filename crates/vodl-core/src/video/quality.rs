//! Playback quality identifiers as used in the platform's playlist paths.

use std::fmt;

/// Sentinel id of the original (source) rendition.
pub const SOURCE_QUALITY_ID: &str = "chunked";
pub const AUDIO_ONLY_QUALITY_ID: &str = "audio_only";

/// One available rendition of a video. Lists of qualities are ordered best first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Quality {
    id: String,
}

impl Quality {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn source() -> Self {
        Self::new(SOURCE_QUALITY_ID)
    }

    /// Playlist path component, e.g. `chunked` or `720p60`.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_source(&self) -> bool {
        self.id == SOURCE_QUALITY_ID
    }

    /// Human readable label: `Source`, `Audio Only`, `720p`, `1080p60`.
    ///
    /// 30 fps renditions drop the frame rate suffix.
    pub fn display_string(&self) -> String {
        match self.id.as_str() {
            SOURCE_QUALITY_ID => "Source".to_string(),
            AUDIO_ONLY_QUALITY_ID => "Audio Only".to_string(),
            other => match other.split_once('p') {
                Some((res, "30")) if !res.is_empty() => format!("{}p", res),
                _ => other.to_string(),
            },
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_string())
    }
}
