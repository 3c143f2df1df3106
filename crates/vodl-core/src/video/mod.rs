//! Video metadata model: descriptor, qualities, credentials.
//!
//! A [`VideoDescriptor`] is produced by a metadata collaborator before a job
//! is built and never changes afterwards. The engine only needs it to derive
//! per-quality playlist URLs and to label logs.

mod auth;
mod id;
mod quality;

pub use auth::VodAuthInfo;
pub use id::parse_video_id;
pub use quality::{Quality, AUDIO_ONLY_QUALITY_ID, SOURCE_QUALITY_ID};

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ValidationError;

const UNTITLED_BROADCAST: &str = "Untitled Broadcast";
const UNKNOWN_GAME: &str = "Unknown";

/// Broadcast kind; highlights use a different playlist file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastKind {
    Archive,
    Highlight,
    Upload,
}

impl FromStr for BroadcastKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "archive" => Ok(BroadcastKind::Archive),
            "highlight" => Ok(BroadcastKind::Highlight),
            "upload" => Ok(BroadcastKind::Upload),
            other => Err(ValidationError::new(format!(
                "unsupported broadcast type '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for BroadcastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BroadcastKind::Archive => "archive",
            BroadcastKind::Highlight => "highlight",
            BroadcastKind::Upload => "upload",
        };
        f.write_str(s)
    }
}

/// Fields accepted by [`VideoDescriptor::new`]. Optional values fall back to
/// placeholders.
#[derive(Debug, Clone)]
pub struct VideoFields {
    pub channel: String,
    pub title: Option<String>,
    pub id: String,
    pub kind: BroadcastKind,
    pub playlist_base: String,
    pub game: Option<String>,
    pub qualities: Vec<Quality>,
    pub views: u64,
    pub length: Duration,
    /// Seconds since the Unix epoch.
    pub recorded_at: i64,
    pub thumbnail: Option<String>,
    pub sub_only: bool,
}

/// Immutable description of one recording.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoDescriptor {
    channel: String,
    title: String,
    id: String,
    kind: BroadcastKind,
    playlist_base: String,
    game: String,
    qualities: Vec<Quality>,
    views: u64,
    length: Duration,
    recorded_at: i64,
    thumbnail: Option<String>,
    sub_only: bool,
}

impl VideoDescriptor {
    pub fn new(fields: VideoFields) -> Result<Self, ValidationError> {
        if fields.channel.trim().is_empty() {
            return Err(ValidationError::new("channel is required"));
        }
        if fields.id.trim().is_empty() {
            return Err(ValidationError::new("video id is required"));
        }
        if fields.playlist_base.trim().is_empty() {
            return Err(ValidationError::new("playlist base url is required"));
        }

        let title = fields
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| UNTITLED_BROADCAST.to_string());
        let game = fields
            .game
            .filter(|g| !g.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_GAME.to_string());
        let qualities = if fields.qualities.is_empty() {
            vec![Quality::source()]
        } else {
            fields.qualities
        };

        Ok(Self {
            channel: fields.channel,
            title,
            id: fields.id,
            kind: fields.kind,
            playlist_base: fields.playlist_base.trim_end_matches('/').to_string(),
            game,
            qualities,
            views: fields.views,
            length: fields.length,
            recorded_at: fields.recorded_at,
            thumbnail: fields.thumbnail,
            sub_only: fields.sub_only,
        })
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> BroadcastKind {
        self.kind
    }

    pub fn game(&self) -> &str {
        &self.game
    }

    pub fn qualities(&self) -> &[Quality] {
        &self.qualities
    }

    pub fn best_quality(&self) -> Option<&Quality> {
        self.qualities.first()
    }

    pub fn views(&self) -> u64 {
        self.views
    }

    pub fn length(&self) -> Duration {
        self.length
    }

    pub fn recorded_at(&self) -> i64 {
        self.recorded_at
    }

    pub fn thumbnail(&self) -> Option<&str> {
        self.thumbnail.as_deref()
    }

    pub fn is_sub_only(&self) -> bool {
        self.sub_only
    }

    /// Page URL of the video on the platform.
    pub fn page_url(&self) -> String {
        format!("https://www.twitch.tv/videos/{}", self.id)
    }

    /// Manifest URL for one quality.
    pub fn playlist_url(&self, quality: &Quality) -> String {
        match self.kind {
            BroadcastKind::Highlight => format!(
                "{}/{}/highlight-{}.m3u8",
                self.playlist_base,
                quality.id(),
                self.id
            ),
            BroadcastKind::Archive | BroadcastKind::Upload => {
                format!("{}/{}/index-dvr.m3u8", self.playlist_base, quality.id())
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_fields() -> VideoFields {
    VideoFields {
        channel: "somechannel".into(),
        title: Some("Speedrun".into()),
        id: "123456".into(),
        kind: BroadcastKind::Archive,
        playlist_base: "https://cdn.example.com/abc_somechannel_1".into(),
        game: None,
        qualities: vec![Quality::source(), Quality::new("720p60")],
        views: 10,
        length: Duration::from_secs(3600),
        recorded_at: 1_600_000_000,
        thumbnail: None,
        sub_only: false,
    }
}
