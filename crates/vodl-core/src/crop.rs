//! Crop planning: trims a playlist to a time range of the original timeline.
//!
//! Whole segments outside the range are dropped before download; the
//! residual offset into the first kept segment and the target length are
//! handed to the encoder, which performs the exact cut.

use std::time::Duration;

use crate::manifest::Playlist;

/// User-requested trim, in offsets of the original (uncropped) timeline.
///
/// When `crop_end` is false, callers pass the full video length as `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CropSpec {
    pub crop_start: bool,
    pub crop_end: bool,
    pub start: Duration,
    pub end: Duration,
}

/// Encoder-facing result of [`plan`]. Seconds, rounded to milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropInfo {
    pub crop_start: bool,
    pub crop_end: bool,
    /// Offset into the first kept segment (0 unless `crop_start`).
    pub start: f64,
    pub length: f64,
}

/// Round to 3 decimals.
pub fn round_ms(secs: f64) -> f64 {
    (secs * 1000.0).round() / 1000.0
}

fn whole_millis(d: Duration) -> f64 {
    d.as_millis() as f64
}

/// Drops leading/trailing segments outside `spec` from `playlist` and returns
/// the residual offset and length for the encoder.
///
/// The end threshold is measured on the original timeline, independently of
/// the segments dropped at the head.
pub fn plan(playlist: &mut Playlist, spec: &CropSpec) -> CropInfo {
    let mut start = whole_millis(spec.start);
    let end = whole_millis(spec.end);
    let mut length = end;
    if spec.crop_start {
        length -= start;
    }

    start = round_ms(start / 1000.0);
    let end = round_ms(end / 1000.0);
    let length = round_ms(length.max(0.0) / 1000.0);

    let mut drop_head = Vec::new();
    let mut drop_tail = Vec::new();

    if spec.crop_start {
        let mut sum = 0.0;
        for segment in playlist.iter() {
            if sum + segment.duration < start {
                sum += segment.duration;
                drop_head.push(segment.index);
            } else {
                start = round_ms(start - sum);
                break;
            }
        }
    }

    if spec.crop_end {
        let mut sum = 0.0;
        for segment in playlist.iter() {
            if sum >= end {
                drop_tail.push(segment.index);
            }
            sum += segment.duration;
        }
    }

    playlist.remove_indices(&drop_head);
    playlist.remove_indices(&drop_tail);

    CropInfo {
        crop_start: spec.crop_start,
        crop_end: spec.crop_end,
        start: if spec.crop_start { start } else { 0.0 },
        length,
    }
}
