use std::path::PathBuf;

use crate::crop::CropSpec;
use crate::error::ValidationError;
use crate::video::{Quality, VideoDescriptor, VodAuthInfo};

/// Immutable parameters of one download.
#[derive(Debug, Clone)]
pub struct DownloadParams {
    pub video: VideoDescriptor,
    pub quality: Quality,
    /// Destination media file.
    pub output: PathBuf,
    pub crop: CropSpec,
    /// Skip the conversion step; the concatenated stream is the output.
    pub disable_conversion: bool,
    pub auth: VodAuthInfo,
}

impl DownloadParams {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let has_name = self
            .output
            .file_name()
            .map(|n| !n.to_string_lossy().trim().is_empty())
            .unwrap_or(false);
        if !has_name {
            return Err(ValidationError::new("output file name is required"));
        }
        if self.quality.id().trim().is_empty() {
            return Err(ValidationError::new("quality is required"));
        }
        // `end` is the video length when crop-end is off.
        if self.crop.crop_start && self.crop.start >= self.crop.end {
            return Err(ValidationError::new(
                "crop start must be before crop end and the video end",
            ));
        }
        if self.crop.crop_end && self.crop.end.is_zero() {
            return Err(ValidationError::new("crop end must be after the video start"));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn sample_params() -> DownloadParams {
    let video = VideoDescriptor::new(crate::video::sample_fields()).unwrap();
    DownloadParams {
        crop: CropSpec {
            end: video.length(),
            ..Default::default()
        },
        video,
        quality: Quality::source(),
        output: PathBuf::from("/tmp/out/video.mp4"),
        disable_conversion: false,
        auth: VodAuthInfo::anonymous(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn sample_is_valid() {
        assert!(sample_params().validate().is_ok());
    }

    #[test]
    fn rejects_missing_output_name() {
        let mut p = sample_params();
        p.output = PathBuf::from("/");
        assert!(p.validate().is_err());
    }

    #[test]
    fn rejects_inverted_crop() {
        let mut p = sample_params();
        p.crop = CropSpec {
            crop_start: true,
            crop_end: true,
            start: Duration::from_secs(60),
            end: Duration::from_secs(30),
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn rejects_crop_start_past_video_length() {
        let mut p = sample_params();
        p.crop = CropSpec {
            crop_start: true,
            crop_end: false,
            start: Duration::from_secs(50),
            end: Duration::from_secs(30),
        };
        assert!(p.validate().is_err());
        p.crop.start = Duration::from_secs(30);
        assert!(p.validate().is_err());
        p.crop.start = Duration::from_secs(29);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn rejects_crop_end_at_zero() {
        let mut p = sample_params();
        p.crop = CropSpec {
            crop_end: true,
            end: Duration::ZERO,
            ..Default::default()
        };
        assert!(p.validate().is_err());
    }
}
