//! Encoder seam: joins downloaded segments and converts the joined stream
//! into the final container.

mod ffmpeg;
mod progress;

pub use ffmpeg::FfmpegEncoder;
pub use progress::{parse_time, parse_time_field};

use std::path::{Path, PathBuf};

use crate::crop::CropInfo;
use crate::error::EncoderError;
use crate::job::JobHandle;

/// Blocking encoder interface; the pipeline calls it from `spawn_blocking`.
pub trait Encoder: Send + Sync {
    /// Joins `files` in order into `output`.
    fn concatenate(
        &self,
        files: &[PathBuf],
        output: &Path,
        job: &dyn JobHandle,
    ) -> Result<(), EncoderError>;

    /// Converts `input` into `output`, applying the residual crop.
    fn convert(
        &self,
        input: &Path,
        output: &Path,
        crop: &CropInfo,
        job: &dyn JobHandle,
    ) -> Result<(), EncoderError>;
}
