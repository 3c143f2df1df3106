//! ffmpeg-backed encoder.
//!
//! Concatenation appends the MPEG-TS segment files byte for byte. Conversion
//! remuxes the joined stream into the output container with stream copy,
//! cutting with `-ss`/`-t` when a crop is requested.

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::crop::CropInfo;
use crate::error::EncoderError;
use crate::job::JobHandle;

use super::progress::parse_time_field;
use super::Encoder;

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> EncoderError {
    let path = path.to_path_buf();
    move |source| EncoderError::Io { path, source }
}

/// Last stderr lines kept for the error message of a failed run.
const STDERR_TAIL: usize = 20;

#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    program: PathBuf,
}

impl FfmpegEncoder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Command-line arguments for converting `input` into `output`.
    pub fn convert_args(input: &Path, output: &Path, crop: &CropInfo) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-hide_banner".into(),
            "-y".into(),
            "-analyzeduration".into(),
            "2147483647".into(),
            "-probesize".into(),
            "2147483647".into(),
            "-i".into(),
            input.display().to_string(),
        ];
        if crop.crop_start {
            args.push("-ss".into());
            args.push(format!("{:.3}", crop.start));
        }
        if crop.crop_start || crop.crop_end {
            args.push("-t".into());
            args.push(format!("{:.3}", crop.length));
        }
        args.extend(
            ["-c:v", "copy", "-c:a", "copy", "-bsf:a", "aac_adtstoasc"]
                .iter()
                .map(|s| s.to_string()),
        );
        args.push(output.display().to_string());
        args
    }
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl Encoder for FfmpegEncoder {
    fn concatenate(
        &self,
        files: &[PathBuf],
        output: &Path,
        job: &dyn JobHandle,
    ) -> Result<(), EncoderError> {
        job.set_status("Merging Files");
        job.set_progress(0.0);
        job.append_log(&format!(
            "\n\nMerging {} video chunks into '{}'...",
            files.len(),
            output.display()
        ));

        let out = File::create(output).map_err(io_err(output))?;
        let mut writer = BufWriter::new(out);
        let total = files.len();
        for (done, file) in files.iter().enumerate() {
            let mut reader = File::open(file).map_err(io_err(file))?;
            io::copy(&mut reader, &mut writer).map_err(io_err(output))?;
            job.set_progress(crate::downloader::percentage(done + 1, total));
        }
        writer.flush().map_err(io_err(output))?;

        job.set_progress(100.0);
        job.append_log(" done!");
        tracing::debug!(files = total, output = %output.display(), "segments concatenated");
        Ok(())
    }

    fn convert(
        &self,
        input: &Path,
        output: &Path,
        crop: &CropInfo,
        job: &dyn JobHandle,
    ) -> Result<(), EncoderError> {
        job.set_status("Converting Video");
        job.set_progress(0.0);
        let known_length = crop.length > 0.0;
        job.set_indeterminate(!known_length);

        if output.exists() {
            fs::remove_file(output).map_err(io_err(output))?;
        }

        let args = Self::convert_args(input, output, crop);
        let program = self.program.display().to_string();
        job.append_log(&format!(
            "\n\nExecuting '{} {}'",
            program,
            args.join(" ")
        ));
        tracing::debug!(program = %program, ?args, "starting conversion");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| EncoderError::Spawn {
                program: program.clone(),
                source,
            })?;

        let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL);
        if let Some(stderr) = child.stderr.take() {
            // Progress lines are terminated by '\r', everything else by '\n'.
            for chunk in BufReader::new(stderr).split(b'\r') {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(_) => break,
                };
                for line in String::from_utf8_lossy(&chunk).lines() {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match parse_time_field(line) {
                        Some(secs) if known_length => {
                            job.set_progress(secs / crop.length * 100.0);
                        }
                        Some(_) => {}
                        None => job.append_log(&format!("\n{}", line)),
                    }
                    if tail.len() == STDERR_TAIL {
                        tail.pop_front();
                    }
                    tail.push_back(line.to_string());
                }
            }
        }

        let status = child.wait().map_err(|source| EncoderError::Spawn {
            program: program.clone(),
            source,
        })?;
        job.set_indeterminate(false);
        if !status.success() {
            return Err(EncoderError::Failed {
                status: status.to_string(),
                detail: tail.into_iter().collect::<Vec<_>>().join("\n"),
            });
        }

        job.set_progress(100.0);
        job.append_log("\n\nConversion complete!");
        Ok(())
    }
}
