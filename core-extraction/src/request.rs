//! # Extraction Request
//!
//! The validated request structure the pipeline operates on. Hosts parse
//! their untyped option maps into this type at the boundary; everything the
//! pipeline needs is typed and range-checked before any I/O starts.

use crate::error::{ExtractionError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const MICROS_PER_SEC: f64 = 1_000_000.0;

/// Requested output representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Compressed passthrough copy into an MPEG-4 audio container.
    #[default]
    M4a,
    /// Decoded linear PCM written as a WAV file.
    Wav,
}

/// A single audio-extraction request.
///
/// Field names and defaults follow the external contract: `start`, `duration`
/// and `volume` default to `0`, `0` (through end of track) and `1.0`;
/// `sampleRate`/`channels` override the output header on the WAV path only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExtractionRequest {
    /// Source video file.
    pub video: PathBuf,

    /// Destination audio file, overwritten if present.
    pub output: PathBuf,

    #[serde(default)]
    pub format: OutputFormat,

    /// Seconds from the start of the video to begin extraction.
    #[serde(default)]
    pub start: f64,

    /// Seconds of audio to export; `0` exports through the end of the track.
    #[serde(default)]
    pub duration: f64,

    /// Linear gain applied to PCM samples.
    #[serde(default = "default_volume")]
    pub volume: f32,

    /// Sample rate written into the WAV header instead of the source's.
    #[serde(default)]
    pub sample_rate: Option<u32>,

    /// Channel count written into the WAV header instead of the source's.
    #[serde(default)]
    pub channels: Option<u16>,
}

fn default_volume() -> f32 {
    1.0
}

impl ExtractionRequest {
    /// Minimal request with all optional fields at their defaults.
    pub fn new(video: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            video: video.into(),
            output: output.into(),
            format: OutputFormat::default(),
            start: 0.0,
            duration: 0.0,
            volume: default_volume(),
            sample_rate: None,
            channels: None,
        }
    }

    /// Requested start offset in microseconds.
    pub fn start_us(&self) -> u64 {
        (self.start * MICROS_PER_SEC) as u64
    }

    /// Requested duration in microseconds; `0` means through end of track.
    pub fn duration_us(&self) -> u64 {
        (self.duration * MICROS_PER_SEC) as u64
    }

    /// Range-check every field. Called before the pipeline opens any file.
    pub fn validate(&self) -> Result<()> {
        if self.video.as_os_str().is_empty() {
            return Err(ExtractionError::InvalidArgument(
                "video path is empty".to_string(),
            ));
        }
        if self.output.as_os_str().is_empty() {
            return Err(ExtractionError::InvalidArgument(
                "output path is empty".to_string(),
            ));
        }
        if !self.start.is_finite() || self.start < 0.0 {
            return Err(ExtractionError::InvalidArgument(format!(
                "start must be a non-negative number of seconds, got {}",
                self.start
            )));
        }
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(ExtractionError::InvalidArgument(format!(
                "duration must be a non-negative number of seconds, got {}",
                self.duration
            )));
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(ExtractionError::InvalidArgument(format!(
                "volume must be a non-negative gain factor, got {}",
                self.volume
            )));
        }
        if self.sample_rate == Some(0) {
            return Err(ExtractionError::InvalidArgument(
                "sampleRate override must be positive".to_string(),
            ));
        }
        if self.channels == Some(0) {
            return Err(ExtractionError::InvalidArgument(
                "channels override must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
