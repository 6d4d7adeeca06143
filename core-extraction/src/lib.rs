//! # Audio Extraction Engine
//!
//! Extracts the audio track of a local video file into a standalone audio
//! file, trimmed to a requested time range and optionally gain-adjusted.
//!
//! ## Overview
//!
//! Two output strategies share one pipeline skeleton:
//! - **Passthrough copy** (`m4a`): compressed samples are re-containerized
//!   without decoding, timestamps rebased to start at zero.
//! - **Decode to PCM** (`wav`): samples are decoded, optionally gain-scaled,
//!   and streamed into a canonical 44-byte-header WAV file.
//!
//! The pipeline runs as a single sequential control flow inside one async
//! worker, polls a `CancellationToken` every iteration, and reports progress
//! through the host-injected [`EventSink`](core_runtime::EventSink).

pub mod config;
pub mod decoder;
pub mod demux;
pub mod error;
pub mod gain;
pub mod pipeline;
pub mod progress;
pub mod request;
pub mod trim;
pub mod writer;

pub use config::PipelineConfig;
pub use demux::{AudioCodec, CompressedSample, MediaDemuxer, TrackInfo};
pub use error::{ExtractionError, Result};
pub use pipeline::ExtractionPipeline;
pub use request::{ExtractionRequest, OutputFormat};
