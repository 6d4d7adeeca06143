//! # Extraction Error Types

use thiserror::Error;

/// Errors that can occur while extracting audio.
#[derive(Error, Debug)]
pub enum ExtractionError {
    // ========================================================================
    // Request Errors
    // ========================================================================
    /// Request field is missing, malformed, or out of range. Resolved before
    /// any I/O happens.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ========================================================================
    // Source Errors
    // ========================================================================
    /// The source container holds no audio track.
    #[error("No audio track found in source")]
    TrackNotFound,

    /// The requested output kind is not supported for the source codec, or
    /// the source container cannot be read at all.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    // ========================================================================
    // Pipeline Errors
    // ========================================================================
    /// Codec failure mid-stream.
    #[error("Decoder error: {0}")]
    DecoderError(String),

    /// Output container could not be written.
    #[error("Muxing error: {0}")]
    Muxing(String),

    /// File open/read/write/seek failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    // ========================================================================
    // Terminal Outcomes
    // ========================================================================
    /// The caller cancelled the task. Not a failure: never surfaced through
    /// the error sink.
    #[error("Extraction cancelled")]
    Cancelled,

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExtractionError {
    /// Returns `true` for the cooperative-cancellation outcome.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ExtractionError::Cancelled)
    }

    /// Returns `true` if the error was resolved before the pipeline touched
    /// the source or output files.
    pub fn is_request_error(&self) -> bool {
        matches!(self, ExtractionError::InvalidArgument(_))
    }
}

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;
