//! # Feed/Drain PCM Decoder

use crate::decoder::SampleConverter;
use crate::demux::{CompressedSample, MediaDemuxer};
use crate::error::{ExtractionError, Result};
use std::collections::VecDeque;
use symphonia::core::codecs::{Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use tracing::{debug, warn};

const MAX_CONSECUTIVE_DECODE_ERRORS: usize = 10;

/// One decoded frame of interleaved little-endian 16-bit PCM.
pub struct PcmFrame {
    pub data: Vec<u8>,
    /// Presentation timestamp on the source track's clock, microseconds.
    pub pts_us: u64,
}

impl PcmFrame {
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }
}

/// Decoder for the selected track, driven through a feed/drain loop.
///
/// Decoded frames queue between the two sides; the feed side reports no free
/// input slot while the queue is at capacity, bounding memory held by one
/// in-flight extraction. Corrupt packets are skipped until
/// [`MAX_CONSECUTIVE_DECODE_ERRORS`] in a row, then surface as
/// [`ExtractionError::DecoderError`].
pub struct PcmDecoder {
    decoder: Box<dyn Decoder>,
    pending: VecDeque<PcmFrame>,
    max_pending: usize,
    consecutive_errors: usize,
    eos_fed: bool,
}

impl PcmDecoder {
    /// Create a decoder for the demuxer's selected track.
    pub fn new(demuxer: &MediaDemuxer, max_pending: usize) -> Result<Self> {
        let decoder = symphonia::default::get_codecs()
            .make(demuxer.codec_params(), &DecoderOptions::default())
            .map_err(|e| {
                ExtractionError::UnsupportedFormat(format!(
                    "no decoder for source codec: {}",
                    e
                ))
            })?;

        Ok(Self {
            decoder,
            pending: VecDeque::new(),
            max_pending,
            consecutive_errors: 0,
            eos_fed: false,
        })
    }

    /// Whether `feed` may be called right now.
    pub fn has_input_slot(&self) -> bool {
        !self.eos_fed && self.pending.len() < self.max_pending
    }

    /// Decode one compressed sample, queueing any produced PCM.
    pub fn feed(&mut self, sample: CompressedSample) -> Result<()> {
        debug_assert!(self.has_input_slot());

        match self.decoder.decode(&sample.packet) {
            Ok(decoded) => {
                self.consecutive_errors = 0;
                if decoded.frames() > 0 {
                    let samples = SampleConverter::to_interleaved_i16(&decoded);
                    self.pending.push_back(PcmFrame {
                        data: SampleConverter::to_le_bytes(&samples),
                        pts_us: sample.pts_us,
                    });
                }
                Ok(())
            }
            Err(SymphoniaError::DecodeError(e)) => {
                // Corrupt packet; skip it unless the stream looks hopeless.
                self.consecutive_errors += 1;
                warn!(
                    attempt = self.consecutive_errors,
                    max = MAX_CONSECUTIVE_DECODE_ERRORS,
                    "skipping undecodable sample: {}",
                    e
                );
                if self.consecutive_errors >= MAX_CONSECUTIVE_DECODE_ERRORS {
                    return Err(ExtractionError::DecoderError(format!(
                        "decoder failed on {} consecutive samples: {}",
                        MAX_CONSECUTIVE_DECODE_ERRORS, e
                    )));
                }
                Ok(())
            }
            Err(SymphoniaError::IoError(e)) => Err(ExtractionError::IoError(e)),
            Err(e) => Err(ExtractionError::DecoderError(e.to_string())),
        }
    }

    /// Close the feed side without feeding more data. Idempotent.
    pub fn signal_end_of_stream(&mut self) {
        if !self.eos_fed {
            debug!("end of stream signalled to decoder");
            let _ = self.decoder.finalize();
            self.eos_fed = true;
        }
    }

    /// Drain the next queued PCM frame, if any.
    pub fn next_frame(&mut self) -> Option<PcmFrame> {
        self.pending.pop_front()
    }

    /// `true` once end-of-stream has been both fed and drained.
    pub fn is_drained(&self) -> bool {
        self.eos_fed && self.pending.is_empty()
    }

    /// Discard queued output and reset codec state. Required after a demuxer
    /// seek.
    pub fn reset(&mut self) {
        self.decoder.reset();
        self.pending.clear();
        self.consecutive_errors = 0;
    }
}
