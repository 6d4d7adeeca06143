//! # Container Demuxing
//!
//! Track selection and sequential compressed-sample reading over a local
//! media file. [`MediaDemuxer`] probes the container, selects the first audio
//! track, and yields [`CompressedSample`]s in decode order with timestamps
//! converted to microseconds on the track's own clock.

use crate::error::{ExtractionError, Result};
use std::fs::File;
use std::path::Path;
use symphonia::core::codecs::{CodecParameters, CodecType, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, Packet, SeekMode, SeekTo};
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::units::{Time, TimeBase};
use tracing::{debug, info};

// ============================================================================
// Track Metadata
// ============================================================================

/// Audio codec family of the selected track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCodec {
    Aac,
    Opus,
    Mp3,
    Flac,
    Vorbis,
    Alac,
    Pcm,
    Unknown,
}

impl AudioCodec {
    fn from_codec_type(codec_type: CodecType) -> Self {
        use symphonia::core::codecs::*;

        if codec_type == CODEC_TYPE_AAC {
            AudioCodec::Aac
        } else if codec_type == CODEC_TYPE_OPUS {
            AudioCodec::Opus
        } else if codec_type == CODEC_TYPE_MP3 {
            AudioCodec::Mp3
        } else if codec_type == CODEC_TYPE_FLAC {
            AudioCodec::Flac
        } else if codec_type == CODEC_TYPE_VORBIS {
            AudioCodec::Vorbis
        } else if codec_type == CODEC_TYPE_ALAC {
            AudioCodec::Alac
        } else if codec_type == CODEC_TYPE_PCM_S16LE
            || codec_type == CODEC_TYPE_PCM_S16BE
            || codec_type == CODEC_TYPE_PCM_S24LE
            || codec_type == CODEC_TYPE_PCM_S24BE
            || codec_type == CODEC_TYPE_PCM_S32LE
            || codec_type == CODEC_TYPE_PCM_S32BE
            || codec_type == CODEC_TYPE_PCM_U8
            || codec_type == CODEC_TYPE_PCM_F32LE
            || codec_type == CODEC_TYPE_PCM_F64LE
        {
            AudioCodec::Pcm
        } else {
            AudioCodec::Unknown
        }
    }
}

/// Immutable metadata of the selected audio track.
#[derive(Debug, Clone)]
pub struct TrackInfo {
    /// Position of the track in the container's track list.
    pub index: usize,
    pub codec: AudioCodec,
    pub sample_rate: u32,
    pub channels: u16,
    /// Total track duration in microseconds; `0` when the container does not
    /// declare it.
    pub duration_us: u64,
    /// Clock rate of the track, carried into passthrough output.
    pub timescale: u32,
    /// Decoder-specific configuration (e.g. the AAC AudioSpecificConfig).
    pub extra_data: Option<Box<[u8]>>,
}

/// One compressed sample read from the container.
pub struct CompressedSample {
    /// Presentation timestamp on the container's own clock, microseconds.
    pub pts_us: u64,
    pub duration_us: u64,
    /// Whether the sample is a sync sample. Always `true` for audio.
    pub keyframe: bool,
    /// The underlying demuxed packet, consumed whole by the decoder.
    pub(crate) packet: Packet,
}

impl CompressedSample {
    /// Raw compressed payload.
    pub fn data(&self) -> &[u8] {
        self.packet.buf()
    }
}

// ============================================================================
// Demuxer
// ============================================================================

/// Sequential reader over one audio track of a media container.
pub struct MediaDemuxer {
    format: Box<dyn FormatReader>,
    track_id: u32,
    time_base: TimeBase,
    info: TrackInfo,
    codec_params: CodecParameters,
}

impl MediaDemuxer {
    /// Open `path`, probe the container, and select the first audio track.
    ///
    /// Tracks are scanned in index order; the first with a decodable audio
    /// codec wins. Fails with [`ExtractionError::TrackNotFound`] when the
    /// container has no such track.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let source = Box::new(file) as Box<dyn MediaSource>;
        let stream = MediaSourceStream::new(source, Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
            hint.with_extension(extension);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                stream,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| {
                ExtractionError::UnsupportedFormat(format!(
                    "failed to probe {}: {}",
                    path.display(),
                    e
                ))
            })?;

        let format = probed.format;

        let (index, track) = format
            .tracks()
            .iter()
            .enumerate()
            .find(|(_, t)| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(ExtractionError::TrackNotFound)?;

        let track_id = track.id;
        let params = track.codec_params.clone();

        let sample_rate = params.sample_rate.ok_or_else(|| {
            ExtractionError::UnsupportedFormat("source track is missing a sample rate".to_string())
        })?;
        let channels = params
            .channels
            .map(|ch| ch.count() as u16)
            .unwrap_or(2);

        let time_base = params.time_base.unwrap_or(TimeBase::new(1, sample_rate));
        let duration_us = params
            .n_frames
            .map(|frames| time_to_us(time_base.calc_time(frames)))
            .unwrap_or(0);
        let timescale = if time_base.numer == 1 {
            time_base.denom
        } else {
            sample_rate
        };

        let info = TrackInfo {
            index,
            codec: AudioCodec::from_codec_type(params.codec),
            sample_rate,
            channels,
            duration_us,
            timescale,
            extra_data: params.extra_data.clone(),
        };

        info!(
            track = index,
            codec = ?info.codec,
            sample_rate,
            channels,
            duration_us,
            "selected audio track"
        );

        Ok(Self {
            format,
            track_id,
            time_base,
            info,
            codec_params: params,
        })
    }

    /// Metadata of the selected track.
    pub fn track(&self) -> &TrackInfo {
        &self.info
    }

    pub(crate) fn codec_params(&self) -> &CodecParameters {
        &self.codec_params
    }

    /// Position the read cursor at the nearest sync sample at or before
    /// `ts_us`, never after, so no data at the boundary is lost. Returns the
    /// timestamp actually landed on. Callers driving a decoder must reset it
    /// after seeking.
    pub fn seek(&mut self, ts_us: u64) -> Result<u64> {
        let seconds = ts_us as f64 / 1_000_000.0;
        let seeked = self
            .format
            .seek(
                SeekMode::Coarse,
                SeekTo::Time {
                    time: Time::from(seconds),
                    track_id: Some(self.track_id),
                },
            )
            .map_err(|e| map_format_error(e, "seek"))?;

        let landed_us = time_to_us(self.time_base.calc_time(seeked.actual_ts));
        debug!(requested_us = ts_us, landed_us, "seeked to sync sample");
        Ok(landed_us)
    }

    /// Read the next compressed sample of the selected track, advancing the
    /// cursor. Returns `None` at end of stream.
    pub fn next_sample(&mut self) -> Result<Option<CompressedSample>> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    debug!("end of stream");
                    return Ok(None);
                }
                Err(e) => return Err(map_format_error(e, "read sample")),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            return Ok(Some(CompressedSample {
                pts_us: time_to_us(self.time_base.calc_time(packet.ts())),
                duration_us: time_to_us(self.time_base.calc_time(packet.dur())),
                keyframe: true,
                packet,
            }));
        }
    }
}

fn time_to_us(time: Time) -> u64 {
    time.seconds * 1_000_000 + (time.frac * 1_000_000.0) as u64
}

fn map_format_error(error: SymphoniaError, context: &str) -> ExtractionError {
    match error {
        SymphoniaError::IoError(e) => ExtractionError::IoError(e),
        SymphoniaError::ResetRequired => {
            ExtractionError::DecoderError(format!("{}: track list changed mid-stream", context))
        }
        other => ExtractionError::DecoderError(format!("{}: {}", context, other)),
    }
}
