//! # Passthrough MPEG-4 Muxer
//!
//! Writes compressed audio samples into a new `.m4a` container without
//! touching the payload. Codec parameters are carried over from the source
//! track; timestamps are expected already rebased to start at zero.

use crate::demux::{AudioCodec, TrackInfo};
use crate::error::{ExtractionError, Result};
use bytes::Bytes;
use mp4::{
    AacConfig, AudioObjectType, ChannelConfig, MediaConfig, Mp4Config, Mp4Sample, Mp4Writer,
    OpusConfig, SampleFreqIndex, TrackConfig, TrackType,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

/// MPEG-4 sampling frequency index table.
const SAMPLE_FREQUENCIES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

/// Destination track id; the output holds exactly one track.
const OUTPUT_TRACK_ID: u32 = 1;

/// Writer for the compressed-copy output path.
pub struct PassthroughMuxer {
    writer: Mp4Writer<BufWriter<File>>,
    timescale: u32,
}

impl PassthroughMuxer {
    /// Create (truncating) `path` and configure one audio track mirroring the
    /// source. Fails with [`ExtractionError::UnsupportedFormat`] for source
    /// codecs the MPEG-4 audio container cannot carry here (AAC and Opus are
    /// supported).
    pub fn create(path: &Path, track: &TrackInfo) -> Result<Self> {
        let media_conf = match track.codec {
            AudioCodec::Aac => MediaConfig::AacConfig(aac_config(track)?),
            AudioCodec::Opus => MediaConfig::OpusConfig(opus_config(track)?),
            other => {
                return Err(ExtractionError::UnsupportedFormat(format!(
                    "cannot passthrough-copy {:?} into an m4a container",
                    other
                )))
            }
        };

        let config = Mp4Config {
            major_brand: str::parse("isom").unwrap_or_default(),
            minor_version: 512,
            compatible_brands: vec![
                str::parse("isom").unwrap_or_default(),
                str::parse("iso2").unwrap_or_default(),
                str::parse("mp41").unwrap_or_default(),
            ],
            timescale: track.timescale,
        };

        let file = BufWriter::new(File::create(path)?);
        let mut writer = Mp4Writer::write_start(file, &config)
            .map_err(|e| ExtractionError::Muxing(format!("failed to start container: {}", e)))?;

        writer
            .add_track(&TrackConfig {
                track_type: TrackType::Audio,
                timescale: track.timescale,
                language: "und".to_string(),
                media_conf,
            })
            .map_err(|e| ExtractionError::Muxing(format!("failed to add track: {}", e)))?;

        debug!(codec = ?track.codec, timescale = track.timescale, "passthrough container opened");

        Ok(Self {
            writer,
            timescale: track.timescale,
        })
    }

    /// Write one compressed sample at its rebased timestamp.
    pub fn write_sample(&mut self, relative_pts_us: u64, duration_us: u64, data: &[u8]) -> Result<()> {
        let sample = Mp4Sample {
            start_time: self.us_to_ticks(relative_pts_us),
            duration: self.us_to_ticks(duration_us) as u32,
            rendering_offset: 0,
            is_sync: true,
            bytes: Bytes::copy_from_slice(data),
        };
        self.writer
            .write_sample(OUTPUT_TRACK_ID, &sample)
            .map_err(|e| ExtractionError::Muxing(format!("failed to write sample: {}", e)))
    }

    /// Write the container trailer.
    pub fn finalize(mut self) -> Result<()> {
        self.writer
            .write_end()
            .map_err(|e| ExtractionError::Muxing(format!("failed to finalize container: {}", e)))
    }

    fn us_to_ticks(&self, us: u64) -> u64 {
        us * u64::from(self.timescale) / 1_000_000
    }
}

fn aac_config(track: &TrackInfo) -> Result<AacConfig> {
    // Prefer the source's own AudioSpecificConfig; fall back to deriving the
    // fields from the track metadata.
    let parsed = track
        .extra_data
        .as_deref()
        .and_then(parse_audio_specific_config);
    let (profile, freq_index, chan_conf) = match parsed {
        Some(fields) => fields,
        None => (2, frequency_index(track.sample_rate)?, track.channels as u8),
    };

    Ok(AacConfig {
        bitrate: 0,
        profile: AudioObjectType::try_from(profile)
            .map_err(|e| ExtractionError::Muxing(format!("bad AAC profile: {}", e)))?,
        freq_index: SampleFreqIndex::try_from(freq_index)
            .map_err(|e| ExtractionError::Muxing(format!("bad frequency index: {}", e)))?,
        chan_conf: ChannelConfig::try_from(chan_conf)
            .map_err(|e| ExtractionError::Muxing(format!("bad channel config: {}", e)))?,
    })
}

fn opus_config(track: &TrackInfo) -> Result<OpusConfig> {
    Ok(OpusConfig {
        bitrate: 0,
        freq_index: SampleFreqIndex::try_from(frequency_index(track.sample_rate)?)
            .map_err(|e| ExtractionError::Muxing(format!("bad frequency index: {}", e)))?,
        chan_conf: ChannelConfig::try_from(track.channels as u8)
            .map_err(|e| ExtractionError::Muxing(format!("bad channel config: {}", e)))?,
        pre_skip: 0,
    })
}

/// First two bytes of an AudioSpecificConfig: 5 bits object type, 4 bits
/// frequency index, 4 bits channel configuration.
fn parse_audio_specific_config(asc: &[u8]) -> Option<(u8, u8, u8)> {
    if asc.len() < 2 {
        return None;
    }
    let profile = asc[0] >> 3;
    let freq_index = ((asc[0] & 0x07) << 1) | (asc[1] >> 7);
    let chan_conf = (asc[1] >> 3) & 0x0F;
    Some((profile, freq_index, chan_conf))
}

fn frequency_index(sample_rate: u32) -> Result<u8> {
    SAMPLE_FREQUENCIES
        .iter()
        .position(|&rate| rate == sample_rate)
        .map(|index| index as u8)
        .ok_or_else(|| {
            ExtractionError::UnsupportedFormat(format!(
                "sample rate {} has no MPEG-4 frequency index",
                sample_rate
            ))
        })
}
