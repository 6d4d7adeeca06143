//! # Sample Format Converter
//!
//! Normalizes decoded audio to interleaved 16-bit samples.

use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::conv::FromSample;
use symphonia::core::sample::Sample;

/// Converter from any decoded buffer layout to interleaved i16.
///
/// Codecs output audio in various formats (i16, i24, i32, f32, f64) and in
/// planar layout. This converter normalizes everything to interleaved
/// (LRLRLR... for stereo) 16-bit samples, the representation the WAV output
/// and the gain stage operate on.
pub struct SampleConverter;

impl SampleConverter {
    /// Convert a decoded buffer to interleaved i16 samples.
    pub fn to_interleaved_i16(buffer: &AudioBufferRef<'_>) -> Vec<i16> {
        match buffer {
            AudioBufferRef::U8(buf) => Self::convert_and_interleave(&**buf),
            AudioBufferRef::U16(buf) => Self::convert_and_interleave(&**buf),
            AudioBufferRef::U24(buf) => Self::convert_and_interleave(&**buf),
            AudioBufferRef::U32(buf) => Self::convert_and_interleave(&**buf),
            AudioBufferRef::S8(buf) => Self::convert_and_interleave(&**buf),
            AudioBufferRef::S16(buf) => Self::convert_and_interleave(&**buf),
            AudioBufferRef::S24(buf) => Self::convert_and_interleave(&**buf),
            AudioBufferRef::S32(buf) => Self::convert_and_interleave(&**buf),
            AudioBufferRef::F32(buf) => Self::convert_and_interleave(&**buf),
            AudioBufferRef::F64(buf) => Self::convert_and_interleave(&**buf),
        }
    }

    /// Interleaved little-endian byte form of `samples`.
    pub fn to_le_bytes(samples: &[i16]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(samples.len() * 2);
        for sample in samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        bytes
    }

    fn convert_and_interleave<S>(buf: &AudioBuffer<S>) -> Vec<i16>
    where
        S: Sample,
        i16: FromSample<S>,
    {
        let channels = buf.spec().channels.count();
        let frames = buf.frames();
        let mut interleaved = Vec::with_capacity(frames * channels);

        for frame in 0..frames {
            for channel in 0..channels {
                interleaved.push(i16::from_sample(buf.chan(channel)[frame]));
            }
        }

        interleaved
    }
}
