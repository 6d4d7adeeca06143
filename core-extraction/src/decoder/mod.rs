//! # Audio Decoding
//!
//! Converts compressed samples into 16-bit interleaved PCM through a
//! feed/drain loop: [`PcmDecoder::feed`] pushes one compressed sample through
//! the codec, queued output is pulled with [`PcmDecoder::next_frame`], and
//! [`PcmDecoder::signal_end_of_stream`] closes the feed side without feeding
//! further data.

mod pcm;
mod sample_converter;

pub use pcm::{PcmDecoder, PcmFrame};
pub use sample_converter::SampleConverter;
