//! # Output Container Writers
//!
//! Two destinations for extracted audio: [`PassthroughMuxer`] re-containers
//! compressed samples into MPEG-4, [`WavWriter`] streams decoded PCM into a
//! canonical 44-byte-header WAV file.

mod passthrough;
mod wav;

pub use passthrough::PassthroughMuxer;
pub use wav::{WavWriter, WAV_HEADER_LEN};
