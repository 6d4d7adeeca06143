//! # WAV Output

use crate::error::Result;
use bytes::{BufMut, BytesMut};
use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

/// Canonical PCM WAV header size.
pub const WAV_HEADER_LEN: usize = 44;

/// Streaming 16-bit PCM WAV writer.
///
/// A header with zero-length placeholders goes out first so PCM bytes can be
/// appended as they are produced; [`finalize`](WavWriter::finalize) rewrites
/// the header in place once the total data length is known.
pub struct WavWriter {
    file: File,
    sample_rate: u32,
    channels: u16,
    data_len: u64,
}

impl WavWriter {
    /// Create (truncating) `path` and write the placeholder header.
    pub fn create(path: &Path, sample_rate: u32, channels: u16) -> Result<Self> {
        let mut file = File::create(path)?;
        file.write_all(&encode_header(sample_rate, channels, 0))?;
        Ok(Self {
            file,
            sample_rate,
            channels,
            data_len: 0,
        })
    }

    /// Append raw interleaved little-endian PCM bytes.
    pub fn write(&mut self, pcm: &[u8]) -> Result<()> {
        self.file.write_all(pcm)?;
        self.data_len += pcm.len() as u64;
        Ok(())
    }

    /// Bytes of PCM written so far.
    pub fn data_len(&self) -> u64 {
        self.data_len
    }

    /// Rewrite the header with the true lengths and flush.
    pub fn finalize(mut self) -> Result<()> {
        self.file.seek(SeekFrom::Start(0))?;
        self.file
            .write_all(&encode_header(self.sample_rate, self.channels, self.data_len))?;
        self.file.flush()?;
        Ok(())
    }
}

/// Encode the 44-byte canonical PCM WAV header. All multi-byte fields are
/// little-endian; format tag 1 is integer PCM at 16 bits per sample.
fn encode_header(sample_rate: u32, channels: u16, data_len: u64) -> [u8; WAV_HEADER_LEN] {
    let byte_rate = sample_rate * u32::from(channels) * 2;
    let block_align = channels * 2;

    let mut header = BytesMut::with_capacity(WAV_HEADER_LEN);
    header.put_slice(b"RIFF");
    header.put_u32_le((36 + data_len) as u32);
    header.put_slice(b"WAVE");
    header.put_slice(b"fmt ");
    header.put_u32_le(16);
    header.put_u16_le(1);
    header.put_u16_le(channels);
    header.put_u32_le(sample_rate);
    header.put_u32_le(byte_rate);
    header.put_u16_le(block_align);
    header.put_u16_le(16);
    header.put_slice(b"data");
    header.put_u32_le(data_len as u32);

    let mut out = [0u8; WAV_HEADER_LEN];
    out.copy_from_slice(&header);
    out
}
