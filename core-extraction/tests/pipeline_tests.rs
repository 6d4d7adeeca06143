//! End-to-end pipeline tests over generated fixtures.
//!
//! The decode path runs against real PCM WAV sources, byte-for-byte
//! verifiable. The passthrough path runs against an MPEG-4 fixture carrying
//! opaque payloads: no decoding happens on that path, so the payload bytes
//! only have to survive the copy.

use core_extraction::{ExtractionError, ExtractionPipeline, ExtractionRequest, OutputFormat};
use core_runtime::{EventSink, ExtractionEvent};
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Helpers
// ============================================================================

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<ExtractionEvent>>,
}

impl EventSink for RecordingSink {
    fn emit(&self, event: ExtractionEvent) {
        self.events.lock().push(event);
    }
}

impl RecordingSink {
    fn progress_values(&self) -> Vec<f32> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                ExtractionEvent::Progress { progress, .. } => Some(*progress),
                _ => None,
            })
            .collect()
    }

    fn error_count(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, ExtractionEvent::Error { .. }))
            .count()
    }
}

/// Write a 16-bit PCM WAV file; sample values come from `gen(frame, channel)`.
fn write_wav_fixture(
    path: &Path,
    sample_rate: u32,
    channels: u16,
    total_frames: usize,
    gen: impl Fn(usize, usize) -> i16,
) {
    let mut pcm = Vec::with_capacity(total_frames * channels as usize * 2);
    for frame in 0..total_frames {
        for channel in 0..channels as usize {
            pcm.extend_from_slice(&gen(frame, channel).to_le_bytes());
        }
    }

    let byte_rate = sample_rate * u32::from(channels) * 2;
    let mut bytes = Vec::with_capacity(44 + pcm.len());
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + pcm.len() as u32).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&channels.to_le_bytes());
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&byte_rate.to_le_bytes());
    bytes.extend_from_slice(&(channels * 2).to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&(pcm.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&pcm);

    fs::write(path, bytes).unwrap();
}

/// Write an MPEG-4 audio fixture: one AAC track of `samples` opaque payloads,
/// 1024 frames each at 44100 Hz stereo.
fn write_m4a_fixture(path: &Path, samples: u64) {
    use mp4::{
        AacConfig, AudioObjectType, ChannelConfig, MediaConfig, Mp4Config, Mp4Sample, Mp4Writer,
        SampleFreqIndex, TrackConfig, TrackType,
    };

    let config = Mp4Config {
        major_brand: str::parse("isom").unwrap(),
        minor_version: 512,
        compatible_brands: vec![str::parse("isom").unwrap(), str::parse("mp41").unwrap()],
        timescale: 44100,
    };

    let file = fs::File::create(path).unwrap();
    let mut writer = Mp4Writer::write_start(std::io::BufWriter::new(file), &config).unwrap();
    writer
        .add_track(&TrackConfig {
            track_type: TrackType::Audio,
            timescale: 44100,
            language: "und".to_string(),
            media_conf: MediaConfig::AacConfig(AacConfig {
                bitrate: 128_000,
                profile: AudioObjectType::AacLowComplexity,
                freq_index: SampleFreqIndex::Freq44100,
                chan_conf: ChannelConfig::Stereo,
            }),
        })
        .unwrap();

    for i in 0..samples {
        let payload = [(i & 0xFF) as u8; 32];
        writer
            .write_sample(
                1,
                &Mp4Sample {
                    start_time: i * 1024,
                    duration: 1024,
                    rendering_offset: 0,
                    is_sync: true,
                    bytes: bytes::Bytes::copy_from_slice(&payload),
                },
            )
            .unwrap();
    }
    writer.write_end().unwrap();
}

fn wav_request(video: &Path, output: &Path) -> ExtractionRequest {
    let mut request = ExtractionRequest::new(video, output);
    request.format = OutputFormat::Wav;
    request
}

async fn run(
    request: ExtractionRequest,
    sink: Arc<RecordingSink>,
) -> Result<PathBuf, ExtractionError> {
    let pipeline = ExtractionPipeline::new(request, "test-task".to_string(), sink);
    pipeline.run(CancellationToken::new()).await
}

fn header_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
}

fn header_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes(bytes[offset..offset + 2].try_into().unwrap())
}

// Boundary slack: coarse seek and feed-side bounding are packet-granular.
const PACKET_SLACK_BYTES: usize = 64 * 1024;

// ============================================================================
// Decode Path
// ============================================================================

#[tokio::test]
async fn full_range_decode_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("in.wav");
    let output = dir.path().join("out.wav");
    write_wav_fixture(&source, 8000, 2, 8000 * 2, |frame, channel| {
        (frame as i16).wrapping_mul(3).wrapping_add(channel as i16)
    });

    let sink = Arc::new(RecordingSink::default());
    let result = run(wav_request(&source, &output), sink.clone()).await;
    assert_eq!(result.unwrap(), output);

    let source_bytes = fs::read(&source).unwrap();
    let output_bytes = fs::read(&output).unwrap();
    // Unity gain, no trim: the PCM payload survives decode byte-for-byte.
    assert_eq!(&output_bytes[44..], &source_bytes[44..]);
    assert_eq!(header_u16(&output_bytes, 22), 2);
    assert_eq!(header_u32(&output_bytes, 24), 8000);
    assert_eq!(
        header_u32(&output_bytes, 40) as usize,
        output_bytes.len() - 44
    );
    assert_eq!(
        header_u32(&output_bytes, 4) as usize,
        output_bytes.len() - 8
    );
    assert_eq!(sink.error_count(), 0);
}

#[tokio::test]
async fn trim_window_bounds_output_length() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("in.wav");
    let output = dir.path().join("out.wav");
    write_wav_fixture(&source, 44100, 2, 44100 * 10, |frame, _| frame as i16);

    let mut request = wav_request(&source, &output);
    request.start = 5.0;
    request.duration = 3.0;

    let sink = Arc::new(RecordingSink::default());
    run(request, sink).await.unwrap();

    let bytes = fs::read(&output).unwrap();
    let expected = 3 * 44100 * 2 * 2;
    let actual = bytes.len() - 44;
    assert!(
        actual + PACKET_SLACK_BYTES >= expected && actual <= expected + PACKET_SLACK_BYTES,
        "expected ~{} PCM bytes, got {}",
        expected,
        actual
    );
    assert_eq!(header_u32(&bytes, 24), 44100);
    assert_eq!(header_u16(&bytes, 22), 2);
    assert_eq!(header_u16(&bytes, 34), 16);
}

#[tokio::test]
async fn zero_duration_covers_start_to_track_end() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("in.wav");
    let output = dir.path().join("out.wav");
    write_wav_fixture(&source, 8000, 1, 8000 * 2, |frame, _| frame as i16);

    let mut request = wav_request(&source, &output);
    request.start = 0.5;

    let sink = Arc::new(RecordingSink::default());
    run(request, sink).await.unwrap();

    let bytes = fs::read(&output).unwrap();
    let expected = (8000.0 * 1.5) as usize * 2;
    let actual = bytes.len() - 44;
    assert!(
        actual + PACKET_SLACK_BYTES >= expected && actual <= expected + PACKET_SLACK_BYTES,
        "expected ~{} PCM bytes, got {}",
        expected,
        actual
    );
}

#[tokio::test]
async fn header_overrides_do_not_resample() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("in.wav");
    let output = dir.path().join("out.wav");
    write_wav_fixture(&source, 44100, 2, 44100, |frame, _| frame as i16);

    let mut request = wav_request(&source, &output);
    request.sample_rate = Some(22050);
    request.channels = Some(1);

    let sink = Arc::new(RecordingSink::default());
    run(request, sink).await.unwrap();

    let source_len = fs::metadata(&source).unwrap().len();
    let bytes = fs::read(&output).unwrap();
    // Overrides rewrite the header only; the PCM stream is untouched.
    assert_eq!(header_u32(&bytes, 24), 22050);
    assert_eq!(header_u16(&bytes, 22), 1);
    assert_eq!(bytes.len() as u64, source_len);
}

#[tokio::test]
async fn doubled_volume_clamps_to_sample_range() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("in.wav");
    let output = dir.path().join("out.wav");
    write_wav_fixture(&source, 8000, 1, 4000, |_, _| 20_000);

    let mut request = wav_request(&source, &output);
    request.volume = 2.0;

    let sink = Arc::new(RecordingSink::default());
    run(request, sink).await.unwrap();

    let bytes = fs::read(&output).unwrap();
    let samples: Vec<i16> = bytes[44..]
        .chunks_exact(2)
        .map(|c| i16::from_le_bytes([c[0], c[1]]))
        .collect();
    assert!(!samples.is_empty());
    // 40000 would wrap to -25536; clamping must pin every sample to i16::MAX.
    assert!(samples.iter().all(|&s| s == i16::MAX));
}

#[tokio::test]
async fn progress_is_monotone_and_ends_at_one() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("in.wav");
    let output = dir.path().join("out.wav");
    write_wav_fixture(&source, 44100, 2, 44100 * 4, |frame, _| frame as i16);

    let sink = Arc::new(RecordingSink::default());
    run(wav_request(&source, &output), sink.clone()).await.unwrap();

    let values = sink.progress_values();
    assert!(values.len() > 1);
    assert!(values.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(*values.last().unwrap(), 1.0);
    assert_eq!(sink.error_count(), 0);
}

#[tokio::test]
async fn start_past_track_end_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("in.wav");
    let output = dir.path().join("out.wav");
    write_wav_fixture(&source, 8000, 1, 8000, |frame, _| frame as i16);

    let mut request = wav_request(&source, &output);
    request.start = 60.0;

    let sink = Arc::new(RecordingSink::default());
    let result = run(request, sink).await;
    assert!(matches!(
        result,
        Err(ExtractionError::InvalidArgument(_))
    ));
    // Rejected before the output was created.
    assert!(!output.exists());
}

#[tokio::test]
async fn cancelled_before_first_iteration_emits_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("in.wav");
    let output = dir.path().join("out.wav");
    write_wav_fixture(&source, 44100, 2, 44100 * 5, |frame, _| frame as i16);

    let sink = Arc::new(RecordingSink::default());
    let pipeline = ExtractionPipeline::new(
        wav_request(&source, &output),
        "cancelled-task".to_string(),
        sink.clone(),
    );

    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = pipeline.run(cancel).await;

    assert!(matches!(result, Err(ExtractionError::Cancelled)));
    assert!(sink.events.lock().is_empty());
}

#[tokio::test]
async fn existing_output_is_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("in.wav");
    let output = dir.path().join("out.wav");
    write_wav_fixture(&source, 8000, 1, 8000, |frame, _| frame as i16);
    fs::write(&output, b"stale garbage from a previous run").unwrap();

    let sink = Arc::new(RecordingSink::default());
    run(wav_request(&source, &output), sink).await.unwrap();

    let bytes = fs::read(&output).unwrap();
    assert_eq!(&bytes[0..4], b"RIFF");
    assert_eq!(
        header_u32(&bytes, 40) as usize,
        bytes.len() - 44
    );
}

#[tokio::test]
async fn missing_source_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(RecordingSink::default());
    let request = wav_request(&dir.path().join("absent.mp4"), &dir.path().join("out.wav"));
    let result = run(request, sink).await;
    assert!(matches!(result, Err(ExtractionError::IoError(_))));
}

// ============================================================================
// Passthrough Path
// ============================================================================

#[tokio::test]
async fn passthrough_rejects_non_mp4_codecs() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("in.wav");
    let output = dir.path().join("out.m4a");
    write_wav_fixture(&source, 8000, 1, 8000, |frame, _| frame as i16);

    let sink = Arc::new(RecordingSink::default());
    let request = ExtractionRequest::new(&source, &output);
    let result = run(request, sink).await;
    assert!(matches!(
        result,
        Err(ExtractionError::UnsupportedFormat(_))
    ));
}

#[tokio::test]
async fn passthrough_trims_and_rebases_timestamps() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("in.mp4");
    let output = dir.path().join("out.m4a");
    write_m4a_fixture(&source, 40);

    let mut request = ExtractionRequest::new(&source, &output);
    request.start = 0.2;
    request.duration = 0.4;

    let sink = Arc::new(RecordingSink::default());
    run(request, sink.clone()).await.unwrap();

    let size = fs::metadata(&output).unwrap().len();
    let file = fs::File::open(&output).unwrap();
    let mut reader = mp4::Mp4Reader::read_header(std::io::BufReader::new(file), size).unwrap();
    let track_id = *reader.tracks().keys().next().unwrap();
    let count = reader.sample_count(track_id).unwrap();

    // 0.4 s at one sample per 1024/44100 s is ~17 samples; the straddling
    // sample is dropped and the seek is sync-sample-granular.
    assert!((17..=18).contains(&count), "unexpected sample count {}", count);

    let first = reader.read_sample(track_id, 1).unwrap().unwrap();
    assert_eq!(first.start_time, 0);

    let wanted_ticks = (0.4 * 44100.0) as u64;
    for id in 1..=count {
        let sample = reader.read_sample(track_id, id).unwrap().unwrap();
        assert!(sample.start_time < wanted_ticks);
        // Payload copied verbatim, never decoded.
        assert_eq!(sample.bytes.len(), 32);
    }

    let values = sink.progress_values();
    assert_eq!(*values.last().unwrap(), 1.0);
    assert!(values.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(sink.error_count(), 0);
}

#[tokio::test]
async fn passthrough_full_copy_preserves_every_sample() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("in.mp4");
    let output = dir.path().join("out.m4a");
    write_m4a_fixture(&source, 24);

    let sink = Arc::new(RecordingSink::default());
    run(ExtractionRequest::new(&source, &output), sink).await.unwrap();

    let size = fs::metadata(&output).unwrap().len();
    let file = fs::File::open(&output).unwrap();
    let mut reader = mp4::Mp4Reader::read_header(std::io::BufReader::new(file), size).unwrap();
    let track_id = *reader.tracks().keys().next().unwrap();
    assert_eq!(reader.sample_count(track_id).unwrap(), 24);

    let track = reader.tracks().get(&track_id).unwrap();
    assert_eq!(track.media_type().unwrap(), mp4::MediaType::AAC);
    assert_eq!(track.timescale(), 44100);

    // Payload identity sample-by-sample.
    for id in 1..=24 {
        let sample = reader.read_sample(track_id, id).unwrap().unwrap();
        let expected = ((id - 1) & 0xFF) as u8;
        assert!(sample.bytes.iter().all(|&b| b == expected));
    }
}
