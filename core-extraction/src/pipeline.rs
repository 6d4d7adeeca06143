//! # Extraction Pipeline
//!
//! Drives one extraction request to completion, cancellation, or failure.
//! The output format selects the strategy: `m4a` re-containers compressed
//! samples (no decoding), `wav` decodes to PCM through the feed/drain loop.
//! Both strategies share the trim window and progress reporter, poll the
//! cancellation token once per iteration, and release their demuxer, decoder
//! and writer handles on every exit path by scope.

use crate::config::PipelineConfig;
use crate::decoder::PcmDecoder;
use crate::demux::MediaDemuxer;
use crate::error::{ExtractionError, Result};
use crate::gain::GainProcessor;
use crate::progress::ProgressReporter;
use crate::request::{ExtractionRequest, OutputFormat};
use crate::trim::TrimWindow;
use crate::writer::{PassthroughMuxer, WavWriter};
use core_runtime::EventSink;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// One extraction worker's state: the validated request plus the injected
/// event sink. Owns the demuxer/decoder/writer handles exclusively for the
/// duration of the run; nothing is shared with other tasks.
pub struct ExtractionPipeline {
    request: ExtractionRequest,
    task_id: String,
    sink: Arc<dyn EventSink>,
    config: PipelineConfig,
}

impl ExtractionPipeline {
    pub fn new(request: ExtractionRequest, task_id: String, sink: Arc<dyn EventSink>) -> Self {
        Self {
            request,
            task_id,
            sink,
            config: PipelineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the pipeline to a terminal state. Returns the output path on
    /// success, [`ExtractionError::Cancelled`] on cooperative cancellation,
    /// or the failure that aborted the run.
    #[instrument(skip(self, cancel), fields(task_id = %self.task_id))]
    pub async fn run(&self, cancel: CancellationToken) -> Result<PathBuf> {
        self.request.validate()?;
        self.config
            .validate()
            .map_err(ExtractionError::InvalidArgument)?;

        let mut demuxer = MediaDemuxer::open(&self.request.video)?;
        let track = demuxer.track().clone();

        let start_us = self.request.start_us();
        if track.duration_us > 0 && start_us >= track.duration_us {
            return Err(ExtractionError::InvalidArgument(format!(
                "start {}us is at or beyond the track duration {}us",
                start_us, track.duration_us
            )));
        }

        let window = TrimWindow::new(start_us, self.request.duration_us(), track.duration_us);
        info!(
            format = ?self.request.format,
            start_us,
            wanted_us = window.wanted_us(),
            "starting extraction"
        );

        // The destination is overwritten if present.
        match std::fs::remove_file(&self.request.output) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let mut progress = ProgressReporter::new(self.sink.clone(), self.task_id.clone());

        match self.request.format {
            OutputFormat::M4a => {
                self.copy_compressed(demuxer, window, &mut progress, &cancel)
                    .await
            }
            OutputFormat::Wav => {
                self.decode_to_wav(demuxer, window, &mut progress, &cancel)
                    .await
            }
        }
    }

    /// Compressed-copy strategy: demux → re-mux, timestamps rebased to zero.
    async fn copy_compressed(
        &self,
        mut demuxer: MediaDemuxer,
        window: TrimWindow,
        progress: &mut ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<PathBuf> {
        let mut muxer = PassthroughMuxer::create(&self.request.output, demuxer.track())?;
        demuxer.seek(window.start_us())?;

        let mut written = 0u64;
        loop {
            if cancel.is_cancelled() {
                info!("extraction cancelled");
                return Err(ExtractionError::Cancelled);
            }

            let Some(sample) = demuxer.next_sample()? else {
                break;
            };
            let relative_us = window.relative(sample.pts_us);
            if window.is_past_end(relative_us) {
                // The sample straddling the end boundary is dropped whole.
                break;
            }

            muxer.write_sample(relative_us, sample.duration_us, sample.data())?;
            written += 1;
            progress.report(relative_us, window.wanted_us());

            tokio::task::yield_now().await;
        }

        muxer.finalize()?;
        progress.finish();
        debug!(samples = written, "passthrough copy complete");
        Ok(self.request.output.clone())
    }

    /// Decode strategy: demux → decode → gain → WAV, feed/drain alternating.
    async fn decode_to_wav(
        &self,
        mut demuxer: MediaDemuxer,
        window: TrimWindow,
        progress: &mut ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<PathBuf> {
        let track = demuxer.track().clone();
        let sample_rate = self.request.sample_rate.unwrap_or(track.sample_rate);
        let channels = self.request.channels.unwrap_or(track.channels);

        let mut decoder = PcmDecoder::new(&demuxer, self.config.max_pending_frames)?;
        let mut writer = WavWriter::create(&self.request.output, sample_rate, channels)?;
        let gain = GainProcessor::new(self.request.volume);

        demuxer.seek(window.start_us())?;
        decoder.reset();

        while !decoder.is_drained() {
            if cancel.is_cancelled() {
                info!("extraction cancelled");
                return Err(ExtractionError::Cancelled);
            }

            let mut advanced = false;

            // Feed: stop at end of stream or at the sample straddling the
            // end boundary, so decoded output stays within the window.
            if decoder.has_input_slot() {
                match demuxer.next_sample()? {
                    Some(sample) if !window.exceeds_input_bound(sample.pts_us) => {
                        decoder.feed(sample)?;
                        advanced = true;
                    }
                    _ => {
                        decoder.signal_end_of_stream();
                        advanced = true;
                    }
                }
            }

            // Drain: gain-scale and append every ready frame.
            while let Some(mut frame) = decoder.next_frame() {
                gain.apply(&mut frame.data);
                writer.write(&frame.data)?;
                progress.report(window.relative(frame.pts_us), window.wanted_us());
                advanced = true;
            }

            if advanced {
                tokio::task::yield_now().await;
            } else {
                // Bounded wait for a slot or frame; also bounds cancellation
                // latency while the decoder is busy.
                sleep(self.config.idle_poll).await;
            }
        }

        let pcm_bytes = writer.data_len();
        writer.finalize()?;
        progress.finish();
        debug!(pcm_bytes, "decode complete");
        Ok(self.request.output.clone())
    }
}
