//! # Progress Reporting
//!
//! Maps pipeline position to a normalized value in `[0, 1]` and emits it
//! through the injected sink. Reporting is data-driven: one emission per
//! processed sample or drained frame, no wall-clock timers.

use core_runtime::{EventSink, ExtractionEvent};
use std::sync::Arc;

/// Per-task progress emitter.
///
/// Emitted values are forced non-decreasing across the task's lifetime; the
/// final emission of a successful task is exactly `1.0` via [`finish`].
///
/// [`finish`]: ProgressReporter::finish
pub struct ProgressReporter {
    sink: Arc<dyn EventSink>,
    task_id: String,
    last: f32,
}

impl ProgressReporter {
    pub fn new(sink: Arc<dyn EventSink>, task_id: String) -> Self {
        Self {
            sink,
            task_id,
            last: 0.0,
        }
    }

    /// Emit `clamp(done/total, 0, 1)`. A `total` of zero emits `0` rather
    /// than failing.
    pub fn report(&mut self, done_us: u64, total_us: u64) {
        let ratio = if total_us == 0 {
            0.0
        } else {
            (done_us as f64 / total_us as f64).clamp(0.0, 1.0) as f32
        };
        self.emit(ratio.max(self.last));
    }

    /// Emit the terminal `1.0` for a successfully completed task.
    pub fn finish(&mut self) {
        self.emit(1.0);
    }

    fn emit(&mut self, progress: f32) {
        self.last = progress;
        self.sink.emit(ExtractionEvent::Progress {
            task_id: self.task_id.clone(),
            progress,
        });
    }
}
