//! # Pipeline Configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning knobs for the extraction pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Bounded wait applied on loop iterations where the decoder neither
    /// accepted input nor produced output. Also bounds worst-case
    /// cancellation latency while the pipeline is idle.
    ///
    /// Default: 10 ms.
    #[serde(default = "default_idle_poll")]
    pub idle_poll: Duration,

    /// Maximum decoded frames queued between the feed and drain sides.
    /// The feed side stops reading new samples while the queue is full.
    ///
    /// Default: 8.
    #[serde(default = "default_max_pending_frames")]
    pub max_pending_frames: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            idle_poll: default_idle_poll(),
            max_pending_frames: default_max_pending_frames(),
        }
    }
}

impl PipelineConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.idle_poll.is_zero() {
            return Err("idle_poll must be > 0".to_string());
        }
        if self.max_pending_frames == 0 {
            return Err("max_pending_frames must be > 0".to_string());
        }
        Ok(())
    }
}

fn default_idle_poll() -> Duration {
    Duration::from_millis(10)
}

fn default_max_pending_frames() -> usize {
    8
}
