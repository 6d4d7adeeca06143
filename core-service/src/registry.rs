//! # Task Registry
//!
//! Bookkeeping of running extraction tasks. The registry maps task ids to
//! cancellation tokens: the token is the cancellation mechanism, the map is
//! only the lookup layer. It never owns pipeline resources.

use parking_lot::Mutex;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Shared map of task id → cancellation token, under mutual exclusion.
///
/// This is the only mutable state shared across workers; each worker's
/// demuxer/decoder/writer handles stay exclusively owned by that worker.
#[derive(Default)]
pub struct TaskRegistry {
    tasks: Mutex<HashMap<String, CancellationToken>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `token` under `id`. A previous entry under the same id is
    /// replaced.
    pub fn register(&self, id: &str, token: CancellationToken) {
        self.tasks.lock().insert(id.to_string(), token);
    }

    /// Set the task's cancellation flag and drop the entry. Unknown or
    /// already-finished ids are a no-op, making cancellation idempotent.
    pub fn cancel(&self, id: &str) -> bool {
        match self.tasks.lock().remove(id) {
            Some(token) => {
                token.cancel();
                debug!(task_id = id, "task cancelled");
                true
            }
            None => false,
        }
    }

    /// Drop the entry for a successfully finished task without setting its
    /// flag.
    pub fn complete(&self, id: &str) {
        self.tasks.lock().remove(id);
    }

    /// Drop the entry for a failed task without setting its flag.
    pub fn fail(&self, id: &str) {
        self.tasks.lock().remove(id);
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.tasks.lock().contains_key(id)
    }

    /// Number of tasks currently registered.
    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }
}
