//! # Extraction Events
//!
//! Typed events emitted by running extraction tasks, and the sink abstraction
//! through which they leave the core.
//!
//! ## Overview
//!
//! The core never talks to a transport directly. Every worker is handed an
//! [`EventSink`] by the host; the sink decides where `progress` and `error`
//! notifications go (an FFI callback, a channel, a test recorder). For hosts
//! that want fan-out instead of a single callback, [`EventBus`] is a ready-made
//! sink over `tokio::sync::broadcast`.
//!
//! ```text
//! ┌────────────────┐    emit     ┌───────────┐   subscribe   ┌────────────┐
//! │ Worker (task)  ├────────────>│ EventSink │──────────────>│    Host    │
//! └────────────────┘             └───────────┘               └────────────┘
//! ```
//!
//! ## Delivery contract
//!
//! - `Progress` is emitted repeatedly while a task runs; values are
//!   non-decreasing per task and a successful task ends on exactly `1.0`.
//! - `Error` is emitted at most once per task, and only when the task fails.
//!   A cancelled task emits neither a final progress nor an error.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ============================================================================
// Event Types
// ============================================================================

/// Events emitted by extraction tasks.
///
/// The serialized form matches the wire contract of the host module: a lowercase
/// `type` tag with camelCase payload fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ExtractionEvent {
    /// Periodic progress notification, `progress` in `[0.0, 1.0]`.
    #[serde(rename_all = "camelCase")]
    Progress { task_id: String, progress: f32 },

    /// Terminal failure notification. At most one per task.
    #[serde(rename_all = "camelCase")]
    Error { task_id: String, message: String },
}

impl ExtractionEvent {
    /// Task the event belongs to.
    pub fn task_id(&self) -> &str {
        match self {
            ExtractionEvent::Progress { task_id, .. } => task_id,
            ExtractionEvent::Error { task_id, .. } => task_id,
        }
    }
}

// ============================================================================
// Sink Abstraction
// ============================================================================

/// Host-injected event sink.
///
/// Implementations must be cheap and non-blocking: workers call [`emit`]
/// from their pipeline loop, once per processed sample.
///
/// [`emit`]: EventSink::emit
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ExtractionEvent);
}

// ============================================================================
// Broadcast Event Bus
// ============================================================================

/// Broadcast-channel sink for hosts with multiple independent subscribers.
///
/// Emission never blocks; events published while no subscriber is attached
/// are dropped, as are events a lagging subscriber fails to keep up with.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ExtractionEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to all events emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ExtractionEvent> {
        self.sender.subscribe()
    }

    /// Number of currently attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(128)
    }
}

impl EventSink for EventBus {
    fn emit(&self, event: ExtractionEvent) {
        // A send error only means there is no subscriber right now.
        let _ = self.sender.send(event);
    }
}
