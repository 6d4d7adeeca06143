//! # Extraction Service Façade
//!
//! Host-facing surface of the extraction core. The service spawns one
//! independent worker per request, hands it a cancellation token registered
//! under a fresh task id, and reports terminal outcomes through the returned
//! [`ExtractionTask`] handle, plus a single sink event for failures.
//!
//! ```no_run
//! use core_runtime::EventBus;
//! use core_service::ExtractorService;
//! use core_extraction::ExtractionRequest;
//! use std::sync::Arc;
//!
//! # async fn example() -> core_service::Result<()> {
//! let bus = Arc::new(EventBus::default());
//! let service = ExtractorService::new(bus.clone());
//!
//! let task = service.start(ExtractionRequest::new("/clips/in.mp4", "/clips/out.m4a"))?;
//! let task_id = task.id().to_string();
//!
//! // ... later, from another context:
//! service.cancel(&task_id);
//!
//! match task.outcome().await {
//!     core_service::ExtractionOutcome::Completed(path) => println!("wrote {:?}", path),
//!     core_service::ExtractionOutcome::Cancelled => println!("aborted"),
//!     core_service::ExtractionOutcome::Failed(e) => eprintln!("failed: {}", e),
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod registry;

pub use error::{CoreError, Result};
pub use registry::TaskRegistry;

use core_extraction::{ExtractionError, ExtractionPipeline, ExtractionRequest, PipelineConfig};
use core_runtime::{EventSink, ExtractionEvent};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use uuid::Uuid;

/// Terminal state of one extraction task.
#[derive(Debug)]
pub enum ExtractionOutcome {
    /// The pipeline ran to completion; the output file is at the given path.
    Completed(PathBuf),
    /// The caller cancelled the task. The output file is left in whatever
    /// partial state writing reached.
    Cancelled,
    /// The pipeline aborted; the error was also emitted once through the
    /// event sink.
    Failed(ExtractionError),
}

/// Handle to a running extraction.
pub struct ExtractionTask {
    id: String,
    handle: JoinHandle<ExtractionOutcome>,
}

impl ExtractionTask {
    /// Identifier to correlate events and cancel the task with.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Wait for the task to reach a terminal state.
    pub async fn outcome(self) -> ExtractionOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => ExtractionOutcome::Failed(ExtractionError::Internal(format!(
                "extraction worker died: {}",
                e
            ))),
        }
    }
}

/// Spawns and tracks extraction workers.
#[derive(Clone)]
pub struct ExtractorService {
    registry: Arc<TaskRegistry>,
    sink: Arc<dyn EventSink>,
    config: PipelineConfig,
}

impl ExtractorService {
    /// Create a service emitting events into `sink`.
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            registry: Arc::new(TaskRegistry::new()),
            sink,
            config: PipelineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Tasks currently running.
    pub fn active_tasks(&self) -> usize {
        self.registry.len()
    }

    /// Start one extraction. Request validation failures surface here,
    /// before a worker is spawned; everything later arrives asynchronously.
    pub fn start(&self, request: ExtractionRequest) -> Result<ExtractionTask> {
        request.validate().map_err(CoreError::Extraction)?;

        let task_id = Uuid::new_v4().to_string();
        let token = CancellationToken::new();
        self.registry.register(&task_id, token.clone());
        info!(task_id = %task_id, video = ?request.video, "extraction started");

        let pipeline = ExtractionPipeline::new(request, task_id.clone(), self.sink.clone())
            .with_config(self.config.clone());
        let registry = self.registry.clone();
        let sink = self.sink.clone();
        let id = task_id.clone();

        let handle = tokio::spawn(async move {
            match pipeline.run(token).await {
                Ok(path) => {
                    registry.complete(&id);
                    info!(task_id = %id, "extraction completed");
                    ExtractionOutcome::Completed(path)
                }
                Err(e) if e.is_cancelled() => {
                    // The cancel call already dropped the registry entry;
                    // a cancelled task is a successful abort, not a failure.
                    registry.complete(&id);
                    ExtractionOutcome::Cancelled
                }
                Err(e) => {
                    registry.fail(&id);
                    error!(task_id = %id, "extraction failed: {}", e);
                    sink.emit(ExtractionEvent::Error {
                        task_id: id.clone(),
                        message: e.to_string(),
                    });
                    ExtractionOutcome::Failed(e)
                }
            }
        });

        Ok(ExtractionTask {
            id: task_id,
            handle,
        })
    }

    /// Request cooperative cancellation of `task_id`. Unknown and finished
    /// ids are a no-op.
    pub fn cancel(&self, task_id: &str) {
        self.registry.cancel(task_id);
    }
}
