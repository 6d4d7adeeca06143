//! # Runtime Infrastructure
//!
//! Shared runtime surface for the extraction core:
//! - Typed extraction events and the host-injected [`EventSink`](events::EventSink)
//! - A broadcast-based [`EventBus`](events::EventBus) default sink
//! - Logging bootstrap over `tracing-subscriber`

pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
pub use events::{EventBus, EventSink, ExtractionEvent};
pub use logging::{init_logging, LogFormat, LoggingConfig};
