//! Progress-callback trait for per-document queue events.
//!
//! Inject an [`Arc<dyn QueueProgressCallback>`] via
//! [`crate::config::NominateConfigBuilder::progress_callback`] to receive
//! events as the worker moves documents through the pipeline.
//!
//! The callback is the push half of the observation interface; the pull half
//! is [`crate::queue::ProcessingQueue::snapshot`]. Callers can forward events
//! to a channel, a terminal progress bar or a log without the library knowing
//! how the host application presents them.
//!
//! # Example
//!
//! ```rust
//! use nominate::{DocumentId, NominateConfig, QueueProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl QueueProgressCallback for CountingCallback {
//!     fn on_document_complete(&self, _id: DocumentId, filename: &str) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("suggested: {filename}");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//!
//! let config = NominateConfig::builder()
//!     .progress_callback(counter as Arc<dyn QueueProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::document::DocumentId;
use crate::suggest::Stage;
use std::sync::Arc;

/// Called by the processing queue as documents move through the pipeline.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Events for one document arrive in order; events are
/// emitted from the worker task except `on_document_queued`, which runs on the
/// enqueuing caller's thread.
pub trait QueueProgressCallback: Send + Sync {
    /// A document was accepted into the queue.
    fn on_document_queued(&self, id: DocumentId, source: &str) {
        let _ = (id, source);
    }

    /// The worker picked the document up; its status is now `running`.
    fn on_document_start(&self, id: DocumentId, source: &str) {
        let _ = (id, source);
    }

    /// A pipeline stage finished.
    ///
    /// # Arguments
    /// * `stage`    — the stage that just completed
    /// * `progress` — the document's progress fraction after this stage
    fn on_stage_complete(&self, id: DocumentId, stage: Stage, progress: f32) {
        let _ = (id, stage, progress);
    }

    /// The run succeeded and a filename suggestion is available.
    fn on_document_complete(&self, id: DocumentId, filename: &str) {
        let _ = (id, filename);
    }

    /// The run failed; `error` is a human-readable description.
    fn on_document_failed(&self, id: DocumentId, error: &str) {
        let _ = (id, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl QueueProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::NominateConfig`].
pub type ProgressCallback = Arc<dyn QueueProgressCallback>;
