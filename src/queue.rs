//! FIFO processing queue with a single worker.
//!
//! ## Scheduling
//!
//! [`ProcessingQueue::enqueue`] appends a [`Document`] to the shared list and
//! sends its id down an unbounded channel; one Tokio task receives ids in
//! order and runs the [`DocumentPipeline`] for each, to completion, before
//! taking the next. That single consumer is what guarantees at most one
//! document is `running` at any time.
//!
//! ## Shared state
//!
//! Documents live in a `parking_lot::Mutex<Vec<Document>>` in enqueue order.
//! The lock is never held across an `.await`; each mutation is one short
//! critical section, so readers always see a consistent document. After every
//! mutation a revision counter on a `watch` channel is bumped, which is what
//! [`ProcessingQueue::subscribe`] and [`ProcessingQueue::wait_idle`] observe.
//!
//! ## Caller actions
//!
//! * [`accept`](ProcessingQueue::accept) renames the source file to the
//!   suggestion and clears it; while the rename is in flight the document
//!   cannot be requeued or accepted again
//! * [`reject`](ProcessingQueue::reject) clears the suggestion only
//! * [`requeue`](ProcessingQueue::requeue) re-submits a finished document; the
//!   queue itself never retries

use crate::config::NominateConfig;
use crate::document::{Document, DocumentId, DocumentStatus};
use crate::error::{FailureReason, NominateError};
use crate::pipeline::input::is_url;
use crate::progress::{NoopProgressCallback, ProgressCallback};
use crate::rename;
use crate::suggest::{DocumentPipeline, Stage};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// State shared between the queue handle and its worker.
struct Shared {
    documents: Mutex<Vec<Document>>,
    /// Documents whose accept-rename is in flight. Locked after `documents`.
    accepting: Mutex<HashSet<DocumentId>>,
    revision: watch::Sender<u64>,
    callback: ProgressCallback,
}

impl Shared {
    /// Apply `f` to document `id` under the lock, then publish a new revision.
    fn update<R>(&self, id: DocumentId, f: impl FnOnce(&mut Document) -> R) -> Option<R> {
        let result = {
            let mut docs = self.documents.lock();
            docs.iter_mut().find(|d| d.id == id).map(f)
        };
        if result.is_some() {
            self.bump();
        }
        result
    }

    fn bump(&self) {
        self.revision.send_modify(|r| *r = r.wrapping_add(1));
    }

    fn is_idle(&self) -> bool {
        !self.documents.lock().iter().any(|d| {
            matches!(d.status, DocumentStatus::Pending | DocumentStatus::Running)
        })
    }
}

/// Accepts documents and names them one at a time, in arrival order.
///
/// # Example
/// ```rust,no_run
/// use nominate::{NominateConfig, ProcessingQueue};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let queue = ProcessingQueue::from_config(&NominateConfig::default())?;
/// let id = queue.enqueue("scan_0001.pdf")?;
/// queue.wait_idle().await;
/// if let Some(name) = queue.get(id).and_then(|d| d.generated_filename) {
///     println!("suggested: {name}");
///     queue.accept(id).await?;
/// }
/// # Ok(())
/// # }
/// ```
pub struct ProcessingQueue {
    shared: Arc<Shared>,
    sender: Mutex<Option<mpsc::UnboundedSender<DocumentId>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ProcessingQueue {
    /// Start a queue over `pipeline`.
    ///
    /// Spawns the worker task, so this must be called within a Tokio runtime.
    pub fn new(pipeline: Arc<DocumentPipeline>, callback: Option<ProgressCallback>) -> Self {
        let (revision, _) = watch::channel(0u64);
        let shared = Arc::new(Shared {
            documents: Mutex::new(Vec::new()),
            accepting: Mutex::new(HashSet::new()),
            revision,
            callback: callback.unwrap_or_else(|| Arc::new(NoopProgressCallback)),
        });
        let (sender, receiver) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(Arc::clone(&shared), pipeline, receiver));

        Self {
            shared,
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Start a queue with the production pipeline described by `config`.
    pub fn from_config(config: &NominateConfig) -> Result<Self, NominateError> {
        let pipeline = DocumentPipeline::from_config(config)?;
        Ok(Self::new(Arc::new(pipeline), config.progress_callback.clone()))
    }

    /// Add a document; it will be processed after every document enqueued
    /// before it. Never blocks on queue depth.
    pub fn enqueue(&self, source: impl Into<String>) -> Result<DocumentId, NominateError> {
        let document = Document::new(source);
        let id = document.id;
        let source = document.source.clone();
        {
            let sender = self.sender.lock();
            let sender = sender.as_ref().ok_or(NominateError::QueueClosed)?;
            let mut docs = self.shared.documents.lock();
            sender.send(id).map_err(|_| NominateError::QueueClosed)?;
            docs.push(document);
        }
        self.shared.bump();
        self.shared.callback.on_document_queued(id, &source);
        debug!("Enqueued {} as {}", source, id);
        Ok(id)
    }

    /// Consistent copy of every document, in enqueue order.
    pub fn snapshot(&self) -> Vec<Document> {
        self.shared.documents.lock().clone()
    }

    pub fn get(&self, id: DocumentId) -> Option<Document> {
        self.shared
            .documents
            .lock()
            .iter()
            .find(|d| d.id == id)
            .cloned()
    }

    /// Revision counter bumped after every change to any document.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    /// `true` when no document is pending or running.
    pub fn is_idle(&self) -> bool {
        self.shared.is_idle()
    }

    /// Resolve once no document is pending or running.
    pub async fn wait_idle(&self) {
        let mut rx = self.shared.revision.subscribe();
        while !self.shared.is_idle() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Clear the suggestion and mark the document not processed.
    ///
    /// Idempotent; the source location is never touched.
    pub fn reject(&self, id: DocumentId) -> Result<(), NominateError> {
        self.shared
            .update(id, |doc| {
                doc.generated_filename = None;
                doc.processed = false;
            })
            .ok_or(NominateError::UnknownDocument { id })
    }

    /// Re-submit a finished document for a new run at the back of the queue.
    pub fn requeue(&self, id: DocumentId) -> Result<(), NominateError> {
        {
            let sender = self.sender.lock();
            let sender = sender.as_ref().ok_or(NominateError::QueueClosed)?;
            let mut docs = self.shared.documents.lock();
            let doc = docs
                .iter_mut()
                .find(|d| d.id == id)
                .ok_or(NominateError::UnknownDocument { id })?;
            if !doc.status.is_terminal() {
                return Err(NominateError::InvalidState {
                    id,
                    action: "requeued",
                    status: doc.status.to_string(),
                });
            }
            if self.shared.accepting.lock().contains(&id) {
                return Err(NominateError::InvalidState {
                    id,
                    action: "requeued",
                    status: "accepting".into(),
                });
            }
            sender.send(id).map_err(|_| NominateError::QueueClosed)?;
            doc.reset_for_run();
        }
        self.shared.bump();
        debug!("Requeued {}", id);
        Ok(())
    }

    /// Rename the source file to the generated filename and clear the suggestion.
    ///
    /// Returns the new path, which also becomes the document's source.
    pub async fn accept(&self, id: DocumentId) -> Result<PathBuf, NominateError> {
        let (source, filename) = {
            let docs = self.shared.documents.lock();
            let doc = docs
                .iter()
                .find(|d| d.id == id)
                .ok_or(NominateError::UnknownDocument { id })?;
            let filename = doc
                .generated_filename
                .clone()
                .ok_or(NominateError::NoSuggestion { id })?;
            if doc.status != DocumentStatus::Succeeded {
                return Err(NominateError::InvalidState {
                    id,
                    action: "accepted",
                    status: doc.status.to_string(),
                });
            }
            if !self.shared.accepting.lock().insert(id) {
                return Err(NominateError::InvalidState {
                    id,
                    action: "accepted",
                    status: "accepting".into(),
                });
            }
            (doc.source.clone(), filename)
        };
        let _accepting = AcceptGuard {
            shared: &self.shared,
            id,
        };

        if is_url(&source) {
            return Err(NominateError::NotLocalFile {
                source_location: source,
            });
        }
        if filename.is_empty() || filename.starts_with('.') {
            return Err(NominateError::EmptyFilename { id });
        }

        let target = rename::rename_to(Path::new(&source), &filename).await?;
        self.shared.update(id, |doc| {
            doc.source = target.to_string_lossy().into_owned();
            doc.generated_filename = None;
            doc.processed = true;
        });
        Ok(target)
    }

    /// Stop accepting documents and wait for the worker to finish the ones
    /// already accepted.
    pub async fn shutdown(&self) {
        self.sender.lock().take();
        let worker = self.worker.lock().take();
        if let Some(handle) = worker {
            if let Err(e) = handle.await {
                warn!("Queue worker ended abnormally: {}", e);
            }
        }
    }
}

/// Clears the in-flight accept mark however `accept` returns.
struct AcceptGuard<'a> {
    shared: &'a Shared,
    id: DocumentId,
}

impl Drop for AcceptGuard<'_> {
    fn drop(&mut self) {
        self.shared.accepting.lock().remove(&self.id);
    }
}

async fn run_worker(
    shared: Arc<Shared>,
    pipeline: Arc<DocumentPipeline>,
    mut receiver: mpsc::UnboundedReceiver<DocumentId>,
) {
    info!("Processing queue started (model: {})", pipeline.model_id());
    while let Some(id) = receiver.recv().await {
        process_document(&shared, &pipeline, id).await;
    }
    info!("Processing queue stopped");
}

async fn process_document(shared: &Shared, pipeline: &DocumentPipeline, id: DocumentId) {
    let source = shared.update(id, |doc| {
        doc.status = DocumentStatus::Running;
        doc.progress = 0.0;
        doc.generated_filename = None;
        doc.error = None;
        doc.source.clone()
    });
    let Some(source) = source else {
        warn!("Dequeued unknown document {}", id);
        return;
    };
    shared.callback.on_document_start(id, &source);
    info!("Processing {}", source);

    let on_stage = |stage: Stage| {
        let progress = shared.update(id, |doc| {
            doc.progress = doc.progress.max(stage.progress());
            doc.progress
        });
        if let Some(progress) = progress {
            shared.callback.on_stage_complete(id, stage, progress);
        }
    };

    match pipeline.run(&source, &on_stage).await {
        Ok(suggestion) => {
            let filename = suggestion.filename.clone();
            shared.update(id, |doc| {
                doc.status = DocumentStatus::Succeeded;
                doc.progress = 1.0;
                doc.generated_filename = Some(suggestion.filename);
                doc.resolved_date = suggestion.date;
                doc.summary = Some(suggestion.summary);
                doc.processed = true;
                doc.finished_at = Some(Utc::now());
            });
            shared.callback.on_document_complete(id, &filename);
        }
        Err(e) => {
            warn!("Failed to name {}: {}", source, e);
            let reason = FailureReason::from(&e);
            shared.update(id, |doc| {
                doc.status = DocumentStatus::Failed;
                doc.progress = 0.0;
                doc.processed = false;
                doc.error = Some(reason);
                doc.finished_at = Some(Utc::now());
            });
            shared.callback.on_document_failed(id, &e.to_string());
        }
    }
}
