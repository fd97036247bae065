//! Integration tests for the processing queue.
//!
//! The queue runs the real pipeline stages (input resolution, date parsing,
//! filename sanitisation) against two in-process fakes: a scripted
//! `ChatModel` that answers by prompt kind, and a `TextExtractor` that reads
//! the bytes after a minimal `%PDF` header. No pdfium library or model server
//! is needed.
//!
//! Run with:
//!   RUST_LOG=nominate=debug cargo test --test queue -- --nocapture

use async_trait::async_trait;
use nominate::{
    ChatModel, DocumentId, DocumentPipeline, DocumentStatus, ExtractionError, FailureKind,
    ModelInvocationError, NominateConfig, NominateError, ProcessingQueue, ProgressCallback,
    QueueProgressCallback, Stage, TextExtractor,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const HEADER: &[u8] = b"%PDF-1.4\n";

// ── Fakes ────────────────────────────────────────────────────────────────────

/// Returns the bytes after the PDF header as text; `CORRUPT` bodies fail.
struct FakeExtractor;

#[async_trait]
impl TextExtractor for FakeExtractor {
    async fn extract(&self, path: &Path, _password: Option<&str>) -> Result<String, ExtractionError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ExtractionError::Internal(e.to_string()))?;
        let body = String::from_utf8_lossy(&bytes[HEADER.len().min(bytes.len())..]).into_owned();
        if body.contains("CORRUPT") {
            return Err(ExtractionError::CorruptPdf {
                path: path.to_path_buf(),
                detail: "startxref not found".into(),
            });
        }
        Ok(body)
    }
}

/// Answers by prompt kind and records how many calls overlap.
struct ScriptedModel {
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedModel {
    fn new(delay_ms: u64) -> Arc<Self> {
        Arc::new(Self {
            delay: Duration::from_millis(delay_ms),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    fn answer(prompt: &str) -> Result<String, ModelInvocationError> {
        if prompt.contains("FAIL_MODEL") {
            return Err(ModelInvocationError::Transport {
                message: "connection refused".into(),
            });
        }
        let answer = if prompt.starts_with("You extract") {
            if prompt.contains("November 15, 2023") {
                "2023-11-15".to_string()
            } else {
                "No date found".to_string()
            }
        } else if prompt.starts_with("You summarise") {
            if prompt.contains("Acme") {
                "Q4 financial report for Acme Corp".to_string()
            } else {
                let body = prompt.rsplit("Document content:\n").next().unwrap_or("");
                format!("Report about {}", body.trim())
            }
        } else {
            let summary = prompt
                .split("Summary: ")
                .nth(1)
                .and_then(|rest| rest.lines().next())
                .unwrap_or("");
            if summary.contains("Acme") {
                "Acme Corp Q4 Financial Report 2023-11-15".to_string()
            } else {
                format!("Filename: {summary}")
            }
        };
        Ok(answer)
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn model_id(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, ModelInvocationError> {
        assert_eq!(temperature, 0.0, "every call must be deterministic");
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Self::answer(prompt)
    }
}

/// Records callback events.
#[derive(Default)]
struct Recorder {
    started: Mutex<Vec<DocumentId>>,
    finished: Mutex<Vec<DocumentId>>,
    running: AtomicUsize,
    max_running: AtomicUsize,
    progress: Mutex<HashMap<DocumentId, Vec<f32>>>,
}

impl QueueProgressCallback for Recorder {
    fn on_document_start(&self, id: DocumentId, _source: &str) {
        self.started.lock().push(id);
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(now, Ordering::SeqCst);
    }

    fn on_stage_complete(&self, id: DocumentId, _stage: Stage, progress: f32) {
        self.progress.lock().entry(id).or_default().push(progress);
    }

    fn on_document_complete(&self, id: DocumentId, _filename: &str) {
        self.running.fetch_sub(1, Ordering::SeqCst);
        self.finished.lock().push(id);
    }

    fn on_document_failed(&self, id: DocumentId, _error: &str) {
        self.running.fetch_sub(1, Ordering::SeqCst);
        self.finished.lock().push(id);
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

struct Harness {
    queue: ProcessingQueue,
    model: Arc<ScriptedModel>,
    recorder: Arc<Recorder>,
    dir: TempDir,
}

fn harness(delay_ms: u64) -> Harness {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let model = ScriptedModel::new(delay_ms);
    let recorder = Arc::new(Recorder::default());
    let pipeline = DocumentPipeline::new(
        Arc::new(FakeExtractor),
        model.clone(),
        &NominateConfig::default(),
    );
    let queue = ProcessingQueue::new(
        Arc::new(pipeline),
        Some(recorder.clone() as ProgressCallback),
    );
    Harness {
        queue,
        model,
        recorder,
        dir: tempfile::tempdir().unwrap(),
    }
}

impl Harness {
    fn pdf(&self, name: &str, body: &str) -> String {
        let path = self.dir.path().join(name);
        let mut bytes = HEADER.to_vec();
        bytes.extend_from_slice(body.as_bytes());
        std::fs::write(&path, bytes).unwrap();
        path.to_string_lossy().into_owned()
    }

    async fn drain(&self) {
        tokio::time::timeout(Duration::from_secs(10), self.queue.wait_idle())
            .await
            .expect("queue did not become idle");
    }
}

// ── Scheduling ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn documents_complete_in_enqueue_order_one_at_a_time() {
    let h = harness(2);
    let names = ["alpha", "bravo", "charlie", "delta", "echo"];
    let ids: Vec<DocumentId> = names
        .iter()
        .map(|n| h.queue.enqueue(h.pdf(&format!("{n}.pdf"), n)).unwrap())
        .collect();

    h.drain().await;

    assert_eq!(*h.recorder.started.lock(), ids);
    assert_eq!(*h.recorder.finished.lock(), ids);
    assert_eq!(h.recorder.max_running.load(Ordering::SeqCst), 1);
    assert_eq!(h.model.max_in_flight.load(Ordering::SeqCst), 1);

    let snapshot = h.queue.snapshot();
    let snapshot_ids: Vec<DocumentId> = snapshot.iter().map(|d| d.id).collect();
    assert_eq!(snapshot_ids, ids);
    for (doc, name) in snapshot.iter().zip(names) {
        assert_eq!(doc.status, DocumentStatus::Succeeded);
        assert_eq!(doc.progress, 1.0);
        assert_eq!(
            doc.generated_filename.as_deref(),
            Some(format!("Report {name}.pdf").as_str())
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_enqueues_keep_a_single_fifo() {
    let h = harness(1);
    let queue = Arc::new(h.queue);
    let sources: Vec<String> = (0..12)
        .map(|i| {
            let path = h.dir.path().join(format!("doc{i}.pdf"));
            std::fs::write(&path, [HEADER, format!("doc{i}").as_bytes()].concat()).unwrap();
            path.to_string_lossy().into_owned()
        })
        .collect();

    let tasks: Vec<_> = sources
        .into_iter()
        .map(|s| {
            let q = Arc::clone(&queue);
            tokio::spawn(async move { q.enqueue(s).unwrap() })
        })
        .collect();
    for t in futures::future::join_all(tasks).await {
        t.unwrap();
    }

    tokio::time::timeout(Duration::from_secs(10), queue.wait_idle())
        .await
        .expect("queue did not become idle");

    let order: Vec<DocumentId> = queue.snapshot().iter().map(|d| d.id).collect();
    assert_eq!(order.len(), 12);
    assert_eq!(*h.recorder.started.lock(), order);
    assert_eq!(h.recorder.max_running.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn progress_is_monotonic_and_reaches_one() {
    let h = harness(0);
    let id = h.queue.enqueue(h.pdf("a.pdf", "alpha")).unwrap();
    h.drain().await;

    let progress = h.recorder.progress.lock().get(&id).cloned().unwrap();
    assert_eq!(progress, vec![0.25, 0.5, 0.75, 1.0]);
}

// ── Failure containment ──────────────────────────────────────────────────────

#[tokio::test]
async fn corrupt_document_fails_and_the_next_one_still_runs() {
    let h = harness(0);
    let bad = h.queue.enqueue(h.pdf("bad.pdf", "CORRUPT")).unwrap();
    let good = h.queue.enqueue(h.pdf("good.pdf", "bravo")).unwrap();
    h.drain().await;

    let bad = h.queue.get(bad).unwrap();
    assert_eq!(bad.status, DocumentStatus::Failed);
    assert_eq!(bad.progress, 0.0);
    assert!(bad.generated_filename.is_none());
    let reason = bad.error.unwrap();
    assert_eq!(reason.kind, FailureKind::Extraction);
    assert!(reason.message.contains("startxref"), "got: {}", reason.message);

    let good = h.queue.get(good).unwrap();
    assert_eq!(good.status, DocumentStatus::Succeeded);
    assert_eq!(good.generated_filename.as_deref(), Some("Report bravo.pdf"));
}

#[tokio::test]
async fn model_failure_in_the_middle_of_three_documents() {
    let h = harness(0);
    let a = h.queue.enqueue(h.pdf("a.pdf", "alpha")).unwrap();
    let b = h.queue.enqueue(h.pdf("b.pdf", "FAIL_MODEL")).unwrap();
    let c = h.queue.enqueue(h.pdf("c.pdf", "charlie")).unwrap();
    h.drain().await;

    let docs: HashMap<DocumentId, _> = h.queue.snapshot().into_iter().map(|d| (d.id, d)).collect();
    assert_eq!(docs[&a].status, DocumentStatus::Succeeded);
    assert_eq!(docs[&c].status, DocumentStatus::Succeeded);

    let failed = &docs[&b];
    assert_eq!(failed.status, DocumentStatus::Failed);
    assert_eq!(failed.progress, 0.0);
    let reason = failed.error.as_ref().unwrap();
    assert_eq!(reason.kind, FailureKind::ModelInvocation);
    assert!(reason.message.starts_with("date stage"), "got: {}", reason.message);

    assert_eq!(*h.recorder.finished.lock(), vec![a, b, c]);
}

#[tokio::test]
async fn missing_file_fails_without_blocking_the_queue() {
    let h = harness(0);
    let missing = h.queue.enqueue("/definitely/not/here.pdf").unwrap();
    let ok = h.queue.enqueue(h.pdf("ok.pdf", "delta")).unwrap();
    h.drain().await;

    assert_eq!(h.queue.get(missing).unwrap().status, DocumentStatus::Failed);
    assert_eq!(h.queue.get(ok).unwrap().status, DocumentStatus::Succeeded);
}

// ── Naming ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn resolved_date_is_prefixed_exactly_once() {
    let h = harness(0);
    let id = h
        .queue
        .enqueue(h.pdf("scan_0001.pdf", "Acme Corp\nQuarterly report\nIssued November 15, 2023"))
        .unwrap();
    h.drain().await;

    let doc = h.queue.get(id).unwrap();
    let name = doc.generated_filename.unwrap();
    assert_eq!(name, "2023-11-15 Acme Corp Q4 Financial Report.pdf");
    assert!(name.starts_with("2023-11-15 "));
    assert_eq!(name.matches("2023").count(), 1);
    assert_eq!(doc.resolved_date.unwrap().to_string(), "2023-11-15");
    assert_eq!(doc.summary.as_deref(), Some("Q4 financial report for Acme Corp"));
    assert!(doc.processed);
}

// ── Caller actions ───────────────────────────────────────────────────────────

#[tokio::test]
async fn reject_is_idempotent_and_keeps_the_source() {
    let h = harness(0);
    let source = h.pdf("a.pdf", "alpha");
    let id = h.queue.enqueue(source.clone()).unwrap();
    h.drain().await;

    h.queue.reject(id).unwrap();
    let once = h.queue.get(id).unwrap();
    h.queue.reject(id).unwrap();
    let twice = h.queue.get(id).unwrap();

    for doc in [&once, &twice] {
        assert_eq!(doc.source, source);
        assert!(doc.generated_filename.is_none());
        assert!(!doc.processed);
    }
    assert!(Path::new(&source).exists());
    assert!(matches!(
        h.queue.accept(id).await,
        Err(NominateError::NoSuggestion { .. })
    ));
}

#[tokio::test]
async fn accept_renames_the_file_next_to_itself() {
    let h = harness(0);
    let source = h.pdf("scan_0007.pdf", "echo");
    let id = h.queue.enqueue(source.clone()).unwrap();
    h.drain().await;

    let target = h.queue.accept(id).await.unwrap();
    assert_eq!(target, h.dir.path().join("Report echo.pdf"));
    assert!(target.exists());
    assert!(!Path::new(&source).exists());

    let doc = h.queue.get(id).unwrap();
    assert_eq!(PathBuf::from(&doc.source), target);
    assert!(doc.generated_filename.is_none());
    assert!(doc.processed);
}

#[tokio::test]
async fn accept_never_overwrites() {
    let h = harness(0);
    let existing = h.pdf("Report foxtrot.pdf", "already here");
    let id = h.queue.enqueue(h.pdf("new.pdf", "foxtrot")).unwrap();
    h.drain().await;

    let err = h.queue.accept(id).await.unwrap_err();
    assert!(matches!(err, NominateError::TargetExists { .. }));
    assert_eq!(std::fs::read(&existing).unwrap(), [HEADER, &b"already here"[..]].concat());
    assert!(h.queue.get(id).unwrap().generated_filename.is_some());
}

#[tokio::test]
async fn requeue_reruns_a_finished_document() {
    let h = harness(0);
    let id = h.queue.enqueue(h.pdf("a.pdf", "alpha")).unwrap();
    h.drain().await;
    h.queue.reject(id).unwrap();

    h.queue.requeue(id).unwrap();
    h.drain().await;

    let doc = h.queue.get(id).unwrap();
    assert_eq!(doc.status, DocumentStatus::Succeeded);
    assert_eq!(doc.generated_filename.as_deref(), Some("Report alpha.pdf"));
    assert_eq!(*h.recorder.started.lock(), vec![id, id]);
}

#[tokio::test]
async fn requeue_refuses_unfinished_documents() {
    let h = harness(50);
    let id = h.queue.enqueue(h.pdf("slow.pdf", "golf")).unwrap();

    let err = h.queue.requeue(id).unwrap_err();
    assert!(matches!(err, NominateError::InvalidState { .. }), "got: {err}");
    h.drain().await;
    assert_eq!(h.recorder.started.lock().len(), 1);
}

// ── Observation ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn subscribers_see_revisions() {
    let h = harness(0);
    let mut rx = h.queue.subscribe();
    h.queue.enqueue(h.pdf("a.pdf", "alpha")).unwrap();

    tokio::time::timeout(Duration::from_secs(5), rx.changed())
        .await
        .expect("no revision published")
        .unwrap();
    h.drain().await;
    assert!(*rx.borrow_and_update() >= 1);
}

#[tokio::test]
async fn shutdown_drains_accepted_documents() {
    let h = harness(5);
    let ids: Vec<DocumentId> = ["alpha", "bravo", "charlie"]
        .iter()
        .map(|n| h.queue.enqueue(h.pdf(&format!("{n}.pdf"), n)).unwrap())
        .collect();

    tokio::time::timeout(Duration::from_secs(10), h.queue.shutdown())
        .await
        .expect("shutdown hung");

    for id in ids {
        assert_eq!(h.queue.get(id).unwrap().status, DocumentStatus::Succeeded);
    }
    assert!(matches!(
        h.queue.enqueue("/tmp/late.pdf"),
        Err(NominateError::QueueClosed)
    ));
}
