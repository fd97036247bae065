//! # nominate
//!
//! Name PDF documents from their content: find the date that matters, summarise
//! the document, and turn a language model's description into a clean,
//! filesystem-safe filename.
//!
//! ## Why this crate?
//!
//! Scanners and download folders produce `scan_0001.pdf` and `document(3).pdf`.
//! The information needed for a good name (who sent it, what it is, when) is in
//! the text. This crate reads that text with pdfium, asks a model three narrow
//! questions, and keeps the answer deterministic: temperature 0, a fixed
//! stop-word filter, and byte-accurate truncation to 255 bytes.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      resolve local file or download from URL
//!  ├─ 2. Extract    concatenate page text via pdfium (spawn_blocking)
//!  ├─ 3. Date       "most relevant date" → YYYY-MM-DD, sentinel, or detection
//!  ├─ 4. Summarize  ≤ 250-word summary
//!  └─ 5. Filename   descriptive phrase → label cleanup, stop words, date
//!                   prefix, 255-byte limit
//! ```
//!
//! Documents go through a [`ProcessingQueue`]: strict FIFO, one document in
//! flight at a time, every failure contained to its own document.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nominate::{NominateConfig, ProcessingQueue};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Ollama + llama3.2 unless EDGEQUAKE_LLM_PROVIDER / EDGEQUAKE_MODEL say otherwise
//!     let config = NominateConfig::default();
//!     let queue = ProcessingQueue::from_config(&config)?;
//!     for path in ["scan_0001.pdf", "scan_0002.pdf"] {
//!         queue.enqueue(path)?;
//!     }
//!     queue.wait_idle().await;
//!     for doc in queue.snapshot() {
//!         println!("{} → {:?}", doc.source, doc.generated_filename);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `nominate` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! nominate = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod document;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod queue;
pub mod rename;
pub mod suggest;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{NominateConfig, NominateConfigBuilder};
pub use document::{Document, DocumentId, DocumentStatus, NameSuggestion};
pub use error::{ExtractionError, FailureKind, FailureReason, ModelInvocationError, NominateError};
pub use pipeline::extract::{PdfiumExtractor, TextExtractor};
pub use pipeline::llm::{ChatModel, LlmChatModel};
pub use progress::{NoopProgressCallback, ProgressCallback, QueueProgressCallback};
pub use queue::ProcessingQueue;
pub use suggest::{suggest_name, suggest_name_sync, DocumentPipeline, Stage};
