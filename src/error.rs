//! Error types for the nominate library.
//!
//! Three layers reflect three distinct failure scopes:
//!
//! * [`ExtractionError`] — the source could not be read as a PDF (missing
//!   file, wrong magic bytes, corrupt xref, failed download). Fatal for the
//!   current run of one document.
//!
//! * [`ModelInvocationError`] — the chat-completion transport failed
//!   (connection refused, provider error, timeout). Also fatal for the current
//!   run of one document. Unparsable *content* returned by the model is never
//!   reported here; the pipeline stages absorb it.
//!
//! * [`NominateError`] — everything a public operation can return, wrapping the
//!   two above plus queue, configuration and rename failures.
//!
//! A failed document keeps a serialisable [`FailureReason`] so observers can
//! show why it failed after the error value itself is gone. One document's
//! failure never stops the queue.

use crate::document::DocumentId;
use crate::suggest::Stage;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// The source document could not be opened or parsed.
#[derive(Debug, Error)]
pub enum ExtractionError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a usable file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// No pdfium library could be bound.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumUnavailable(String),

    /// Unexpected internal error (blocking task panicked, temp file I/O).
    #[error("Internal extraction error: {0}")]
    Internal(String),
}

/// The chat-completion call itself failed.
#[derive(Debug, Clone, Error)]
pub enum ModelInvocationError {
    /// Provider or network error reported by the transport.
    #[error("model call failed: {message}")]
    Transport { message: String },

    /// The call did not finish within the configured timeout.
    #[error("model call timed out after {secs}s")]
    Timeout { secs: u64 },
}

/// All errors returned by public nominate operations.
#[derive(Debug, Error)]
pub enum NominateError {
    // ── Pipeline errors ───────────────────────────────────────────────────
    /// Text extraction failed.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// A model call failed during the given stage.
    #[error("{stage} stage: {source}")]
    ModelInvocation {
        stage: Stage,
        #[source]
        source: ModelInvocationError,
    },

    // ── LLM setup errors ──────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Queue errors ──────────────────────────────────────────────────────
    /// No document with this id was ever enqueued.
    #[error("Unknown document {id}")]
    UnknownDocument { id: DocumentId },

    /// The document has no generated filename to accept.
    #[error("Document {id} has no filename suggestion")]
    NoSuggestion { id: DocumentId },

    /// Every word of the suggestion was filtered out; there is no name to apply.
    #[error("Document {id} has an empty filename suggestion")]
    EmptyFilename { id: DocumentId },

    /// The requested transition is not allowed from the document's state.
    #[error("Document {id} cannot be {action} while {status}")]
    InvalidState {
        id: DocumentId,
        action: &'static str,
        status: String,
    },

    /// The processing worker has stopped and no longer accepts documents.
    #[error("Processing queue is closed")]
    QueueClosed,

    // ── Rename errors ─────────────────────────────────────────────────────
    /// The document source is a URL; there is no local file to rename.
    #[error("Source '{source_location}' is not a local file and cannot be renamed")]
    NotLocalFile { source_location: String },

    /// Renaming would overwrite an existing file.
    #[error("Refusing to overwrite existing file '{path}'")]
    TargetExists { path: PathBuf },

    /// The rename syscall failed.
    #[error("Failed to rename '{from}' to '{to}': {source}")]
    RenameFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl NominateError {
    /// Attach the pipeline stage to a transport failure.
    pub fn model(stage: Stage, source: ModelInvocationError) -> Self {
        Self::ModelInvocation { stage, source }
    }

    /// Coarse classification used for [`FailureReason`].
    pub fn kind(&self) -> FailureKind {
        match self {
            NominateError::Extraction(_) => FailureKind::Extraction,
            NominateError::ModelInvocation { .. } | NominateError::ProviderNotConfigured { .. } => {
                FailureKind::ModelInvocation
            }
            _ => FailureKind::Other,
        }
    }
}

/// Which part of the taxonomy a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Extraction,
    ModelInvocation,
    Other,
}

/// The retained reason a document's last run failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReason {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&NominateError> for FailureReason {
    fn from(err: &NominateError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
