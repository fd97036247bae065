//! Document state observed by callers of the processing queue.
//!
//! A [`Document`] is created when a source is enqueued, mutated only by the
//! queue (worker runs, accept/reject/requeue), and never deleted. Snapshots
//! handed out to callers are plain clones, so they can be rendered, diffed or
//! serialised without holding any lock.

use crate::error::FailureReason;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable unique identity of an enqueued document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Processing status: `pending → running → {succeeded, failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl DocumentStatus {
    /// `true` once a run has finished, whichever way.
    pub fn is_terminal(self) -> bool {
        matches!(self, DocumentStatus::Succeeded | DocumentStatus::Failed)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::Running => "running",
            DocumentStatus::Succeeded => "succeeded",
            DocumentStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Result of one successful pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameSuggestion {
    /// Sanitised filename including the extension suffix.
    pub filename: String,
    /// Date resolved from the document text, if any.
    pub date: Option<NaiveDate>,
    /// Model-written summary the filename was derived from.
    pub summary: String,
}

/// One document tracked by the queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    /// Local path or HTTP(S) URL of the source PDF.
    pub source: String,
    pub status: DocumentStatus,
    /// Fraction in `[0, 1]`; monotonic within a run, reset to 0 on a new run
    /// or on failure.
    pub progress: f32,
    /// Present once filename synthesis succeeded and until accepted or rejected.
    pub generated_filename: Option<String>,
    pub resolved_date: Option<NaiveDate>,
    pub summary: Option<String>,
    /// Set when a suggestion was produced or accepted; cleared on reject.
    pub processed: bool,
    /// Why the last run failed.
    pub error: Option<FailureReason>,
    pub enqueued_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Document {
    pub(crate) fn new(source: impl Into<String>) -> Self {
        Self {
            id: DocumentId::new(),
            source: source.into(),
            status: DocumentStatus::Pending,
            progress: 0.0,
            generated_filename: None,
            resolved_date: None,
            summary: None,
            processed: false,
            error: None,
            enqueued_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Reset per-run fields before a (re)submission.
    pub(crate) fn reset_for_run(&mut self) {
        self.status = DocumentStatus::Pending;
        self.progress = 0.0;
        self.generated_filename = None;
        self.error = None;
        self.finished_at = None;
    }

    /// Last path component of the source, for display.
    pub fn display_name(&self) -> &str {
        display_name(&self.source)
    }
}

/// Last path or URL component of `source`.
pub fn display_name(source: &str) -> &str {
    source
        .trim_end_matches('/')
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(source)
}
