//! Pipeline stages for document naming.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and the two I/O boundaries ([`extract::TextExtractor`] and
//! [`llm::ChatModel`]) can be replaced by in-process fakes.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ date ──▶ summarize ──▶ filename
//! (URL/path) (pdfium)   (LLM)     (LLM)         (LLM + sanitise)
//! ```
//!
//! 1. [`input`]     — canonicalise the path or URL to a local PDF file
//! 2. [`extract`]   — concatenate page text; runs in `spawn_blocking` because
//!    pdfium is not async-safe
//! 3. [`date`]      — ask for the most relevant date, parse or detect it
//! 4. [`summarize`] — ask for a bounded summary
//! 5. [`filename`]  — ask for a descriptive phrase and sanitise it with
//!    [`lemma`]-based stop-word filtering and byte-safe truncation
//!
//! [`llm`] is the single model-invocation boundary shared by steps 3–5.

pub mod date;
pub mod extract;
pub mod filename;
pub mod input;
pub mod lemma;
pub mod llm;
pub mod summarize;
