//! Prompts for the three model calls of the naming pipeline.
//!
//! Centralising every prompt here keeps the wording in one place and lets unit
//! tests inspect the instructions without a live model. Each builder inlines
//! the document-specific part (text, summary, date) into a single user-role
//! message; there is no system prompt.

/// Literal the date prompt asks for when the document carries no date.
///
/// Compared verbatim (after trimming) against the model answer.
pub const NO_DATE_SENTINEL: &str = "No date found";

/// Upper bound on summary length requested from the model.
///
/// Requested only; the answer is not re-counted or truncated locally.
pub const SUMMARY_MAX_WORDS: usize = 250;

/// Upper bound on the descriptive name requested from the model.
pub const FILENAME_MAX_WORDS: usize = 12;

/// Build the date-extraction prompt.
pub fn date_prompt(document: &str) -> String {
    format!(
        "You extract the single most relevant date from a document.\n\
\n\
1. Find every date mentioned in the document below.\n\
2. When there are several, pick the one that best dates the document itself \
(issue date, invoice date, date of service, signature date, timestamp).\n\
3. When there is none, answer \"{NO_DATE_SENTINEL}\".\n\
\n\
Answer with the date formatted as YYYY-MM-DD or with \"{NO_DATE_SENTINEL}\". \
Do not write anything else.\n\
\n\
Document content:\n\
{document}"
    )
}

/// Build the summarisation prompt.
pub fn summary_prompt(document: &str) -> String {
    format!(
        "You summarise documents.\n\
\n\
1. Identify the main topic or purpose of the document below.\n\
2. Capture its key points and important details in a neutral tone.\n\
3. For a report, include the main findings and recommendations.\n\
4. For a narrative, include the main events and people.\n\
5. For an invoice or bill, name the supplier and the customer, patient, student or beneficiary.\n\
6. Use at most {SUMMARY_MAX_WORDS} words.\n\
\n\
Answer with the summary only. Do not write anything else.\n\
\n\
Document content:\n\
{document}"
    )
}

/// Build the filename prompt.
///
/// `date` is the already-resolved `YYYY-MM-DD` string; the model is told not
/// to repeat it because the synthesizer prepends it itself.
pub fn filename_prompt(summary: &str, date: Option<&str>) -> String {
    let date_rule = date
        .map(|d| format!("Do not include this date in the name: {d}\n"))
        .unwrap_or_default();

    format!(
        "From the summary below, write a specific, descriptive file name that captures what the document is.\n\
Use at most {FILENAME_MAX_WORDS} words.\n\
Use nouns; do not start with verbs such as 'depicts', 'shows' or 'presents'.\n\
Do not include words describing the file type such as 'text', 'document' or 'pdf'.\n\
Separate words with single spaces.\n\
{date_rule}\
\n\
Summary: {summary}\n\
\n\
Answer with the file name only, without any other text.\n\
\n\
Filename:"
    )
}
