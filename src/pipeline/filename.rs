//! Filename synthesis: ask the model for a descriptive phrase, then turn it
//! into a legal filename.
//!
//! ## Sanitisation
//!
//! 1. Strip label echoes (`Filename:`, `Title:` …), quotes and backticks
//! 2. Split into words (maximal alphanumeric runs)
//! 3. Drop a `YYYY MM DD` run equal to the resolved date
//! 4. Drop every word whose lemma or lowercase form is a stop word
//! 5. Prepend the resolved date as `YYYY-MM-DD`
//! 6. Join with single spaces while the stem plus `.ext` fits in
//!    [`MAX_FILENAME_BYTES`]; the first word that does not fit ends the name
//!
//! Words keep the casing the model gave them. An empty stem is valid output.

use crate::error::ModelInvocationError;
use crate::pipeline::date::DATE_FORMAT;
use crate::pipeline::lemma::lemmatize;
use crate::pipeline::llm::ChatModel;
use crate::prompts::filename_prompt;
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

/// Upper bound on a filename in UTF-8 bytes, extension included.
pub const MAX_FILENAME_BYTES: usize = 255;

/// Generic and structural words never kept in a filename.
pub static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // articles and pronouns
        "the", "a", "an", "i", "we", "you", "they", "he", "she", "it",
        // conjunctions and prepositions
        "and", "but", "or", "in", "on", "of", "with", "by", "for", "to", "from", "as", "at",
        "about", "into", "through", "above", "below", "before", "after", "during",
        // auxiliaries
        "is", "are", "were", "was", "be", "have", "has", "had", "do", "does", "did", "can",
        "will", "should",
        // determiners and fillers
        "that", "which", "this", "only", "just", "very", "new", "more", "most", "other",
        "some", "such", "own", "same", "now", "few", "any", "each", "so", "than", "too",
        "no", "nor", "not", "don", "if", "because", "s", "t",
        // generic document vocabulary
        "based", "generated", "filename", "file", "document", "text", "output", "category",
        "summary", "key", "details", "information", "note", "notes", "main", "ideas",
        "concepts",
        // describing verbs
        "depicts", "show", "shows", "display", "illustrates", "presents", "features",
        "provides", "covers", "includes", "discusses", "demonstrates", "describes",
    ]
    .into_iter()
    .collect()
});

/// Leading labels the model sometimes echoes back from the prompt.
static RE_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:file\s*name|title|name)\s*:\s*").unwrap());

/// Ask the model for a name and sanitise it.
///
/// `extension` is the source file's extension without the dot.
pub async fn synthesize(
    model: &dyn ChatModel,
    summary: &str,
    date: Option<NaiveDate>,
    extension: Option<&str>,
    temperature: f32,
) -> Result<String, ModelInvocationError> {
    let date_token = date.map(|d| d.format(DATE_FORMAT).to_string());
    let prompt = filename_prompt(summary, date_token.as_deref());
    let answer = model.complete(&prompt, temperature).await?;
    let filename = sanitize(&answer, date, extension);
    debug!("Filename answer {:?} → {:?}", answer.trim(), filename);
    Ok(filename)
}

/// Turn a raw model answer into a filename.
pub fn sanitize(raw: &str, date: Option<NaiveDate>, extension: Option<&str>) -> String {
    let cleaned = strip_label(raw);
    let mut words = tokenize(&cleaned);
    if let Some(d) = date {
        remove_date_echo(&mut words, d);
    }

    let mut tokens: Vec<&str> = Vec::with_capacity(words.len() + 1);
    let date_token = date.map(|d| d.format(DATE_FORMAT).to_string());
    if let Some(ref d) = date_token {
        tokens.push(d);
    }
    tokens.extend(words.into_iter().filter(|w| !is_stop_word(w)));

    let suffix = extension_suffix(extension);
    let stem = join_within(&tokens, MAX_FILENAME_BYTES - suffix.len());
    format!("{stem}{suffix}")
}

/// True when `word` or its lemma is in [`STOP_WORDS`].
pub fn is_stop_word(word: &str) -> bool {
    let lower = word.to_lowercase();
    STOP_WORDS.contains(lower.as_str()) || STOP_WORDS.contains(lemmatize(&lower).as_str())
}

fn strip_label(raw: &str) -> String {
    let trimmed = raw.trim();
    let unlabelled = RE_LABEL.replace(trimmed, "");
    unlabelled
        .replace(['"', '`', '\u{201C}', '\u{201D}'], "")
        .trim()
        .to_string()
}

fn tokenize(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Remove the first `YYYY MM DD` word run naming `date`.
fn remove_date_echo(words: &mut Vec<&str>, date: NaiveDate) {
    let matches_at = |i: usize| {
        words[i].parse::<i32>().ok() == Some(date.year())
            && words[i + 1].parse::<u32>().ok() == Some(date.month())
            && words[i + 2].parse::<u32>().ok() == Some(date.day())
    };
    if words.len() < 3 {
        return;
    }
    if let Some(i) = (0..=words.len() - 3).find(|&i| matches_at(i)) {
        words.drain(i..i + 3);
    }
}

/// `.ext`, or nothing when there is no extension or it could never fit.
fn extension_suffix(extension: Option<&str>) -> String {
    match extension.filter(|e| !e.is_empty()) {
        Some(ext) if ext.len() < MAX_FILENAME_BYTES => format!(".{ext}"),
        _ => String::new(),
    }
}

/// Join tokens with spaces, stopping at the first one that exceeds `budget` bytes.
fn join_within(tokens: &[&str], budget: usize) -> String {
    let mut stem = String::new();
    for token in tokens {
        let extra = if stem.is_empty() { token.len() } else { token.len() + 1 };
        if stem.len() + extra > budget {
            break;
        }
        if !stem.is_empty() {
            stem.push(' ');
        }
        stem.push_str(token);
    }
    stem
}
