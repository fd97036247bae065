//! Rule-based English lemmatizer used for stop-word matching.
//!
//! Only good enough to map inflected forms ("shows", "based", "documents")
//! onto the base forms listed in the stop-word set. The output is never
//! written into a filename, so an imperfect lemma costs at most one word that
//! could have been filtered.

use once_cell::sync::Lazy;
use std::collections::HashMap;

static IRREGULAR: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("am", "be"),
        ("is", "be"),
        ("are", "be"),
        ("was", "be"),
        ("were", "be"),
        ("been", "be"),
        ("being", "be"),
        ("has", "have"),
        ("had", "have"),
        ("having", "have"),
        ("does", "do"),
        ("did", "do"),
        ("done", "do"),
        ("doing", "do"),
        ("goes", "go"),
        ("went", "go"),
        ("gone", "go"),
        ("men", "man"),
        ("women", "woman"),
        ("children", "child"),
        ("people", "person"),
        ("feet", "foot"),
        ("teeth", "tooth"),
        ("mice", "mouse"),
        ("made", "make"),
        ("paid", "pay"),
        ("said", "say"),
        ("shown", "show"),
        ("written", "write"),
        ("wrote", "write"),
        ("given", "give"),
        ("gave", "give"),
        ("taken", "take"),
        ("took", "take"),
        ("seen", "see"),
        ("saw", "see"),
        ("bought", "buy"),
        ("brought", "bring"),
        ("sent", "send"),
        ("built", "build"),
        ("held", "hold"),
        ("kept", "keep"),
        ("left", "leave"),
        ("lost", "lose"),
        ("met", "meet"),
        ("sold", "sell"),
        ("told", "tell"),
        ("found", "find"),
    ]
    .into_iter()
    .collect()
});

/// Words that look inflected but are already base forms.
const INVARIANT: &[&str] = &[
    "news",
    "series",
    "species",
    "during",
    "thing",
    "nothing",
    "something",
    "anything",
    "everything",
    "morning",
    "evening",
    "string",
    "bring",
    "this",
    "thus",
];

/// Endings that are not plural markers ("class", "status", "analysis", "famous").
const PROTECTED_ENDINGS: &[&str] = &["ss", "us", "is", "ous"];

/// Reduce `word` to an approximate base form, lowercased.
pub fn lemmatize(word: &str) -> String {
    let word = word.to_lowercase();
    if let Some(base) = IRREGULAR.get(word.as_str()) {
        return (*base).to_string();
    }
    if word.chars().count() <= 3 {
        return word;
    }
    if INVARIANT.contains(&word.as_str()) {
        return word;
    }

    let singular = strip_plural(&word);
    strip_verb_suffix(&singular)
}

fn strip_plural(word: &str) -> String {
    if PROTECTED_ENDINGS.iter().any(|e| word.ends_with(e)) {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix("ies") {
        if word.len() > 4 {
            return format!("{stem}y");
        }
        return word.to_string();
    }
    for suffix in ["sses", "ches", "shes", "xes", "zes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    match word.strip_suffix('s') {
        Some(stem) if has_vowel(stem) => stem.to_string(),
        _ => word.to_string(),
    }
}

fn strip_verb_suffix(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ied") {
        if word.len() > 4 {
            return format!("{stem}y");
        }
    }
    if word.len() > 4 && !word.ends_with("eed") {
        if let Some(stem) = word.strip_suffix("ed") {
            if has_vowel(stem) {
                return restore_stem(stem);
            }
        }
    }
    if word.len() > 5 {
        if let Some(stem) = word.strip_suffix("ing") {
            if has_vowel(stem) {
                return restore_stem(stem);
            }
        }
    }
    word.to_string()
}

/// Repair a stem after "-ed"/"-ing" removal: "planned" → "plan", "making" → "make".
fn restore_stem(stem: &str) -> String {
    let chars: Vec<char> = stem.chars().collect();
    let cons = consonant_flags(&chars);
    let n = chars.len();

    if n >= 2 && chars[n - 1] == chars[n - 2] && cons[n - 1] {
        if !matches!(chars[n - 1], 'l' | 's' | 'z') {
            return chars[..n - 1].iter().collect();
        }
        return stem.to_string();
    }

    if measure(&cons) == 1 && ends_cvc(&chars, &cons) {
        return format!("{stem}e");
    }
    stem.to_string()
}

fn has_vowel(s: &str) -> bool {
    let chars: Vec<char> = s.chars().collect();
    consonant_flags(&chars).iter().any(|c| !c)
}

/// Consonant flag per letter, in one pass.
///
/// `y` is a consonant at the start of a word or after a vowel.
fn consonant_flags(chars: &[char]) -> Vec<bool> {
    let mut flags: Vec<bool> = Vec::with_capacity(chars.len());
    for (i, c) in chars.iter().enumerate() {
        let consonant = match c {
            'a' | 'e' | 'i' | 'o' | 'u' => false,
            'y' => i == 0 || !flags[i - 1],
            _ => true,
        };
        flags.push(consonant);
    }
    flags
}

/// Number of vowel-consonant sequences in the stem.
fn measure(cons: &[bool]) -> usize {
    cons.windows(2).filter(|w| !w[0] && w[1]).count()
}

/// Consonant-vowel-consonant ending, last letter not w, x or y.
fn ends_cvc(chars: &[char], cons: &[bool]) -> bool {
    let n = chars.len();
    n >= 3
        && cons[n - 3]
        && !cons[n - 2]
        && cons[n - 1]
        && !matches!(chars[n - 1], 'w' | 'x' | 'y')
}
