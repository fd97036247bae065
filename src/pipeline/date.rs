//! Date resolution: ask the model for the document's date, then parse it.
//!
//! The model is told to answer with `YYYY-MM-DD` or [`NO_DATE_SENTINEL`].
//! Its answer is interpreted in three steps:
//!
//! 1. exactly the sentinel → no date
//! 2. strict `YYYY-MM-DD` → that calendar date (no time zone involved)
//! 3. anything else → the earliest date found by [`detect_date`] in the
//!    answer, or no date
//!
//! A chatty or malformed answer therefore never fails the document; only the
//! transport can.

use crate::error::ModelInvocationError;
use crate::pipeline::llm::ChatModel;
use crate::prompts::{date_prompt, NO_DATE_SENTINEL};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Format of the date token in prompts and filenames.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Ask the model for the most relevant date in `text`.
pub async fn resolve_date(
    model: &dyn ChatModel,
    text: &str,
    temperature: f32,
) -> Result<Option<NaiveDate>, ModelInvocationError> {
    let answer = model.complete(&date_prompt(text), temperature).await?;
    let date = interpret_answer(&answer);
    debug!("Date answer {:?} → {:?}", answer.trim(), date);
    Ok(date)
}

/// Turn the model's raw answer into a date, if it holds one.
pub fn interpret_answer(answer: &str) -> Option<NaiveDate> {
    let answer = answer.trim();
    if answer == NO_DATE_SENTINEL {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(answer, DATE_FORMAT) {
        return Some(date);
    }
    detect_date(answer)
}

// ── Free-text detection ──────────────────────────────────────────────────────

const MONTH: &str = r"(?P<month>jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?";

/// Year first: 2023-11-15, 2023/11/15, 2023.11.15, and ISO datetimes
/// (2023-11-15T10:30).
static RE_YMD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?P<year>\d{4})[-/.](?P<month>\d{1,2})[-/.](?P<day>\d{1,2})(?:T|\b)").unwrap()
});

/// US numeric: 11/15/2023.
static RE_MDY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?P<month>\d{1,2})/(?P<day>\d{1,2})/(?P<year>\d{4})\b").unwrap()
});

/// European numeric: 15.11.2023.
static RE_DMY_DOTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?P<day>\d{1,2})\.(?P<month>\d{1,2})\.(?P<year>\d{4})\b").unwrap()
});

/// November 15, 2023 / Nov. 15th 2023.
static RE_MONTH_DAY_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b{MONTH}\s+(?P<day>\d{{1,2}})(?:st|nd|rd|th)?,?\s+(?P<year>\d{{4}})\b"
    ))
    .unwrap()
});

/// 15 November 2023 / 15th of Nov 2023.
static RE_DAY_MONTH_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?P<day>\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?{MONTH},?\s+(?P<year>\d{{4}})\b"
    ))
    .unwrap()
});

/// November 2023 (first of the month).
static RE_MONTH_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)\b{MONTH}\s+(?P<year>\d{{4}})\b")).unwrap());

/// Find the earliest calendar date written anywhere in `text`.
///
/// Candidates that do not name a real date (month 13, February 30) are
/// skipped. When two patterns match at the same offset the more specific
/// one wins.
pub fn detect_date(text: &str) -> Option<NaiveDate> {
    let patterns: [&Lazy<Regex>; 6] = [
        &RE_YMD,
        &RE_MDY,
        &RE_DMY_DOTS,
        &RE_MONTH_DAY_YEAR,
        &RE_DAY_MONTH_YEAR,
        &RE_MONTH_YEAR,
    ];

    let mut best: Option<(usize, NaiveDate)> = None;
    for re in patterns {
        for caps in re.captures_iter(text) {
            let Some(start) = caps.get(0).map(|m| m.start()) else {
                continue;
            };
            if best.is_some_and(|(pos, _)| pos <= start) {
                break;
            }
            if let Some(date) = date_from_captures(&caps) {
                best = Some((start, date));
                break;
            }
        }
    }
    best.map(|(_, date)| date)
}

fn date_from_captures(caps: &regex::Captures<'_>) -> Option<NaiveDate> {
    let year: i32 = caps.name("year")?.as_str().parse().ok()?;
    let month_str = caps.name("month")?.as_str();
    let month = month_str
        .parse::<u32>()
        .ok()
        .or_else(|| month_from_name(month_str))?;
    let day = match caps.name("day") {
        Some(d) => d.as_str().parse().ok()?,
        None => 1,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

fn month_from_name(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).collect::<String>().to_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Fixed(&'static str);

    #[async_trait]
    impl ChatModel for Fixed {
        fn model_id(&self) -> &str {
            "fixed"
        }

        async fn complete(&self, prompt: &str, _t: f32) -> Result<String, ModelInvocationError> {
            assert!(prompt.contains(NO_DATE_SENTINEL));
            Ok(self.0.to_string())
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn sentinel_means_no_date() {
        assert_eq!(interpret_answer("No date found"), None);
        assert_eq!(interpret_answer("  No date found\n"), None);
    }

    #[test]
    fn empty_answer_means_no_date() {
        assert_eq!(interpret_answer(""), None);
        assert_eq!(interpret_answer("   "), None);
    }

    #[test]
    fn answer_without_date_means_no_date() {
        assert_eq!(interpret_answer("I could not find anything useful."), None);
        assert_eq!(interpret_answer("Invoice #20231115"), None);
    }

    #[test]
    fn strict_iso_answer() {
        assert_eq!(interpret_answer("2023-11-15"), Some(ymd(2023, 11, 15)));
        assert_eq!(interpret_answer("2023-11-15\n"), Some(ymd(2023, 11, 15)));
    }

    #[test]
    fn iso_datetime_answer_keeps_the_day() {
        assert_eq!(interpret_answer("2023-11-15T10:30"), Some(ymd(2023, 11, 15)));
        assert_eq!(interpret_answer("2023-11-15T00:00:00Z"), Some(ymd(2023, 11, 15)));
        assert_eq!(detect_date("issued 2023-11-1Tx"), Some(ymd(2023, 11, 1)));
    }

    #[test]
    fn chatty_answer_falls_back_to_detection() {
        assert_eq!(
            interpret_answer("The most relevant date is 2024-02-29."),
            Some(ymd(2024, 2, 29))
        );
        assert_eq!(
            interpret_answer("Date of service: March 3rd, 2021"),
            Some(ymd(2021, 3, 3))
        );
    }

    #[test]
    fn impossible_dates_are_skipped() {
        assert_eq!(interpret_answer("2023-02-30"), None);
        assert_eq!(detect_date("2023-13-01 or 01/02/2020"), Some(ymd(2020, 1, 2)));
    }

    #[test]
    fn detects_common_formats() {
        assert_eq!(detect_date("on 11/15/2023"), Some(ymd(2023, 11, 15)));
        assert_eq!(detect_date("am 15.11.2023"), Some(ymd(2023, 11, 15)));
        assert_eq!(detect_date("2023/11/15"), Some(ymd(2023, 11, 15)));
        assert_eq!(detect_date("Nov. 15 2023"), Some(ymd(2023, 11, 15)));
        assert_eq!(detect_date("15 November 2023"), Some(ymd(2023, 11, 15)));
        assert_eq!(detect_date("the 1st of sept 2022"), Some(ymd(2022, 9, 1)));
        assert_eq!(detect_date("statement for December 2019"), Some(ymd(2019, 12, 1)));
    }

    #[test]
    fn earliest_match_wins() {
        assert_eq!(
            detect_date("Issued January 5, 2020, paid 2020-02-01"),
            Some(ymd(2020, 1, 5))
        );
        assert_eq!(
            detect_date("paid 2020-02-01, issued January 5, 2020"),
            Some(ymd(2020, 2, 1))
        );
    }

    #[test]
    fn full_date_preferred_over_month_year_at_same_position() {
        assert_eq!(detect_date("June 7, 2018"), Some(ymd(2018, 6, 7)));
    }

    #[test]
    fn resolve_date_interprets_the_answer() {
        let date = tokio_test::block_on(resolve_date(&Fixed(" 2021-06-30T08:00:00Z\n"), "text", 0.0));
        assert_eq!(date.unwrap(), Some(ymd(2021, 6, 30)));

        let date = tokio_test::block_on(resolve_date(&Fixed(NO_DATE_SENTINEL), "text", 0.0));
        assert_eq!(date.unwrap(), None);
    }
}
