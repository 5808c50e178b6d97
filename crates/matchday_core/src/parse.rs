//! Total conversions from noisy page text into typed values.
//!
//! None of these functions fail: unparseable input maps to a documented
//! default or to `None`.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;

/// Format tried first by [`parse_date`] when the caller has no better guess.
pub const DEFAULT_DATE_FORMAT: &str = "%d.%m.%Y";

const FALLBACK_DATE_FORMATS: [&str; 4] = ["%d/%m/%Y", "%Y-%m-%d", "%d.%m.%Y %H:%M", "%d/%m/%Y %H:%M"];

const MATCH_PATH_MARKER: &str = "/match/";

static SCORE_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]+)\s*[-:]\s*([0-9]+)").expect("score pair regex is valid")
});

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));

/// Keeps only ASCII digits and parses them; no digits at all yields 0.
/// Digit runs beyond `u32::MAX` saturate.
pub fn parse_integer_score(text: &str) -> u32 {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return 0;
    }
    digits.parse().unwrap_or(u32::MAX)
}

/// First `<digits> [-:] <digits>` pair anywhere in `text`.
pub fn parse_half_time_pair(text: &str) -> Option<(u32, u32)> {
    let caps = SCORE_PAIR.captures(text)?;
    let home = caps[1].parse().ok()?;
    let away = caps[2].parse().ok()?;
    Some((home, away))
}

/// Tries `primary_format`, then the fixed fallback list. Date-only formats
/// resolve to midnight.
pub fn parse_date(text: &str, primary_format: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Some(parsed) = parse_with_format(text, primary_format) {
        return Some(parsed);
    }
    FALLBACK_DATE_FORMATS
        .iter()
        .find_map(|format| parse_with_format(text, format))
}

fn parse_with_format(text: &str, format: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, format)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, format)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Machine-readable timestamps as found in `datetime` attributes: RFC 3339
/// (offset or `Z`, normalised to UTC), a naive `YYYY-MM-DDTHH:MM[:SS]`, or a bare date.
pub fn parse_iso_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d"]
        .into_iter()
        .find_map(|format| parse_with_format(text, format))
}

/// Empty input is `None`; non-empty input without digits (e.g. "N/A") is `Some(0)`.
pub fn parse_attendance(text: &str) -> Option<u64> {
    if text.is_empty() {
        return None;
    }
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Some(0);
    }
    digits.parse().ok()
}

/// Keeps digits and `.`, then parses as a float. Unlike attendance, text that
/// strips to nothing is `None`, not zero: a missing statistic is not a zero one.
pub fn parse_numeric_stat(text: &str) -> Option<f64> {
    if text.is_empty() {
        return None;
    }
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse().ok()
}

pub fn clean_whitespace<'a>(text: impl Into<Option<&'a str>>) -> String {
    match text.into() {
        Some(text) => WHITESPACE_RUN.replace_all(text.trim(), " ").into_owned(),
        None => String::new(),
    }
}

/// Path segment right after `/match/`, without trailing `#`.
pub fn extract_external_id(url: &str) -> Option<String> {
    let start = url.find(MATCH_PATH_MARKER)? + MATCH_PATH_MARKER.len();
    let rest = &url[start..];
    let segment = rest.split('/').next().unwrap_or(rest);
    let id = segment.trim_end_matches('#');
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}
