//! Score recovery from a match detail page.
//!
//! Full time and half time each have an ordered list of strategies. Every
//! strategy is a plain `fn(&Page) -> Option<Score>`; the first `Some` wins.
//! Half-time extraction runs regardless of the full-time outcome.
use std::sync::LazyLock;

use matchday_core::parse::{parse_half_time_pair, parse_integer_score};
use matchday_core::{MatchResult, Score};
use matchday_logging::{md_debug, md_warn};
use regex::Regex;

use crate::page::{self, element_text, has_class_containing, Page};

pub type ScoreStrategy = fn(&Page) -> Option<Score>;

static PARENTHESISED_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\((\d+)\s*[-:]\s*(\d+)\)").expect("parenthesised score regex is valid")
});

pub const FULL_TIME_STRATEGIES: &[(&str, ScoreStrategy)] = &[
    ("score elements", full_time_from_score_elements),
    ("score wrapper spans", full_time_from_wrapper_spans),
];

pub const HALF_TIME_STRATEGIES: &[(&str, ScoreStrategy)] = &[
    ("half-time element", half_time_from_element),
    ("parenthesised page text", half_time_from_page_text),
    ("half-time class variants", half_time_from_class_variants),
    ("info and incident rows", half_time_from_info_rows),
];

/// Runs `strategies` in order and returns the first success.
pub fn first_success(page: &Page, strategies: &[(&str, ScoreStrategy)], what: &str) -> Option<Score> {
    let found = strategies.iter().find_map(|(name, strategy)| {
        let score = strategy(page)?;
        md_debug!("{what} score {score} via {name}");
        Some(score)
    });
    if found.is_none() {
        md_debug!("no {what} score: all {} strategies exhausted", strategies.len());
    }
    found
}

/// Extracts every score the page exposes and enforces half time <= full time.
pub fn extract_result(page: &Page) -> MatchResult {
    let mut result = MatchResult {
        full_time: first_success(page, FULL_TIME_STRATEGIES, "full-time"),
        half_time: first_success(page, HALF_TIME_STRATEGIES, "half-time"),
        extra_time: page
            .first_text(&page::EXTRA_TIME)
            .and_then(|text| score_from_pair_text(&text)),
        penalties: page
            .first_text(&page::PENALTIES)
            .and_then(|text| score_from_pair_text(&text)),
    };

    if result.half_time_exceeds_full_time() {
        if let (Some(ht), Some(ft)) = (result.half_time, result.full_time) {
            md_warn!("Invalid HT score: HT {ht} > FT {ft}, discarding half time");
        }
        result.half_time = None;
    }
    result
}

fn score_from_pair_text(text: &str) -> Option<Score> {
    parse_half_time_pair(text).map(|(home, away)| Score::new(home, away))
}

pub fn full_time_from_score_elements(page: &Page) -> Option<Score> {
    let home = page.first_text(&page::SCORE_HOME)?;
    let away = page.first_text(&page::SCORE_AWAY)?;
    Some(Score::new(parse_integer_score(&home), parse_integer_score(&away)))
}

pub fn full_time_from_wrapper_spans(page: &Page) -> Option<Score> {
    let spans: Vec<_> = page.select(&page::SCORE_WRAPPER_SPANS).collect();
    if spans.len() < 2 {
        return None;
    }
    let scores: Vec<_> = spans
        .into_iter()
        .filter(|span| !has_class_containing(*span, "divider"))
        .collect();
    match scores.as_slice() {
        [home, away, ..] => Some(Score::new(
            parse_integer_score(&element_text(*home)),
            parse_integer_score(&element_text(*away)),
        )),
        _ => None,
    }
}

pub fn half_time_from_element(page: &Page) -> Option<Score> {
    score_from_pair_text(&page.first_text(&page::HALF_TIME)?)
}

pub fn half_time_from_page_text(page: &Page) -> Option<Score> {
    let text = page.full_text();
    let caps = PARENTHESISED_PAIR.captures(&text)?;
    Some(Score::new(caps[1].parse().ok()?, caps[2].parse().ok()?))
}

pub fn half_time_from_class_variants(page: &Page) -> Option<Score> {
    page.select(&page::HALF_TIME_VARIANTS)
        .find_map(|element| score_from_pair_text(&element_text(element)))
}

pub fn half_time_from_info_rows(page: &Page) -> Option<Score> {
    page.select(&page::INFO_OR_INCIDENT).find_map(|element| {
        let text = element_text(element);
        let lower = text.to_lowercase();
        if lower.contains("half-time") || lower.contains("ht") {
            score_from_pair_text(&text)
        } else {
            None
        }
    })
}
