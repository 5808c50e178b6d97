use std::sync::Once;

use matchday_core::{
    update, BatchEffect, BatchMsg, BatchPhase, BatchState, CheckpointEntry, MatchDigest, Score,
};
use matchday_core::parse::parse_integer_score;
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(matchday_logging::initialize_for_tests);
}

fn digest(id: &str, ht: Option<Score>, ft: Option<Score>, statistics: usize) -> MatchDigest {
    MatchDigest {
        entry: CheckpointEntry {
            match_id: id.to_string(),
            home_team: "Home".to_string(),
            away_team: "Away".to_string(),
            date: None,
        },
        half_time: ht,
        full_time: ft,
        statistics,
    }
}

fn scraped(state: BatchState, id: &str) -> (BatchState, Vec<BatchEffect>) {
    update(
        state,
        BatchMsg::MatchScraped(digest(id, None, Some(Score::new(1, 0)), 0)),
    )
}

#[test]
fn messages_before_start_are_ignored() {
    init_logging();
    let (state, effects) = scraped(BatchState::new(1), "A");
    assert!(effects.is_empty());
    assert_eq!(state.phase(), BatchPhase::Idle);
    assert_eq!(state.summary().scraped, 0);
}

#[test]
fn checkpoint_every_save_interval_successes() {
    init_logging();
    let (state, _) = update(BatchState::new(2), BatchMsg::Started { total: 5 });
    let (state, first) = scraped(state, "A");
    let (state, _) = update(
        state,
        BatchMsg::MatchFailed {
            match_id: "X".to_string(),
        },
    );
    let (state, second) = scraped(state, "B");

    assert!(first.is_empty());
    let ids: Vec<_> = match second.as_slice() {
        [BatchEffect::WriteCheckpoint(entries)] => {
            entries.iter().map(|e| e.match_id.clone()).collect()
        }
        other => panic!("unexpected effects {other:?}"),
    };
    assert_eq!(ids, vec!["A".to_string(), "B".to_string()]);
    assert_eq!(state.failed(), &["X".to_string()]);
}

#[test]
fn finish_requests_export_only_with_matches() {
    init_logging();
    let (state, _) = update(BatchState::new(10), BatchMsg::Started { total: 1 });
    let (state, effects) = update(state, BatchMsg::Finished);
    assert!(effects.is_empty());
    assert_eq!(state.phase(), BatchPhase::Finished);

    let (state, _) = update(BatchState::new(10), BatchMsg::Started { total: 1 });
    let (state, _) = scraped(state, "A");
    let (_state, effects) = update(state, BatchMsg::Finished);
    assert_eq!(effects, vec![BatchEffect::Export { matches: 1 }]);
}

#[test]
fn summary_reports_coverage_and_averages() {
    init_logging();
    let (state, _) = update(BatchState::new(10), BatchMsg::Started { total: 3 });
    let (state, _) = update(
        state,
        BatchMsg::MatchScraped(digest("A", Some(Score::new(1, 0)), Some(Score::new(2, 1)), 12)),
    );
    let (state, _) = update(
        state,
        BatchMsg::MatchScraped(digest("B", None, Some(Score::new(0, 1)), 0)),
    );
    let (state, _) = update(
        state,
        BatchMsg::MatchFailed {
            match_id: "C".to_string(),
        },
    );
    let summary = state.summary();

    assert_eq!(summary.total, 3);
    assert_eq!(summary.scraped, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.with_half_time, 1);
    assert_eq!(summary.with_full_time, 2);
    assert_eq!(summary.with_statistics, 1);
    assert_eq!(summary.avg_ft_goals, Some(2.0));
    assert_eq!(summary.avg_ht_goals, Some(1.0));
    assert!(summary.to_string().contains("With HT scores:      1 (50.0%)"));
}

#[test]
fn summary_survives_scores_at_the_parser_ceiling() {
    init_logging();
    let huge = parse_integer_score("4000000000");
    let (state, _) = update(BatchState::new(10), BatchMsg::Started { total: 1 });
    let (state, _) = update(
        state,
        BatchMsg::MatchScraped(digest("BIG", None, Some(Score::new(huge, huge)), 0)),
    );

    let summary = state.summary();
    assert_eq!(summary.avg_ft_goals, Some(8_000_000_000.0));
    assert_eq!(parse_integer_score("99999999999"), u32::MAX);
}
