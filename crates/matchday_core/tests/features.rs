use std::sync::Once;

use chrono::{NaiveDate, NaiveDateTime};
use matchday_core::{
    build_feature_table, Match, MatchResult, MatchStatus, Odds, Score, Statistic, TableBuilder,
    Team, Value,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(matchday_logging::initialize_for_tests);
}

fn day(d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, d)
        .and_then(|date| date.and_hms_opt(15, 0, 0))
        .unwrap()
}

fn sample(id: &str, date: Option<NaiveDateTime>, ht: Option<Score>, ft: Option<Score>) -> Match {
    Match {
        match_id: id.to_string(),
        url: format!("https://example.com/match/{id}/"),
        country: "England".to_string(),
        league: "Premier League".to_string(),
        season: "2023-2024".to_string(),
        stage: Some("Round 1".to_string()),
        date,
        status: MatchStatus::Finished,
        home_team: Team::named("Arsenal"),
        away_team: Team::named("Liverpool"),
        result: MatchResult {
            half_time: ht,
            full_time: ft,
            ..MatchResult::default()
        },
        odds: None,
        info: None,
        statistics: Vec::new(),
        commentary: Vec::new(),
        scraped_at: None,
    }
}

#[test]
fn home_win_with_second_half_draw() {
    init_logging();
    let table = build_feature_table(&[sample(
        "A",
        Some(day(1)),
        Some(Score::new(1, 0)),
        Some(Score::new(2, 1)),
    )]);
    let row = &table.rows()[0];

    assert_eq!(row.get("ht_total_goals"), &Value::Int(1));
    assert_eq!(row.get("ht_goal_diff"), &Value::Int(1));
    assert_eq!(row.get("ht_result").as_str(), Some("H"));
    assert_eq!(row.get("ft_total_goals"), &Value::Int(3));
    assert_eq!(row.get("ft_goal_diff"), &Value::Int(1));
    assert_eq!(row.get("ft_result").as_str(), Some("H"));
    assert_eq!(row.get("ft_over_2_5"), &Value::Bool(true));
    assert_eq!(row.get("ft_under_2_5"), &Value::Bool(false));
    assert_eq!(row.get("ft_over_4_5"), &Value::Bool(false));
    assert_eq!(row.get("ft_btts"), &Value::Bool(true));
    assert_eq!(row.get("2h_home_goals"), &Value::Int(1));
    assert_eq!(row.get("2h_away_goals"), &Value::Int(1));
    assert_eq!(row.get("2h_total_goals"), &Value::Int(2));
    assert_eq!(row.get("2h_goal_diff"), &Value::Int(0));
    assert_eq!(row.get("2h_result").as_str(), Some("D"));
}

#[test]
fn goalless_first_half_draw() {
    init_logging();
    let table = build_feature_table(&[sample(
        "B",
        Some(day(8)),
        Some(Score::new(0, 0)),
        Some(Score::new(1, 1)),
    )]);
    let row = &table.rows()[0];

    assert_eq!(row.get("ht_result").as_str(), Some("D"));
    assert_eq!(row.get("ft_total_goals"), &Value::Int(2));
    assert_eq!(row.get("ft_over_2_5"), &Value::Bool(false));
    assert_eq!(row.get("ft_over_1_5"), &Value::Bool(true));
    assert_eq!(row.get("ft_result").as_str(), Some("D"));
}

#[test]
fn missing_half_time_keeps_full_time_targets() {
    init_logging();
    let table = build_feature_table(&[sample("C", Some(day(2)), None, Some(Score::new(0, 2)))]);
    let row = &table.rows()[0];

    for column in [
        "ht_home_goals",
        "ht_away_goals",
        "ht_total_goals",
        "ht_goal_diff",
        "ht_result",
        "2h_home_goals",
        "2h_away_goals",
        "2h_total_goals",
        "2h_goal_diff",
        "2h_result",
    ] {
        assert!(row.get(column).is_null(), "{column} should be absent");
    }
    assert_eq!(row.get("ft_total_goals"), &Value::Int(2));
    assert_eq!(row.get("ft_result").as_str(), Some("A"));
    assert_eq!(row.get("ft_btts"), &Value::Bool(false));
    assert_eq!(row.get("ft_under_3_5"), &Value::Bool(true));
}

#[test]
fn missing_full_time_never_defaults_targets() {
    init_logging();
    let table = build_feature_table(&[sample("D", Some(day(3)), None, None)]);
    let row = &table.rows()[0];

    for column in ["ft_total_goals", "ft_result", "ft_over_0_5", "ft_under_0_5", "ft_btts"] {
        assert!(row.get(column).is_null(), "{column} should be absent");
    }
}

#[test]
fn rows_sorted_by_date_with_undated_last() {
    init_logging();
    let ft = Some(Score::new(1, 0));
    let matches = vec![
        sample("late", Some(day(20)), None, ft),
        sample("undated-1", None, None, ft),
        sample("early", Some(day(5)), None, ft),
        sample("undated-2", None, None, ft),
        sample("middle", Some(day(10)), None, ft),
    ];
    let table = build_feature_table(&matches);
    let order: Vec<_> = table.rows().iter().filter_map(|r| r.match_id()).collect();

    assert_eq!(order, vec!["early", "middle", "late", "undated-1", "undated-2"]);
}

#[test]
fn statistics_flatten_through_canonical_keys() {
    init_logging();
    let mut record = sample("E", Some(day(4)), Some(Score::new(0, 0)), Some(Score::new(1, 0)));
    record.statistics = vec![
        Statistic::from_values("Ball Possession", "58%", "42%"),
        Statistic::from_values("Total shots", "10", "0"),
        Statistic::from_values("Shots on target", "4", "0"),
        Statistic::from_values("Throw-ins", "20", "18"),
        Statistic::from_values("Fouls", "N/A", "11"),
    ];
    let table = build_feature_table(&[record]);
    let row = &table.rows()[0];

    assert_eq!(row.get("stat_possession_home"), &Value::Float(58.0));
    assert_eq!(row.get("stat_possession_diff"), &Value::Float(16.0));
    assert_eq!(row.get("stat_shot_accuracy_home"), &Value::Float(40.0));
    assert_eq!(row.get("stat_shot_accuracy_away"), &Value::Float(0.0));
    assert!(row.get("stat_fouls_home").is_null());
    assert_eq!(row.get("stat_fouls_away"), &Value::Float(11.0));
    assert!(!table.columns().iter().any(|c| c.contains("throw")));
}

#[test]
fn stat_columns_absent_from_one_match_read_as_missing() {
    init_logging();
    let mut with_stats = sample("F", Some(day(1)), None, Some(Score::new(2, 0)));
    with_stats.statistics = vec![
        Statistic::from_values("Shots", "12", "5"),
        Statistic::from_values("Shots on goal", "6", "1"),
    ];
    let without_stats = sample("G", Some(day(2)), None, Some(Score::new(0, 0)));
    let table = build_feature_table(&[with_stats, without_stats]);

    assert!(table.has_column("stat_shot_accuracy_home"));
    assert!(!table.has_column("stat_possession_diff"));
    assert_eq!(table.rows()[0].get("stat_shot_accuracy_home"), &Value::Float(50.0));
    assert!(table.rows()[1].get("stat_shot_accuracy_home").is_null());
}

#[test]
fn columns_start_with_match_fields_and_end_with_derived() {
    init_logging();
    let table = build_feature_table(&[sample("H", Some(day(1)), None, None)]);
    let columns = table.columns();

    assert_eq!(&columns[..3], &["match_id", "url", "date"]);
    assert!(columns.iter().any(|c| c == "ft_over_4_5"));
    assert!(!columns.iter().any(|c| c == "ft_under_4_5"));
    assert_eq!(columns.last().map(String::as_str), Some("2h_result"));
}

#[test]
fn odds_columns_only_when_present() {
    init_logging();
    let mut priced = sample("I", Some(day(1)), None, None);
    priced.odds = Some(Odds {
        home_win: Some(1.8),
        draw: Some(3.6),
        away_win: Some(4.5),
        ..Odds::default()
    });
    let mut builder = TableBuilder::new();
    builder.push(&sample("J", Some(day(2)), None, None));
    assert!(!builder.is_empty());
    builder.push(&priced);
    let table = builder.finish();

    assert!(table.has_column("odds_home_win"));
    assert_eq!(table.rows()[0].get("odds_home_win"), &Value::Float(1.8));
    assert!(table.rows()[1].get("odds_home_win").is_null());
}
