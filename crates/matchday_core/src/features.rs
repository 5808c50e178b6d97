//! Flattening of match records into one ML-ready row per match, plus the
//! derived feature and target columns.
//!
//! Missing inputs always produce missing outputs. The one exception is shot
//! accuracy, which is `0` when a side recorded zero shots.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use matchday_logging::md_debug;

use crate::model::{Match, Outcome, Score};

/// Lower-cased statistic label to canonical column key.
const STAT_CATEGORY_KEYS: &[(&str, &str)] = &[
    ("ball possession", "possession"),
    ("possession", "possession"),
    ("shots", "shots"),
    ("total shots", "shots"),
    ("goal attempts", "shots"),
    ("shots on goal", "shots_on_target"),
    ("shots on target", "shots_on_target"),
    ("shots off goal", "shots_off_target"),
    ("shots off target", "shots_off_target"),
    ("blocked shots", "shots_blocked"),
    ("corner kicks", "corners"),
    ("corners", "corners"),
    ("free kicks", "free_kicks"),
    ("fouls", "fouls"),
    ("yellow cards", "yellow_cards"),
    ("red cards", "red_cards"),
    ("offsides", "offsides"),
    ("goalkeeper saves", "saves"),
    ("saves", "saves"),
    ("total passes", "passes"),
    ("passes", "passes"),
    ("passes accurate", "passes_accurate"),
    ("completed passes", "passes_accurate"),
    ("tackles", "tackles"),
    ("expected goals (xg)", "xg"),
    ("expected goals", "xg"),
];

static STAT_KEY_LOOKUP: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| STAT_CATEGORY_KEYS.iter().copied().collect());

const OVER_LINES: [(&str, f64); 5] = [
    ("ft_over_0_5", 0.5),
    ("ft_over_1_5", 1.5),
    ("ft_over_2_5", 2.5),
    ("ft_over_3_5", 3.5),
    ("ft_over_4_5", 4.5),
];

const UNDER_LINES: [(&str, f64); 4] = [
    ("ft_under_0_5", 0.5),
    ("ft_under_1_5", 1.5),
    ("ft_under_2_5", 2.5),
    ("ft_under_3_5", 3.5),
];

const ODDS_COLUMNS: [&str; 13] = [
    "odds_home_win",
    "odds_draw",
    "odds_away_win",
    "odds_over_0_5",
    "odds_under_0_5",
    "odds_over_1_5",
    "odds_under_1_5",
    "odds_over_2_5",
    "odds_under_2_5",
    "odds_over_3_5",
    "odds_under_3_5",
    "odds_btts_yes",
    "odds_btts_no",
];

static NULL_VALUE: Value = Value::Null;

/// Maps a free-text statistic label to its canonical key (exact, case-insensitive).
pub fn canonical_stat_key(category: &str) -> Option<&'static str> {
    STAT_KEY_LOOKUP
        .get(category.to_lowercase().as_str())
        .copied()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    fn text(value: Option<&str>) -> Self {
        value.map_or(Value::Null, |v| Value::Text(v.to_string()))
    }

    fn int(value: Option<i64>) -> Self {
        value.map_or(Value::Null, Value::Int)
    }

    fn float(value: Option<f64>) -> Self {
        value.map_or(Value::Null, Value::Float)
    }

    fn bool(value: Option<bool>) -> Self {
        value.map_or(Value::Null, Value::Bool)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
            Value::Timestamp(v) => write!(f, "{}", v.format("%Y-%m-%dT%H:%M:%S")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    cells: HashMap<String, Value>,
    date: Option<NaiveDateTime>,
}

impl FeatureRow {
    /// Cell value; columns this row never received read as `Value::Null`.
    pub fn get(&self, column: &str) -> &Value {
        self.cells.get(column).unwrap_or(&NULL_VALUE)
    }

    pub fn match_id(&self) -> Option<&str> {
        self.get("match_id").as_str()
    }

    pub fn date(&self) -> Option<NaiveDateTime> {
        self.date
    }

    fn set(&mut self, column: &str, value: Value) {
        self.cells.insert(column.to_string(), value);
    }

    fn goal_pair(&self, home: &str, away: &str) -> Option<(i64, i64)> {
        Some((self.get(home).as_i64()?, self.get(away).as_i64()?))
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureTable {
    columns: Vec<String>,
    rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

/// Accumulates rows in arrival order; [`TableBuilder::finish`] derives the
/// feature columns and applies the final date sort.
#[derive(Debug, Default)]
pub struct TableBuilder {
    columns: Vec<String>,
    known: HashSet<String>,
    rows: Vec<FeatureRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push(&mut self, record: &Match) {
        let mut row = FeatureRow {
            cells: HashMap::new(),
            date: record.date,
        };
        for (column, value) in flatten_match(record) {
            self.register(&column);
            row.cells.insert(column, value);
        }
        self.rows.push(row);
    }

    pub fn finish(mut self) -> FeatureTable {
        self.derive_goal_features();
        self.derive_stat_features();
        self.rows.sort_by(|a, b| compare_dates(a.date, b.date));
        md_debug!(
            "feature table built: {} rows, {} columns",
            self.rows.len(),
            self.columns.len()
        );
        FeatureTable {
            columns: self.columns,
            rows: self.rows,
        }
    }

    fn register(&mut self, column: &str) {
        if self.known.insert(column.to_string()) {
            self.columns.push(column.to_string());
        }
    }

    fn derive_goal_features(&mut self) {
        let mut derived: Vec<&str> = Vec::new();
        derived.extend(["ht_total_goals", "ht_goal_diff", "ht_result"]);
        derived.extend(["ft_total_goals", "ft_goal_diff", "ft_result"]);
        derived.extend(OVER_LINES.iter().map(|(name, _)| *name));
        derived.extend(UNDER_LINES.iter().map(|(name, _)| *name));
        derived.push("ft_btts");
        derived.extend([
            "2h_home_goals",
            "2h_away_goals",
            "2h_total_goals",
            "2h_goal_diff",
            "2h_result",
        ]);
        for column in derived {
            self.register(column);
        }

        for row in &mut self.rows {
            let ht = row.goal_pair("ht_home_goals", "ht_away_goals");
            let ft = row.goal_pair("ft_home_goals", "ft_away_goals");
            set_pair_features(row, "ht", ht);
            set_pair_features(row, "ft", ft);

            let ft_total = ft.map(|(home, away)| (home + away) as f64);
            for (column, line) in OVER_LINES {
                row.set(column, Value::bool(ft_total.map(|total| total > line)));
            }
            for (column, line) in UNDER_LINES {
                row.set(column, Value::bool(ft_total.map(|total| total < line)));
            }
            row.set(
                "ft_btts",
                Value::bool(ft.map(|(home, away)| home > 0 && away > 0)),
            );

            let second_half = ht
                .zip(ft)
                .map(|((ht_home, ht_away), (ft_home, ft_away))| (ft_home - ht_home, ft_away - ht_away));
            row.set("2h_home_goals", Value::int(second_half.map(|(home, _)| home)));
            row.set("2h_away_goals", Value::int(second_half.map(|(_, away)| away)));
            set_pair_features(row, "2h", second_half);
        }
    }

    fn derive_stat_features(&mut self) {
        let has = |column: &str| self.known.contains(column);
        let possession = has("stat_possession_home") && has("stat_possession_away");
        let accuracy_home = has("stat_shots_home") && has("stat_shots_on_target_home");
        let accuracy_away = has("stat_shots_away") && has("stat_shots_on_target_away");

        if possession {
            self.register("stat_possession_diff");
        }
        if accuracy_home {
            self.register("stat_shot_accuracy_home");
        }
        if accuracy_away {
            self.register("stat_shot_accuracy_away");
        }

        for row in &mut self.rows {
            if possession {
                let diff = row
                    .get("stat_possession_home")
                    .as_f64()
                    .zip(row.get("stat_possession_away").as_f64())
                    .map(|(home, away)| home - away);
                row.set("stat_possession_diff", Value::float(diff));
            }
            if accuracy_home {
                let value = shot_accuracy(
                    row.get("stat_shots_on_target_home").as_f64(),
                    row.get("stat_shots_home").as_f64(),
                );
                row.set("stat_shot_accuracy_home", value);
            }
            if accuracy_away {
                let value = shot_accuracy(
                    row.get("stat_shots_on_target_away").as_f64(),
                    row.get("stat_shots_away").as_f64(),
                );
                row.set("stat_shot_accuracy_away", value);
            }
        }
    }
}

/// Flattens, derives and sorts a whole batch in one call.
pub fn build_feature_table(matches: &[Match]) -> FeatureTable {
    let mut builder = TableBuilder::new();
    for record in matches {
        builder.push(record);
    }
    builder.finish()
}

fn set_pair_features(row: &mut FeatureRow, prefix: &str, goals: Option<(i64, i64)>) {
    row.set(
        &format!("{prefix}_total_goals"),
        Value::int(goals.map(|(home, away)| home + away)),
    );
    row.set(
        &format!("{prefix}_goal_diff"),
        Value::int(goals.map(|(home, away)| home - away)),
    );
    row.set(
        &format!("{prefix}_result"),
        Value::text(goals.map(|(home, away)| Outcome::from_goals(home, away).as_str())),
    );
}

fn shot_accuracy(on_target: Option<f64>, shots: Option<f64>) -> Value {
    match (on_target, shots) {
        (Some(_), Some(shots)) if shots == 0.0 => Value::Float(0.0),
        (Some(on_target), Some(shots)) => Value::Float(on_target / shots * 100.0),
        _ => Value::Null,
    }
}

fn compare_dates(a: Option<NaiveDateTime>, b: Option<NaiveDateTime>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn score_cells(prefix: &str, score: Option<Score>) -> [(String, Value); 2] {
    [
        (
            format!("{prefix}_home_goals"),
            Value::int(score.map(|s| i64::from(s.home))),
        ),
        (
            format!("{prefix}_away_goals"),
            Value::int(score.map(|s| i64::from(s.away))),
        ),
    ]
}

fn flatten_match(record: &Match) -> Vec<(String, Value)> {
    let mut cells: Vec<(String, Value)> = vec![
        ("match_id".into(), Value::Text(record.match_id.clone())),
        ("url".into(), Value::Text(record.url.clone())),
        ("date".into(), record.date.map_or(Value::Null, Value::Timestamp)),
        (
            "scraped_at".into(),
            record
                .scraped_at
                .map_or(Value::Null, |at| Value::Timestamp(at.naive_utc())),
        ),
        ("country".into(), Value::Text(record.country.clone())),
        ("league".into(), Value::Text(record.league.clone())),
        ("season".into(), Value::Text(record.season.clone())),
        ("stage".into(), Value::text(record.stage.as_deref())),
        ("status".into(), Value::Text(record.status.as_str().to_string())),
        ("home_team".into(), Value::Text(record.home_team.name.clone())),
        ("away_team".into(), Value::Text(record.away_team.name.clone())),
        (
            "home_team_id".into(),
            Value::text(record.home_team.external_id.as_deref()),
        ),
        (
            "away_team_id".into(),
            Value::text(record.away_team.external_id.as_deref()),
        ),
    ];

    let result = &record.result;
    cells.extend(score_cells("ht", result.half_time));
    cells.extend(score_cells("ft", result.full_time));
    cells.extend(score_cells("et", result.extra_time));
    cells.extend(score_cells("pen", result.penalties));

    let info = record.info.clone().unwrap_or_default();
    cells.push(("venue".into(), Value::text(info.venue.as_deref())));
    cells.push(("referee".into(), Value::text(info.referee.as_deref())));
    cells.push((
        "attendance".into(),
        Value::int(info.attendance.and_then(|a| i64::try_from(a).ok())),
    ));
    cells.push(("weather".into(), Value::text(info.weather.as_deref())));

    for stat in &record.statistics {
        let Some(key) = canonical_stat_key(&stat.category) else {
            continue;
        };
        upsert(&mut cells, format!("stat_{key}_home"), Value::float(stat.home_numeric));
        upsert(&mut cells, format!("stat_{key}_away"), Value::float(stat.away_numeric));
    }

    if let Some(odds) = &record.odds {
        let values = [
            odds.home_win,
            odds.draw,
            odds.away_win,
            odds.over_0_5,
            odds.under_0_5,
            odds.over_1_5,
            odds.under_1_5,
            odds.over_2_5,
            odds.under_2_5,
            odds.over_3_5,
            odds.under_3_5,
            odds.btts_yes,
            odds.btts_no,
        ];
        for (column, value) in ODDS_COLUMNS.iter().zip(values) {
            cells.push(((*column).to_string(), Value::float(value)));
        }
    }

    cells
}

/// Later statistics with the same canonical key overwrite earlier ones in place.
fn upsert(cells: &mut Vec<(String, Value)>, column: String, value: Value) {
    match cells.iter_mut().find(|(existing, _)| *existing == column) {
        Some(slot) => slot.1 = value,
        None => cells.push((column, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stat_keys_are_case_insensitive_exact_matches() {
        assert_eq!(canonical_stat_key("Ball Possession"), Some("possession"));
        assert_eq!(canonical_stat_key("SHOTS ON TARGET"), Some("shots_on_target"));
        assert_eq!(canonical_stat_key("Shots on Goal"), Some("shots_on_target"));
        assert_eq!(canonical_stat_key("Ball possession %"), None);
        assert_eq!(canonical_stat_key("Throw-ins"), None);
    }

    #[test]
    fn shot_accuracy_zero_shots_is_zero_not_missing() {
        assert_eq!(shot_accuracy(Some(0.0), Some(0.0)), Value::Float(0.0));
        assert_eq!(shot_accuracy(Some(4.0), Some(10.0)), Value::Float(40.0));
        assert_eq!(shot_accuracy(None, Some(10.0)), Value::Null);
        assert_eq!(shot_accuracy(Some(3.0), None), Value::Null);
    }

    #[test]
    fn missing_dates_sort_last() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        assert_eq!(compare_dates(Some(date), None), Ordering::Less);
        assert_eq!(compare_dates(None, Some(date)), Ordering::Greater);
        assert_eq!(compare_dates(None, None), Ordering::Equal);
    }

    #[test]
    fn value_display_for_tabular_output() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Float(61.0).to_string(), "61");
        assert_eq!(Value::Float(40.5).to_string(), "40.5");
    }
}
