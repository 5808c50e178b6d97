use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source of the `scraped_at` stamp. Injected so assembly stays deterministic under test.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

pub fn fixed_clock(instant: DateTime<Utc>) -> Clock {
    Arc::new(move || instant)
}

/// Categorical match outcome from the home side's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Home,
    Draw,
    Away,
}

impl Outcome {
    pub fn from_goals(home: i64, away: i64) -> Self {
        if home > away {
            Outcome::Home
        } else if away > home {
            Outcome::Away
        } else {
            Outcome::Draw
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Home => "H",
            Outcome::Draw => "D",
            Outcome::Away => "A",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Score {
    pub home: u32,
    pub away: u32,
}

impl Score {
    pub const fn new(home: u32, away: u32) -> Self {
        Self { home, away }
    }

    pub fn total(&self) -> u64 {
        u64::from(self.home) + u64::from(self.away)
    }

    pub fn diff(&self) -> i64 {
        i64::from(self.home) - i64::from(self.away)
    }

    pub fn result(&self) -> Outcome {
        Outcome::from_goals(i64::from(self.home), i64::from(self.away))
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.home, self.away)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatchResult {
    pub half_time: Option<Score>,
    pub full_time: Option<Score>,
    pub extra_time: Option<Score>,
    pub penalties: Option<Score>,
}

impl MatchResult {
    /// True when both scores are known and either half-time component is larger
    /// than its full-time counterpart.
    pub fn half_time_exceeds_full_time(&self) -> bool {
        match (self.half_time, self.full_time) {
            (Some(ht), Some(ft)) => ht.home > ft.home || ht.away > ft.away,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistic {
    pub category: String,
    pub home_value: String,
    pub away_value: String,
    pub home_numeric: Option<f64>,
    pub away_numeric: Option<f64>,
}

impl Statistic {
    /// Builds a statistic, deriving the numeric fields from the display strings.
    pub fn from_values(
        category: impl Into<String>,
        home_value: impl Into<String>,
        away_value: impl Into<String>,
    ) -> Self {
        let home_value = home_value.into();
        let away_value = away_value.into();
        Self {
            category: category.into(),
            home_numeric: crate::parse::parse_numeric_stat(&home_value),
            away_numeric: crate::parse::parse_numeric_stat(&away_value),
            home_value,
            away_value,
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} - {}", self.category, self.home_value, self.away_value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    pub external_id: Option<String>,
    pub country: Option<String>,
}

impl Team {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            external_id: None,
            country: None,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatchInfo {
    pub referee: Option<String>,
    pub venue: Option<String>,
    pub attendance: Option<u64>,
    pub weather: Option<String>,
}

impl MatchInfo {
    pub fn is_empty(&self) -> bool {
        self.referee.is_none()
            && self.venue.is_none()
            && self.attendance.is_none()
            && self.weather.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    NotStarted,
    FirstHalf,
    HalfTime,
    SecondHalf,
    Finished,
    #[serde(rename = "aet")]
    AfterExtraTime,
    #[serde(rename = "penalties")]
    AfterPenalties,
    Postponed,
    Cancelled,
    Abandoned,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::NotStarted => "not_started",
            MatchStatus::FirstHalf => "first_half",
            MatchStatus::HalfTime => "half_time",
            MatchStatus::SecondHalf => "second_half",
            MatchStatus::Finished => "finished",
            MatchStatus::AfterExtraTime => "aet",
            MatchStatus::AfterPenalties => "penalties",
            MatchStatus::Postponed => "postponed",
            MatchStatus::Cancelled => "cancelled",
            MatchStatus::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pre-match betting odds (decimal) across the common markets.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Odds {
    pub home_win: Option<f64>,
    pub draw: Option<f64>,
    pub away_win: Option<f64>,
    pub over_0_5: Option<f64>,
    pub under_0_5: Option<f64>,
    pub over_1_5: Option<f64>,
    pub under_1_5: Option<f64>,
    pub over_2_5: Option<f64>,
    pub under_2_5: Option<f64>,
    pub over_3_5: Option<f64>,
    pub under_3_5: Option<f64>,
    pub btts_yes: Option<f64>,
    pub btts_no: Option<f64>,
    pub asian_handicap_line: Option<f64>,
    pub asian_handicap_home: Option<f64>,
    pub asian_handicap_away: Option<f64>,
    pub home_or_draw: Option<f64>,
    pub away_or_draw: Option<f64>,
    pub home_or_away: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Home,
    Away,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Goal,
    YellowCard,
    RedCard,
    Substitution,
    Other,
}

/// One incident from the match timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentaryEvent {
    pub minute: u32,
    pub added_time: Option<u32>,
    pub event_type: EventKind,
    pub side: Option<Side>,
    pub player: Option<String>,
    pub description: String,
    pub is_half_time: bool,
}

impl fmt::Display for CommentaryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}'", self.minute)?;
        if let Some(added) = self.added_time.filter(|added| *added > 0) {
            write!(f, "+{added}")?;
        }
        write!(f, "] {}", self.description)
    }
}

/// A fully assembled match record. `match_id` is the natural key within a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub match_id: String,
    pub url: String,
    pub country: String,
    pub league: String,
    pub season: String,
    pub stage: Option<String>,
    pub date: Option<NaiveDateTime>,
    pub status: MatchStatus,
    pub home_team: Team,
    pub away_team: Team,
    pub result: MatchResult,
    pub odds: Option<Odds>,
    pub info: Option<MatchInfo>,
    pub statistics: Vec<Statistic>,
    pub commentary: Vec<CommentaryEvent>,
    pub scraped_at: Option<DateTime<Utc>>,
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.result.full_time {
            Some(score) => write!(f, "{} {} {}", self.home_team, score, self.away_team),
            None => write!(f, "{} vs {}", self.home_team, self.away_team),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_derivations() {
        let score = Score::new(2, 3);
        assert_eq!(score.total(), 5);
        assert_eq!(score.diff(), -1);
        assert_eq!(score.result(), Outcome::Away);
        assert_eq!(Score::new(1, 1).result(), Outcome::Draw);
        assert_eq!(score.to_string(), "2-3");
    }

    #[test]
    fn total_does_not_overflow_on_huge_scores() {
        let score = Score::new(u32::MAX, u32::MAX);
        assert_eq!(score.total(), 2 * u64::from(u32::MAX));
        assert_eq!(score.diff(), 0);
    }

    #[test]
    fn half_time_bound_needs_both_scores() {
        let mut result = MatchResult {
            half_time: Some(Score::new(2, 0)),
            ..MatchResult::default()
        };
        assert!(!result.half_time_exceeds_full_time());
        result.full_time = Some(Score::new(1, 1));
        assert!(result.half_time_exceeds_full_time());
        result.full_time = Some(Score::new(2, 0));
        assert!(!result.half_time_exceeds_full_time());
    }

    #[test]
    fn commentary_display_includes_added_time() {
        let event = CommentaryEvent {
            minute: 45,
            added_time: Some(2),
            event_type: EventKind::Goal,
            side: Some(Side::Home),
            player: None,
            description: "Goal".to_string(),
            is_half_time: false,
        };
        assert_eq!(event.to_string(), "[45'+2] Goal");
    }

    #[test]
    fn status_labels_are_stable() {
        assert_eq!(MatchStatus::AfterExtraTime.as_str(), "aet");
        assert_eq!(MatchStatus::AfterPenalties.as_str(), "penalties");
        assert_eq!(MatchStatus::NotStarted.to_string(), "not_started");
    }

    #[test]
    fn statistic_derives_numeric_values() {
        let stat = Statistic::from_values("Ball Possession", "61%", "39%");
        assert_eq!(stat.home_numeric, Some(61.0));
        assert_eq!(stat.away_numeric, Some(39.0));
        assert_eq!(stat.to_string(), "Ball Possession: 61% - 39%");
    }
}
