use std::fmt;

use matchday_logging::{md_debug, md_info};
use serde::{Deserialize, Serialize};

use crate::model::{Match, Score};

/// Minimal identifying fields persisted by incremental checkpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointEntry {
    pub match_id: String,
    pub home_team: String,
    pub away_team: String,
    pub date: Option<String>,
}

impl From<&Match> for CheckpointEntry {
    fn from(record: &Match) -> Self {
        Self {
            match_id: record.match_id.clone(),
            home_team: record.home_team.name.clone(),
            away_team: record.away_team.name.clone(),
            date: record
                .date
                .map(|d| d.format("%Y-%m-%dT%H:%M:%S").to_string()),
        }
    }
}

/// What the batch state machine needs to know about a scraped match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchDigest {
    pub entry: CheckpointEntry,
    pub half_time: Option<Score>,
    pub full_time: Option<Score>,
    pub statistics: usize,
}

impl From<&Match> for MatchDigest {
    fn from(record: &Match) -> Self {
        Self {
            entry: CheckpointEntry::from(record),
            half_time: record.result.half_time,
            full_time: record.result.full_time,
            statistics: record.statistics.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchMsg {
    /// The runner is about to assemble `total` targets.
    Started { total: usize },
    /// One match assembled successfully (arrival order).
    MatchScraped(MatchDigest),
    /// Assembly produced no record for this target.
    MatchFailed { match_id: String },
    /// Every target has been attempted.
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEffect {
    WriteCheckpoint(Vec<CheckpointEntry>),
    Export { matches: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchPhase {
    #[default]
    Idle,
    Running,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchState {
    phase: BatchPhase,
    save_interval: usize,
    total: usize,
    scraped: Vec<MatchDigest>,
    failed: Vec<String>,
}

impl BatchState {
    /// `save_interval` of 0 is treated as 1.
    pub fn new(save_interval: usize) -> Self {
        Self {
            phase: BatchPhase::Idle,
            save_interval: save_interval.max(1),
            total: 0,
            scraped: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn phase(&self) -> BatchPhase {
        self.phase
    }

    pub fn failed(&self) -> &[String] {
        &self.failed
    }

    pub fn checkpoint(&self) -> Vec<CheckpointEntry> {
        self.scraped.iter().map(|d| d.entry.clone()).collect()
    }

    pub fn summary(&self) -> BatchSummary {
        let with_half_time = self.scraped.iter().filter(|d| d.half_time.is_some()).count();
        let with_full_time = self.scraped.iter().filter(|d| d.full_time.is_some()).count();
        let with_statistics = self.scraped.iter().filter(|d| d.statistics > 0).count();
        BatchSummary {
            total: self.total,
            scraped: self.scraped.len(),
            failed: self.failed.len(),
            with_half_time,
            with_full_time,
            with_statistics,
            avg_ht_goals: average_goals(self.scraped.iter().filter_map(|d| d.half_time)),
            avg_ft_goals: average_goals(self.scraped.iter().filter_map(|d| d.full_time)),
        }
    }
}

impl Default for BatchState {
    fn default() -> Self {
        Self::new(20)
    }
}

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: BatchState, msg: BatchMsg) -> (BatchState, Vec<BatchEffect>) {
    let effects = match msg {
        BatchMsg::Started { total } => {
            if state.phase != BatchPhase::Idle {
                return (state, Vec::new());
            }
            state.phase = BatchPhase::Running;
            state.total = total;
            md_info!("batch started with {} targets", total);
            Vec::new()
        }
        BatchMsg::MatchScraped(digest) => {
            if state.phase != BatchPhase::Running {
                return (state, Vec::new());
            }
            md_debug!("scraped {}", digest.entry.match_id);
            state.scraped.push(digest);
            if state.scraped.len() % state.save_interval == 0 {
                vec![BatchEffect::WriteCheckpoint(state.checkpoint())]
            } else {
                Vec::new()
            }
        }
        BatchMsg::MatchFailed { match_id } => {
            if state.phase != BatchPhase::Running {
                return (state, Vec::new());
            }
            state.failed.push(match_id);
            Vec::new()
        }
        BatchMsg::Finished => {
            if state.phase != BatchPhase::Running {
                return (state, Vec::new());
            }
            state.phase = BatchPhase::Finished;
            md_info!(
                "batch finished: {} scraped, {} failed",
                state.scraped.len(),
                state.failed.len()
            );
            if state.scraped.is_empty() {
                Vec::new()
            } else {
                vec![BatchEffect::Export {
                    matches: state.scraped.len(),
                }]
            }
        }
    };

    (state, effects)
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub total: usize,
    pub scraped: usize,
    pub failed: usize,
    pub with_half_time: usize,
    pub with_full_time: usize,
    pub with_statistics: usize,
    pub avg_ht_goals: Option<f64>,
    pub avg_ft_goals: Option<f64>,
}

impl BatchSummary {
    fn share(&self, count: usize) -> f64 {
        if self.scraped == 0 {
            0.0
        } else {
            100.0 * count as f64 / self.scraped as f64
        }
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Summary:")?;
        writeln!(f, "  Targets:             {}", self.total)?;
        writeln!(f, "  Scraped:             {}", self.scraped)?;
        writeln!(f, "  Failed:              {}", self.failed)?;
        writeln!(
            f,
            "  With FT scores:      {} ({:.1}%)",
            self.with_full_time,
            self.share(self.with_full_time)
        )?;
        writeln!(
            f,
            "  With HT scores:      {} ({:.1}%)",
            self.with_half_time,
            self.share(self.with_half_time)
        )?;
        write!(
            f,
            "  With statistics:     {} ({:.1}%)",
            self.with_statistics,
            self.share(self.with_statistics)
        )?;
        if let (Some(ft), Some(ht)) = (self.avg_ft_goals, self.avg_ht_goals) {
            write!(f, "\n  Avg FT goals:        {ft:.2}\n  Avg HT goals:        {ht:.2}")?;
        }
        Ok(())
    }
}

fn average_goals(scores: impl Iterator<Item = Score>) -> Option<f64> {
    let (sum, count) = scores.fold((0u64, 0u64), |(sum, count), score| {
        (sum.saturating_add(score.total()), count + 1)
    });
    if count == 0 {
        None
    } else {
        Some(sum as f64 / count as f64)
    }
}
