//! Matchday core: match data model, value parsers, the feature/export engine
//! and the pure batch-progress state machine. No IO happens here.
mod batch;
mod features;
mod model;
pub mod parse;

pub use batch::{
    update, BatchEffect, BatchMsg, BatchPhase, BatchState, BatchSummary, CheckpointEntry,
    MatchDigest,
};
pub use features::{build_feature_table, canonical_stat_key, FeatureRow, FeatureTable, TableBuilder, Value};
pub use model::{
    fixed_clock, system_clock, Clock, CommentaryEvent, EventKind, Match, MatchInfo, MatchResult,
    MatchStatus, Odds, Outcome, Score, Side, Statistic, Team,
};
