use std::sync::Arc;
use std::time::Duration;

use matchday_core::{update, BatchEffect, BatchMsg, BatchState, BatchSummary, Match, MatchDigest};
use matchday_logging::{md_error, md_info, md_warn};
use rand::Rng;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::assemble::MatchAssembler;
use crate::export::Exporter;
use crate::MatchTarget;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerSettings {
    pub concurrency: usize,
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub save_interval: usize,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            concurrency: 10,
            min_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(3000),
            save_interval: 20,
        }
    }
}

#[derive(Debug)]
pub struct BatchOutcome {
    /// Successful records in arrival order.
    pub matches: Vec<Match>,
    pub failed: Vec<String>,
    pub summary: BatchSummary,
    /// True when the state machine asked for a final export.
    pub export_requested: bool,
    pub cancelled: bool,
}

enum TaskOutcome {
    Scraped(Box<Match>),
    Failed(String),
    Skipped,
}

/// Assembles targets concurrently, feeding each arrival to the batch state
/// machine and carrying out the checkpoint effects it returns.
pub struct BatchRunner {
    assembler: Arc<MatchAssembler>,
    checkpoints: Option<Exporter>,
    settings: RunnerSettings,
    cancel: CancellationToken,
}

impl BatchRunner {
    pub fn new(assembler: Arc<MatchAssembler>, settings: RunnerSettings) -> Self {
        Self {
            assembler,
            checkpoints: None,
            settings,
            cancel: CancellationToken::new(),
        }
    }

    /// Checkpoints go to this exporter's directory; without one they are skipped.
    pub fn with_checkpoints(mut self, exporter: Exporter) -> Self {
        self.checkpoints = Some(exporter);
        self
    }

    /// Cancelling stops new targets from starting; finished ones are kept.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn run(&self, targets: Vec<MatchTarget>) -> BatchOutcome {
        let (mut state, _) = update(
            BatchState::new(self.settings.save_interval),
            BatchMsg::Started {
                total: targets.len(),
            },
        );
        md_info!(
            "Scraping {} matches with concurrency {}",
            targets.len(),
            self.settings.concurrency
        );

        let semaphore = Arc::new(Semaphore::new(self.settings.concurrency.max(1)));
        let mut tasks = JoinSet::new();
        for target in targets {
            let assembler = self.assembler.clone();
            let semaphore = semaphore.clone();
            let cancel = self.cancel.clone();
            let (min_delay, max_delay) = (self.settings.min_delay, self.settings.max_delay);
            tasks.spawn(async move {
                let _permit = tokio::select! {
                    _ = cancel.cancelled() => return TaskOutcome::Skipped,
                    permit = semaphore.acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => return TaskOutcome::Skipped,
                    },
                };
                if cancel.is_cancelled() {
                    return TaskOutcome::Skipped;
                }
                let outcome = match assembler.assemble(&target).await {
                    Ok(record) => TaskOutcome::Scraped(Box::new(record)),
                    Err(_) => TaskOutcome::Failed(target.match_id.clone()),
                };
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(politeness_delay(min_delay, max_delay)) => {}
                }
                outcome
            });
        }

        let mut matches = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let msg = match joined {
                Ok(TaskOutcome::Scraped(record)) => {
                    let msg = BatchMsg::MatchScraped(MatchDigest::from(record.as_ref()));
                    matches.push(*record);
                    msg
                }
                Ok(TaskOutcome::Failed(match_id)) => BatchMsg::MatchFailed { match_id },
                Ok(TaskOutcome::Skipped) => continue,
                Err(err) => {
                    md_error!("match task aborted: {err}");
                    continue;
                }
            };
            let (next, effects) = update(state, msg);
            state = next;
            self.apply(effects);
        }

        let (state, effects) = update(state, BatchMsg::Finished);
        let export_requested = effects
            .iter()
            .any(|effect| matches!(effect, BatchEffect::Export { .. }));
        self.apply(effects);

        let cancelled = self.cancel.is_cancelled();
        if cancelled {
            md_warn!("batch cancelled after {} matches", matches.len());
        }
        BatchOutcome {
            matches,
            failed: state.failed().to_vec(),
            summary: state.summary(),
            export_requested,
            cancelled,
        }
    }

    fn apply(&self, effects: Vec<BatchEffect>) {
        for effect in effects {
            match effect {
                BatchEffect::WriteCheckpoint(entries) => {
                    if let Some(exporter) = &self.checkpoints {
                        if let Err(err) = exporter.write_checkpoint(&entries) {
                            md_error!("checkpoint write failed: {err}");
                        }
                    }
                }
                // Exporting needs the dataset label and format; the caller owns that.
                BatchEffect::Export { .. } => {}
            }
        }
    }
}

fn politeness_delay(min: Duration, max: Duration) -> Duration {
    let millis = |d: Duration| u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
    let (low, high) = (millis(min), millis(max));
    if high <= low {
        return Duration::from_millis(low);
    }
    Duration::from_millis(rand::thread_rng().gen_range(low..=high))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_stays_in_range() {
        let (min, max) = (Duration::from_millis(5), Duration::from_millis(9));
        for _ in 0..50 {
            let delay = politeness_delay(min, max);
            assert!(delay >= min && delay <= max);
        }
        assert_eq!(politeness_delay(max, min), max);
    }

    #[test]
    fn huge_delays_clamp_instead_of_wrapping() {
        let delay = politeness_delay(Duration::MAX, Duration::MAX);
        assert_eq!(delay, Duration::from_millis(u64::MAX));
    }
}
