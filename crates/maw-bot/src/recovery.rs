//! Recovery job.
//!
//! Every interval, prey in relationships that have been Active and untouched
//! for longer than the idle threshold regain some health, depending on how
//! their stats compare with the predator's. The job never changes a
//! relationship's status.

#[path = "recovery_tests.rs"]
mod recovery_tests;

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use maw_store::{EntityStore, SystemClock, WallClock};
use maw_types::stats::HEALTH_MAX;
use maw_types::{ParticipantStats, Relationship};
use tokio::sync::RwLock;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Timestamp of the last finished sweep, shared with the health endpoint
pub type LastSweep = Arc<RwLock<Option<DateTime<Utc>>>>;

/// Health change for one prey in one sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Too aroused to heal this cycle
    Suppressed,
    /// Already at maximum health
    AtFull,
    Gain(i32),
}

/// How much health `prey` regains while held by a predator with `pred` stats.
pub fn health_gain(prey: &ParticipantStats, pred: &ParticipantStats) -> Recovery {
    let aroused = i64::from(prey.arousal) > 45 - i64::from(pred.resistance);
    let composed = i64::from(prey.euphoria) - 2 * i64::from(prey.defiance) < 50;
    if aroused && composed {
        return Recovery::Suppressed;
    }

    let tier = match prey.defiance.cmp(&pred.digestion) {
        std::cmp::Ordering::Greater => 5,
        std::cmp::Ordering::Equal => 3,
        std::cmp::Ordering::Less => 1,
    };

    if prey.health >= HEALTH_MAX {
        return Recovery::AtFull;
    }
    Recovery::Gain(tier.min(HEALTH_MAX - prey.health))
}

/// Tally of one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub examined: usize,
    pub healed: usize,
    pub suppressed: usize,
    pub at_full: usize,
    pub failed: usize,
}

enum ItemOutcome {
    Healed,
    Suppressed,
    AtFull,
    Missing(&'static str),
}

/// Clears the in-flight flag when the sweep ends, even on early return.
struct SweepGuard<'a>(&'a AtomicBool);

impl<'a> SweepGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for SweepGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct RecoveryJob<S: EntityStore, C: WallClock = SystemClock> {
    store: Arc<S>,
    clock: C,
    idle_threshold: chrono::Duration,
    concurrency: usize,
    running: AtomicBool,
    last_sweep: LastSweep,
}

impl<S: EntityStore, C: WallClock> RecoveryJob<S, C> {
    pub fn new(store: Arc<S>, clock: C, idle_threshold: chrono::Duration, concurrency: usize) -> Self {
        Self {
            store,
            clock,
            idle_threshold,
            concurrency: concurrency.max(1),
            running: AtomicBool::new(false),
            last_sweep: LastSweep::default(),
        }
    }

    /// Publish sweep completion times into `last_sweep`.
    pub fn with_last_sweep(mut self, last_sweep: LastSweep) -> Self {
        self.last_sweep = last_sweep;
        self
    }

    /// Sweep every `interval` until `shutdown` resolves. The first sweep runs
    /// one interval after start; ticks missed by a long sweep are skipped.
    pub async fn run(self: Arc<Self>, interval: Duration, shutdown: impl Future<Output = ()> + Send) {
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!(interval_secs = interval.as_secs(), "Recovery job started");
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Recovery job stopping");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep().await {
                        error!(error = %e, "Recovery sweep could not list relationships");
                    }
                }
            }
        }
    }

    /// One pass over idle Active relationships. Returns `None` when another
    /// sweep is still in flight.
    pub async fn sweep(&self) -> maw_store::Result<Option<SweepReport>> {
        let Some(_guard) = SweepGuard::acquire(&self.running) else {
            debug!("Previous recovery sweep still running; skipping");
            return Ok(None);
        };

        let now = self.clock.now();
        let idle = self.store.idle_active(now - self.idle_threshold).await?;
        let mut report = SweepReport {
            examined: idle.len(),
            ..SweepReport::default()
        };

        let outcomes: Vec<_> = stream::iter(idle)
            .map(|rel| async move {
                let outcome = self.recover(&rel).await;
                (rel, outcome)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        for (rel, outcome) in outcomes {
            match outcome {
                Ok(ItemOutcome::Healed) => report.healed += 1,
                Ok(ItemOutcome::Suppressed) => report.suppressed += 1,
                Ok(ItemOutcome::AtFull) => report.at_full += 1,
                Ok(ItemOutcome::Missing(what)) => {
                    warn!(relationship = %rel.id, prey = %rel.prey, "Recovery skipped: {} missing", what);
                    report.failed += 1;
                }
                Err(e) => {
                    warn!(relationship = %rel.id, prey = %rel.prey, error = %e, "Recovery failed");
                    report.failed += 1;
                }
            }
        }

        *self.last_sweep.write().await = Some(now);
        info!(
            examined = report.examined,
            healed = report.healed,
            suppressed = report.suppressed,
            at_full = report.at_full,
            failed = report.failed,
            "Recovery sweep finished"
        );
        Ok(Some(report))
    }

    async fn recover(&self, rel: &Relationship) -> maw_store::Result<ItemOutcome> {
        if self.store.participant(rel.prey).await?.is_none() {
            return Ok(ItemOutcome::Missing("prey participant"));
        }
        let Some(prey) = self.store.stats(rel.prey).await? else {
            return Ok(ItemOutcome::Missing("prey stats"));
        };
        let Some(pred) = self.store.stats(rel.predator).await? else {
            return Ok(ItemOutcome::Missing("predator stats"));
        };

        match health_gain(&prey, &pred) {
            Recovery::Suppressed => Ok(ItemOutcome::Suppressed),
            Recovery::AtFull => Ok(ItemOutcome::AtFull),
            Recovery::Gain(gain) => {
                let health = prey.health + gain;
                if !self.store.set_health(rel.prey, health).await? {
                    return Ok(ItemOutcome::Missing("prey stats"));
                }
                debug!(prey = %rel.prey, gain, health, "Prey recovered");
                Ok(ItemOutcome::Healed)
            }
        }
    }
}
