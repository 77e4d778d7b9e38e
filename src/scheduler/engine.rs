//! Scheduler engine
//!
//! A single tick-driven loop owns the registry and all scheduling state.
//! Each tick dispatches due jobs through the executor behind a global
//! concurrency cap; a slower timer re-fingerprints the jobs file and
//! admits additions. Completions flow back over a channel so failure
//! counters are only ever touched from this loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Semaphore};
use tokio::time::Instant;

use crate::common::settings::SchedulerSettings;
use crate::common::{Error, Result};
use crate::config::{ConfigSnapshot, ConfigWatcher, JobSpec};
use crate::runner::{ExecutionOutcome, Executor};

use super::registry::{Registry, SkipReason};

/// Completion message sent back from a worker task
struct Completion {
    name: String,
    outcome: ExecutionOutcome,
}

/// The job scheduling and execution-aggregation engine
pub struct Scheduler {
    watcher: ConfigWatcher,
    executor: Executor,
    settings: SchedulerSettings,
    registry: Registry,
    snapshot: ConfigSnapshot,
    permits: Arc<Semaphore>,
}

impl Scheduler {
    /// Load the jobs file and build the initial schedule.
    ///
    /// Job i first fires at `now + (i + 1) * stagger` so freshly started
    /// deployments do not fire every job at once.
    pub fn bootstrap(
        watcher: ConfigWatcher,
        executor: Executor,
        settings: SchedulerSettings,
    ) -> Result<Self> {
        let snapshot = watcher.load()?;
        let permits = Arc::new(Semaphore::new(settings.max_concurrent));
        let stagger = Duration::from_secs(settings.stagger_secs);

        let mut registry = Registry::new();
        let now = Instant::now();
        for spec in snapshot.jobs() {
            let first_fire = registry.last_fire_time(now) + stagger;
            registry.admit(spec.clone(), first_fire);
            tracing::debug!(job = %spec, "job admitted");
        }
        tracing::info!(jobs = registry.len(), "schedule built");

        Ok(Self {
            watcher,
            executor,
            settings,
            registry,
            snapshot,
            permits,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Run until an interrupt arrives or a job exceeds the failure
    /// threshold.
    pub async fn run(mut self) -> Result<()> {
        let (tx, mut completions) = mpsc::unbounded_channel::<Completion>();

        let mut tick = tokio::time::interval(Duration::from_secs(self.settings.tick_secs.max(1)));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut reload = tokio::time::interval(Duration::from_secs(self.settings.reload_period_secs));
        reload.reset(); // skip the immediate first tick

        // One ctrl_c future for the whole loop; the signal handler is
        // registered once and no delivery can slip between polls.
        let interrupt = tokio::signal::ctrl_c();
        tokio::pin!(interrupt);

        tracing::info!("scheduler running, press Ctrl+C to exit");

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    self.dispatch_due(&tx);
                }
                _ = reload.tick() => {
                    self.check_for_updates();
                }
                Some(completion) = completions.recv() => {
                    self.handle_completion(completion)?;
                }
                _ = &mut interrupt => {
                    tracing::warn!("interrupt received, stopping scheduler");
                    // Worker tasks hold kill-on-drop children; dropping the
                    // runtime reaps anything still in flight.
                    return Ok(());
                }
            }
        }
    }

    /// Fire every due job through the executor
    fn dispatch_due(&mut self, tx: &mpsc::UnboundedSender<Completion>) {
        let grace = Duration::from_secs(self.settings.misfire_grace_secs);
        let (due, skipped) = self.registry.take_due(Instant::now(), grace);

        for (name, reason) in skipped {
            match reason {
                SkipReason::StillRunning => {
                    tracing::warn!(job = %name, "previous run still in flight, dropping this fire");
                }
                SkipReason::Misfired => {
                    tracing::warn!(job = %name, "fire missed its grace window, dropping");
                }
            }
        }

        for spec in due {
            self.spawn_run(spec, tx.clone());
        }
    }

    fn spawn_run(&self, spec: JobSpec, tx: mpsc::UnboundedSender<Completion>) {
        let executor = self.executor.clone();
        let permits = Arc::clone(&self.permits);

        tokio::spawn(async move {
            // Closed only at shutdown, when the run result no longer matters.
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            tracing::info!(job = %spec.name(), "run starting");
            let outcome = executor.run(&spec).await;
            let _ = tx.send(Completion {
                name: spec.name().to_string(),
                outcome,
            });
        });
    }

    /// Update failure counters and escalate past the threshold
    fn handle_completion(&mut self, completion: Completion) -> Result<()> {
        let success = completion.outcome.is_success();
        let failures = self.registry.complete(&completion.name, success);

        if success {
            tracing::info!(job = %completion.name, mean = ?completion.outcome.mean, "run succeeded");
            return Ok(());
        }

        let threshold = self.settings.failure_threshold;
        tracing::error!(job = %completion.name, failures, threshold, "run failed");

        if failures >= threshold {
            tracing::error!(
                job = %completion.name,
                failures,
                "CRITICAL: failure threshold reached, terminating"
            );
            return Err(Error::RepeatedJobFailure {
                name: completion.name,
                failures,
                threshold,
            });
        }
        Ok(())
    }

    /// Re-fingerprint the jobs file and admit any added jobs.
    ///
    /// Removed or edited jobs are logged but never un-scheduled; a parse or
    /// read error leaves the last-known-good snapshot in force.
    fn check_for_updates(&mut self) {
        tracing::debug!("checking jobs file for updates");

        match self.watcher.changed(self.snapshot.fingerprint()) {
            Ok(false) => {
                tracing::debug!("no change in jobs file");
                return;
            }
            Ok(true) => {}
            Err(e) => {
                tracing::error!(error = %e, "could not check jobs file, keeping current schedule");
                return;
            }
        }

        tracing::warn!("jobs file changed, reloading");
        let new_snapshot = match self.watcher.load() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!(error = %e, "reload failed, keeping current schedule");
                return;
            }
        };

        let added = new_snapshot.added_since(&self.snapshot);
        let removed = new_snapshot.removed_since(&self.snapshot);
        for name in &removed {
            tracing::warn!(job = %name, "job removed from file but stays scheduled");
        }

        let stagger = Duration::from_secs(self.settings.stagger_secs);
        let now = Instant::now();
        for name in &added {
            let Some(spec) = new_snapshot.get(name) else {
                continue;
            };
            let first_fire = self.registry.last_fire_time(now) + stagger;
            if self.registry.admit(spec.clone(), first_fire) {
                tracing::info!(job = %spec, "job admitted from reload");
            }
        }
        if added.is_empty() {
            tracing::info!("jobs file changed but added no jobs");
        }

        self.snapshot = new_snapshot;
    }
}
