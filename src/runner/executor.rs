//! Single-job execution strategy
//!
//! One job run is a fixed number of runner attempts, each bounded by a
//! wall-clock timeout. Attempts that time out, fail to spawn, or produce
//! an unreadable report contribute nothing; whatever durations survive are
//! outlier-trimmed and averaged into the job's summary files. Only a run
//! with zero usable attempts counts as failed.

use std::path::PathBuf;
use std::time::Duration;

use crate::common::{Error, Result, Settings};
use crate::config::JobSpec;
use crate::results::ResultStore;

use super::command::RunnerCommand;

/// Whether a job run produced a usable mean
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    Failed,
}

/// Outcome of one complete job run (all attempts)
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub status: RunStatus,
    /// Durations retained after outlier trimming, in attempt order
    pub durations: Vec<f64>,
    /// Trimmed mean, present iff status is Success
    pub mean: Option<f64>,
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }
}

/// Runs jobs against the external test runner
#[derive(Debug, Clone)]
pub struct Executor {
    store: ResultStore,
    program: PathBuf,
    features_dir: PathBuf,
    retry_count: u32,
    attempt_timeout: Duration,
}

impl Executor {
    pub fn new(settings: &Settings, store: ResultStore) -> Self {
        Self {
            store,
            program: settings.runner_program(),
            features_dir: settings.paths.features_dir.clone(),
            retry_count: settings.runner.retry_count,
            attempt_timeout: settings.attempt_timeout(),
        }
    }

    /// Run all attempts for one job and write its summary files
    pub async fn run(&self, job: &JobSpec) -> ExecutionOutcome {
        let command = RunnerCommand::new(
            self.program.clone(),
            &self.features_dir,
            self.store.results_dir(),
            job,
        );

        let mut durations = Vec::with_capacity(self.retry_count as usize);

        for attempt in 1..=self.retry_count {
            tracing::info!(job = %job.name(), attempt, total = self.retry_count, "attempt starting");

            // A leftover report from a previous attempt must not be
            // mistaken for this attempt's output.
            if let Err(e) = self.store.clear_report(job.name()) {
                tracing::error!(job = %job.name(), error = %e, "could not clear stale report");
            }

            if let Err(e) = self.run_attempt(&command).await {
                match &e {
                    Error::RunTimeout(_) => {
                        tracing::error!(job = %job.name(), attempt, error = %e, "CRITICAL: attempt timed out");
                    }
                    _ => {
                        tracing::error!(job = %job.name(), attempt, error = %e, "attempt failed");
                    }
                }
            }

            if let Some(duration) = self.store.record_attempt(job.name()) {
                durations.push(duration);
            }

            tracing::info!(job = %job.name(), attempt, total = self.retry_count, "attempt finished");
        }

        let retained = trim_outliers(durations);
        if retained.is_empty() {
            tracing::error!(job = %job.name(), "all attempts failed, no mean written");
            return ExecutionOutcome {
                status: RunStatus::Failed,
                durations: retained,
                mean: None,
            };
        }

        let mean = retained.iter().sum::<f64>() / retained.len() as f64;

        if let Err(e) = self.store.append_run(job.name(), &retained) {
            tracing::error!(job = %job.name(), error = %e, "could not append run summary");
        }
        if let Err(e) = self.store.write_mean(job.name(), mean) {
            tracing::error!(job = %job.name(), error = %e, "could not write mean");
        }

        tracing::info!(job = %job.name(), mean = %format!("{mean:.3}"), samples = retained.len(), "run complete");

        ExecutionOutcome {
            status: RunStatus::Success,
            durations: retained,
            mean: Some(mean),
        }
    }

    /// Drive one runner subprocess to completion or timeout.
    ///
    /// A non-zero exit is not an error here; the runner exits non-zero for
    /// failed scenarios while still writing a usable report.
    async fn run_attempt(&self, command: &RunnerCommand) -> Result<()> {
        let mut child = command
            .build()
            .spawn()
            .map_err(|e| Error::runner_spawn(&command.program().to_string_lossy(), e))?;

        match tokio::time::timeout(self.attempt_timeout, child.wait()).await {
            Ok(Ok(status)) => {
                if !status.success() {
                    tracing::warn!(code = ?status.code(), "runner exited non-zero");
                }
                Ok(())
            }
            Ok(Err(e)) => Err(Error::Io(e)),
            Err(_) => {
                if let Err(e) = child.kill().await {
                    tracing::error!(error = %e, "could not kill timed-out runner");
                }
                Err(Error::RunTimeout(self.attempt_timeout.as_secs()))
            }
        }
    }
}

/// Drop one max and one min sample when four or more were retained.
///
/// With three or fewer samples every value is kept.
pub fn trim_outliers(mut durations: Vec<f64>) -> Vec<f64> {
    if durations.len() >= 4 {
        let max = durations
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max);
        if let Some(pos) = durations.iter().position(|&d| d == max) {
            durations.remove(pos);
        }
        let min = durations.iter().cloned().fold(f64::INFINITY, f64::min);
        if let Some(pos) = durations.iter().position(|&d| d == min) {
            durations.remove(pos);
        }
    }
    durations
}
