//! webtester — scheduler and result aggregator for browser-driven
//! end-to-end test jobs
//!
//! Jobs defined in a YAML file are fired on their own intervals, each run
//! retried several times against an external test-runner subprocess, and
//! the per-run durations trimmed, averaged, and persisted. The jobs file
//! is watched so added jobs join the schedule without a restart.

pub mod common;
pub mod config;
pub mod results;
pub mod runner;
pub mod scheduler;

// Re-export commonly used types for tests
pub use common::{Error, Result, Settings};
pub use config::{Browser, ConfigWatcher, JobSpec};
pub use runner::{ExecutionOutcome, Executor, RunStatus};
pub use scheduler::Scheduler;
