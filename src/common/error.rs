//! Error types for the webtester scheduler
//!
//! Per-attempt and per-parse failures are recovered where they occur; only
//! repeated-failure escalation and unrecoverable startup errors reach main.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the webtester scheduler
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    #[error("Jobs file not found at '{0}'")]
    ConfigMissing(PathBuf),

    #[error("Failed to parse jobs file: {0}")]
    ConfigParse(String),

    #[error("Invalid job '{name}': {reason}")]
    InvalidJob { name: String, reason: String },

    #[error("Job '{0}' is not defined in the jobs file")]
    JobNotFound(String),

    #[error("Invalid settings file: {0}")]
    SettingsParse(String),

    // === Runner Errors ===
    #[error("Failed to spawn test runner '{program}': {error}")]
    RunnerSpawn { program: String, error: String },

    #[error("Test run timed out after {0} seconds")]
    RunTimeout(u64),

    // === Report Errors ===
    #[error("Result report not found at '{0}'")]
    ReportMissing(PathBuf),

    #[error("Result report could not be parsed: {0}")]
    ReportUnparseable(String),

    // === Execution Errors ===
    #[error("Job '{0}' produced no usable durations across all attempts")]
    NoRetainedDurations(String),

    #[error("Job '{name}' failed {failures} consecutive runs (threshold {threshold})")]
    RepeatedJobFailure {
        name: String,
        failures: u32,
        threshold: u32,
    },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an invalid job error
    pub fn invalid_job(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidJob {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a runner spawn error
    pub fn runner_spawn(program: &str, error: impl ToString) -> Self {
        Self::RunnerSpawn {
            program: program.to_string(),
            error: error.to_string(),
        }
    }
}
