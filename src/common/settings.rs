//! Scheduler tuning settings
//!
//! Loaded from an optional TOML file; every field has a sensible default so
//! a missing file yields a fully usable configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{Error, Result};

/// Main settings structure
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Test runner invocation
    #[serde(default)]
    pub runner: RunnerSettings,

    /// Scheduling behavior
    #[serde(default)]
    pub scheduler: SchedulerSettings,

    /// Filesystem layout
    #[serde(default)]
    pub paths: PathSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            runner: RunnerSettings::default(),
            scheduler: SchedulerSettings::default(),
            paths: PathSettings::default(),
        }
    }
}

/// Test runner invocation settings
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerSettings {
    /// Program to invoke for each attempt; a bare name is resolved on PATH
    #[serde(default = "default_program")]
    pub program: String,

    /// Attempts per job run
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Wall-clock limit per attempt, in seconds
    #[serde(default = "default_attempt_timeout")]
    pub attempt_timeout_secs: u64,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            program: default_program(),
            retry_count: default_retry_count(),
            attempt_timeout_secs: default_attempt_timeout(),
        }
    }
}

fn default_program() -> String {
    "behave".to_string()
}
fn default_retry_count() -> u32 {
    5
}
fn default_attempt_timeout() -> u64 {
    1800
}

/// Scheduling behavior settings
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSettings {
    /// Maximum jobs executing at once across the whole registry
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Consecutive failures tolerated before the process escalates
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Lateness tolerated before a fire is counted as missed, in seconds
    #[serde(default = "default_misfire_grace")]
    pub misfire_grace_secs: u64,

    /// Seconds between jobs-file change checks
    #[serde(default = "default_reload_period")]
    pub reload_period_secs: u64,

    /// Spacing between initial/admitted job start times, in seconds
    #[serde(default = "default_stagger")]
    pub stagger_secs: u64,

    /// Tick loop resolution, in seconds
    #[serde(default = "default_tick")]
    pub tick_secs: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            failure_threshold: default_failure_threshold(),
            misfire_grace_secs: default_misfire_grace(),
            reload_period_secs: default_reload_period(),
            stagger_secs: default_stagger(),
            tick_secs: default_tick(),
        }
    }
}

fn default_max_concurrent() -> usize {
    3
}
fn default_failure_threshold() -> u32 {
    2
}
fn default_misfire_grace() -> u64 {
    10
}
fn default_reload_period() -> u64 {
    300
}
fn default_stagger() -> u64 {
    900
}
fn default_tick() -> u64 {
    1
}

/// Filesystem layout settings
#[derive(Debug, Clone, Deserialize)]
pub struct PathSettings {
    /// Directory holding `<job>.feature` scenario files
    #[serde(default = "default_features_dir")]
    pub features_dir: PathBuf,

    /// Directory receiving reports, CSV summaries, and means
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,

    /// Directory receiving the daemon log file
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            features_dir: default_features_dir(),
            results_dir: default_results_dir(),
            log_dir: default_log_dir(),
        }
    }
}

fn default_features_dir() -> PathBuf {
    PathBuf::from("features")
}
fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}
fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

impl Settings {
    /// Load settings from a TOML file, or defaults if no path was given
    /// or the file does not exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| Error::SettingsParse(e.to_string()))
    }

    /// Resolve the runner program to an executable path.
    ///
    /// A bare program name is searched on PATH; anything with a path
    /// separator is used as-is so tests can point at a local binary.
    pub fn runner_program(&self) -> PathBuf {
        let program = &self.runner.program;
        if program.contains(std::path::MAIN_SEPARATOR) {
            return PathBuf::from(program);
        }
        which::which(program).unwrap_or_else(|_| PathBuf::from(program))
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.runner.attempt_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_production_tuning() {
        let s = Settings::default();
        assert_eq!(s.runner.retry_count, 5);
        assert_eq!(s.runner.attempt_timeout_secs, 1800);
        assert_eq!(s.scheduler.max_concurrent, 3);
        assert_eq!(s.scheduler.failure_threshold, 2);
        assert_eq!(s.scheduler.misfire_grace_secs, 10);
        assert_eq!(s.scheduler.reload_period_secs, 300);
        assert_eq!(s.scheduler.stagger_secs, 900);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let s: Settings = toml::from_str(
            r#"
            [runner]
            retry_count = 2

            [scheduler]
            stagger_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(s.runner.retry_count, 2);
        assert_eq!(s.runner.program, "behave");
        assert_eq!(s.scheduler.stagger_secs, 5);
        assert_eq!(s.scheduler.max_concurrent, 3);
        assert_eq!(s.paths.results_dir, PathBuf::from("results"));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let s = Settings::load(Some(Path::new("/nonexistent/webtester.toml"))).unwrap();
        assert_eq!(s.runner.retry_count, 5);
    }

    #[test]
    fn test_explicit_program_path_is_not_resolved() {
        let mut s = Settings::default();
        s.runner.program = "/opt/bin/behave".to_string();
        assert_eq!(s.runner_program(), PathBuf::from("/opt/bin/behave"));
    }
}
