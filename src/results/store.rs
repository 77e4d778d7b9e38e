//! Durable result bookkeeping
//!
//! Three artifacts per job, all namespaced by job name under the results
//! directory: the runner's JSON report (read here, written by the runner),
//! a rolling CSV with one row per job run, and a scalar file holding the
//! latest trimmed mean.

use chrono::{SecondsFormat, Utc};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::report::RunReport;
use crate::common::{paths, Error, Result};

/// Reads reports and writes per-run summaries for all jobs
#[derive(Debug, Clone)]
pub struct ResultStore {
    results_dir: PathBuf,
}

impl ResultStore {
    /// Open a store rooted at `results_dir`, creating it and its `totals`
    /// subdirectory if needed.
    pub fn open(results_dir: impl Into<PathBuf>) -> Result<Self> {
        let results_dir = results_dir.into();
        std::fs::create_dir_all(results_dir.join("totals"))?;
        Ok(Self { results_dir })
    }

    /// Path the runner is told to write its report to
    pub fn report_path(&self, job_name: &str) -> PathBuf {
        paths::report_path(&self.results_dir, job_name)
    }

    pub fn summary_path(&self, job_name: &str) -> PathBuf {
        paths::summary_path(&self.results_dir, job_name)
    }

    pub fn mean_path(&self, job_name: &str) -> PathBuf {
        paths::mean_path(&self.results_dir, job_name)
    }

    /// Harvest the duration of one attempt from the job's report file.
    ///
    /// Returns `None` when the report is missing, blank, or structurally
    /// malformed; those attempts simply contribute nothing. A report that
    /// parses but timed no steps counts as a 0.0-duration attempt.
    pub fn record_attempt(&self, job_name: &str) -> Option<f64> {
        let path = self.report_path(job_name);
        match RunReport::load(&path) {
            Ok(report) => {
                if !report.is_complete() {
                    tracing::warn!(
                        job = %job_name,
                        steps_timed = report.steps_timed(),
                        "report ended early, keeping partial duration"
                    );
                }
                Some(report.total_duration())
            }
            Err(Error::ReportMissing(path)) => {
                tracing::error!(job = %job_name, path = %path.display(), "no report produced");
                None
            }
            Err(e) => {
                tracing::error!(job = %job_name, error = %e, "report could not be loaded");
                None
            }
        }
    }

    /// Append one timestamped row of retained durations to the job's
    /// rolling CSV, creating the file on first write.
    pub fn append_run(&self, job_name: &str, durations: &[f64]) -> Result<()> {
        let path = self.summary_path(job_name);
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;

        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let mut row = timestamp;
        for d in durations {
            row.push_str(&format!(",{d:.3}"));
        }
        row.push('\n');
        file.write_all(row.as_bytes())?;
        Ok(())
    }

    /// Overwrite the job's scalar summary with the trimmed mean
    pub fn write_mean(&self, job_name: &str, mean: f64) -> Result<()> {
        let path = self.mean_path(job_name);
        std::fs::write(&path, format!("{mean:.3}\n"))?;
        Ok(())
    }

    /// Remove a stale report so a failed attempt cannot be re-parsed as the
    /// next attempt's output.
    pub fn clear_report(&self, job_name: &str) -> Result<()> {
        let path = self.report_path(job_name);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        Ok(())
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, ResultStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::open(dir.path().join("results")).unwrap();
        (dir, store)
    }

    fn write_report(store: &ResultStore, job: &str, steps: &str) {
        let content = format!(r#"[{{"elements": [{{"steps": [{steps}]}}]}}]"#);
        std::fs::write(store.report_path(job), content).unwrap();
    }

    #[test]
    fn test_open_creates_totals_dir() {
        let (_dir, store) = store();
        assert!(store.results_dir().join("totals").is_dir());
    }

    #[test]
    fn test_record_attempt_sums_report() {
        let (_dir, store) = store();
        write_report(
            &store,
            "login",
            r#"{"result": {"duration": 1.0}}, {"result": {"duration": 2.5}}"#,
        );
        assert_eq!(store.record_attempt("login"), Some(3.5));
    }

    #[test]
    fn test_record_attempt_missing_and_blank_reports() {
        let (_dir, store) = store();
        assert_eq!(store.record_attempt("login"), None);

        std::fs::write(store.report_path("login"), "").unwrap();
        assert_eq!(store.record_attempt("login"), None);
    }

    #[test]
    fn test_append_run_accumulates_rows() {
        let (_dir, store) = store();
        store.append_run("login", &[1.0, 2.25]).unwrap();
        store.append_run("login", &[3.5]).unwrap();

        let content = std::fs::read_to_string(store.summary_path("login")).unwrap();
        let rows: Vec<&str> = content.lines().collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].ends_with(",1.000,2.250"));
        assert!(rows[1].ends_with(",3.500"));
    }

    #[test]
    fn test_write_mean_overwrites() {
        let (_dir, store) = store();
        store.write_mean("login", 11.16666).unwrap();
        store.write_mean("login", 12.0).unwrap();
        let content = std::fs::read_to_string(store.mean_path("login")).unwrap();
        assert_eq!(content, "12.000\n");
    }

    #[test]
    fn test_clear_report_removes_stale_file() {
        let (_dir, store) = store();
        write_report(&store, "login", r#"{"result": {"duration": 1.0}}"#);
        store.clear_report("login").unwrap();
        assert_eq!(store.record_attempt("login"), None);
        // Clearing when nothing exists is fine.
        store.clear_report("login").unwrap();
    }
}
