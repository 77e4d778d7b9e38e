//! Result and scenario path construction
//!
//! All per-job files are namespaced by the job name so concurrent jobs
//! never write to the same path: `features/<name>.feature` in,
//! `results/<name>_results.json`, `results/<name>_results.csv`, and
//! `results/totals/<name>.txt` out.

use std::path::{Path, PathBuf};

/// Path to a job's scenario file
pub fn feature_path(features_dir: &Path, job_name: &str) -> PathBuf {
    features_dir.join(format!("{job_name}.feature"))
}

/// Path the test runner writes its structured report to
pub fn report_path(results_dir: &Path, job_name: &str) -> PathBuf {
    results_dir.join(format!("{job_name}_results.json"))
}

/// Path of the rolling per-run CSV summary
pub fn summary_path(results_dir: &Path, job_name: &str) -> PathBuf {
    results_dir.join(format!("{job_name}_results.csv"))
}

/// Path of the overwritten trimmed-mean scalar file
pub fn mean_path(results_dir: &Path, job_name: &str) -> PathBuf {
    results_dir.join("totals").join(format!("{job_name}.txt"))
}
