//! Test-runner invocation
//!
//! Builds the argv for one attempt: scenario file first, then `-D`
//! userdata pairs, output format, and the report path. Arguments are
//! passed as a structured list, never a joined shell string, so
//! credentials may contain spaces or shell metacharacters.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::common::paths;
use crate::config::JobSpec;

/// A fully-resolved runner invocation for one job attempt
#[derive(Debug, Clone)]
pub struct RunnerCommand {
    program: PathBuf,
    report: PathBuf,
    args: Vec<String>,
}

impl RunnerCommand {
    pub fn new(program: PathBuf, features_dir: &Path, results_dir: &Path, job: &JobSpec) -> Self {
        let feature = paths::feature_path(features_dir, job.name());
        let report = paths::report_path(results_dir, job.name());

        let args = vec![
            feature.display().to_string(),
            "-D".to_string(),
            format!("username={}", job.username()),
            "-D".to_string(),
            format!("password={}", job.password()),
            "-D".to_string(),
            format!("job_name={}", job.name()),
            "-D".to_string(),
            format!("browser={}", job.browser().driver_arg()),
            "-f".to_string(),
            "json.pretty".to_string(),
            "--no-logcapture".to_string(),
            "--no-summary".to_string(),
            "-o".to_string(),
            report.display().to_string(),
        ];

        Self {
            program,
            report,
            args,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn report(&self) -> &Path {
        &self.report
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Build the tokio command for one attempt.
    ///
    /// The child is killed when dropped so a timed-out or interrupted
    /// attempt does not leave a runner behind.
    pub fn build(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::job::RawJob;

    fn job() -> JobSpec {
        JobSpec::from_raw(
            "login",
            &RawJob {
                interval: 900,
                browser: "firefox".to_string(),
                username: "tester".to_string(),
                password: "p4ss word$".to_string(),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_argv_is_structured() {
        let cmd = RunnerCommand::new(
            PathBuf::from("behave"),
            Path::new("features"),
            Path::new("results"),
            &job(),
        );
        let args = cmd.args();
        assert_eq!(args[0], "features/login.feature");
        // Credential with spaces stays a single argument.
        assert!(args.contains(&"password=p4ss word$".to_string()));
        assert!(args.contains(&"browser=firefox".to_string()));
        assert!(args.contains(&"json.pretty".to_string()));
        assert_eq!(args.last().unwrap(), "results/login_results.json");
    }

    #[test]
    fn test_report_path_matches_store_layout() {
        let cmd = RunnerCommand::new(
            PathBuf::from("behave"),
            Path::new("features"),
            Path::new("results"),
            &job(),
        );
        assert_eq!(cmd.report(), Path::new("results/login_results.json"));
    }
}
