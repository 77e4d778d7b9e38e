//! Job descriptions
//!
//! A `JobSpec` is the immutable description of one recurring browser test:
//! which scenario to run, how often, against which browser, and with which
//! credentials. Scheduling state lives elsewhere.

use serde::Deserialize;
use std::fmt;
use std::time::Duration;

use crate::common::{Error, Result};

/// Browser the test runner drives
///
/// A closed set; unknown names are rejected at config load.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Browser {
    Chrome,
    Firefox,
    Edge,
    Safari,
}

impl Browser {
    /// The `-D browser=` value the test runner expects
    pub fn driver_arg(&self) -> &'static str {
        match self {
            Self::Chrome => "chrome",
            Self::Firefox => "firefox",
            Self::Edge => "edge",
            Self::Safari => "safari",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "chrome" | "chromium" => Some(Self::Chrome),
            "firefox" => Some(Self::Firefox),
            "edge" => Some(Self::Edge),
            "safari" => Some(Self::Safari),
            _ => None,
        }
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.driver_arg())
    }
}

/// Raw job attributes as they appear in the jobs file
#[derive(Debug, Clone, Deserialize)]
pub struct RawJob {
    pub interval: i64,
    pub browser: String,
    pub username: String,
    pub password: String,
}

/// Immutable description of one recurring test job
#[derive(Debug, Clone)]
pub struct JobSpec {
    name: String,
    interval: Duration,
    browser: Browser,
    username: String,
    password: String,
}

impl JobSpec {
    /// Validate raw attributes into a job spec
    pub fn from_raw(name: &str, raw: &RawJob) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::invalid_job(name, "empty job name"));
        }
        if raw.interval <= 0 {
            return Err(Error::invalid_job(
                name,
                format!("interval must be positive, got {}", raw.interval),
            ));
        }
        let browser = Browser::parse(&raw.browser).ok_or_else(|| {
            Error::invalid_job(name, format!("unsupported browser '{}'", raw.browser))
        })?;
        Ok(Self {
            name: name.to_string(),
            interval: Duration::from_secs(raw.interval as u64),
            browser,
            username: raw.username.clone(),
            password: raw.password.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn browser(&self) -> Browser {
        self.browser
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

// Jobs are identified by name within the registry.
impl PartialEq for JobSpec {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for JobSpec {}

// Credentials deliberately excluded from the rendered form.
impl fmt::Display for JobSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (every {}s on {})",
            self.name,
            self.interval.as_secs(),
            self.browser
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(interval: i64, browser: &str) -> RawJob {
        RawJob {
            interval,
            browser: browser.to_string(),
            username: "user".to_string(),
            password: "hunter2".to_string(),
        }
    }

    #[test]
    fn test_valid_job() {
        let job = JobSpec::from_raw("login", &raw(900, "Firefox")).unwrap();
        assert_eq!(job.name(), "login");
        assert_eq!(job.interval(), Duration::from_secs(900));
        assert_eq!(job.browser(), Browser::Firefox);
    }

    #[test]
    fn test_zero_or_negative_interval_rejected() {
        assert!(JobSpec::from_raw("a", &raw(0, "chrome")).is_err());
        assert!(JobSpec::from_raw("a", &raw(-5, "chrome")).is_err());
    }

    #[test]
    fn test_unknown_browser_rejected() {
        let err = JobSpec::from_raw("a", &raw(60, "netscape")).unwrap_err();
        assert!(err.to_string().contains("netscape"));
    }

    #[test]
    fn test_equality_is_by_name() {
        let a = JobSpec::from_raw("login", &raw(60, "chrome")).unwrap();
        let b = JobSpec::from_raw("login", &raw(900, "firefox")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_display_omits_credentials() {
        let job = JobSpec::from_raw("login", &raw(60, "chrome")).unwrap();
        let shown = job.to_string();
        assert_eq!(shown, "login (every 60s on chrome)");
        assert!(!shown.contains("hunter2"));
    }
}
