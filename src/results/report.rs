//! Run report parsing
//!
//! The test runner emits a JSON report whose first element holds the step
//! list for the scenario: `[0].elements[0].steps[*].result.duration`. A
//! step without a `result.duration` means the run stopped there (skipped
//! or aborted), so summation stops at the first such step and the partial
//! sum stands for the attempt.

use serde_json::Value;
use std::path::Path;

use crate::common::{Error, Result};

/// Durations harvested from one report
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    step_durations: Vec<f64>,
    complete: bool,
}

impl RunReport {
    /// Sum of the well-formed step durations
    pub fn total_duration(&self) -> f64 {
        self.step_durations.iter().sum()
    }

    pub fn steps_timed(&self) -> usize {
        self.step_durations.len()
    }

    /// False when the step sequence ended early
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Parse a report document
    pub fn parse(content: &str) -> Result<Self> {
        let doc: Value = serde_json::from_str(content)
            .map_err(|e| Error::ReportUnparseable(e.to_string()))?;

        let steps = doc
            .get(0)
            .and_then(|feature| feature.get("elements"))
            .and_then(|elements| elements.get(0))
            .and_then(|scenario| scenario.get("steps"))
            .and_then(Value::as_array)
            .ok_or_else(|| {
                Error::ReportUnparseable("no step list at [0].elements[0].steps".to_string())
            })?;

        let mut durations = Vec::with_capacity(steps.len());
        let mut complete = true;
        for step in steps {
            match step.get("result").and_then(|r| r.get("duration")).and_then(Value::as_f64) {
                Some(duration) => durations.push(duration),
                None => {
                    // Remaining steps were skipped.
                    complete = false;
                    break;
                }
            }
        }

        Ok(Self {
            step_durations: durations,
            complete,
        })
    }

    /// Read and parse a report file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ReportMissing(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }
}
