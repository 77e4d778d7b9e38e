//! Mock test-runner binary for integration testing
//!
//! Stands in for the real behave-style runner: accepts the same argv
//! surface and writes a report file at the `-o` path. Behavior is driven
//! by environment variables so tests can simulate healthy, partial,
//! blank, absent, and hung runs:
//!
//! - `MOCK_RUNNER_MODE`: `success` (default), `partial`, `blank`,
//!   `no_report`, `hang`
//! - `MOCK_RUNNER_DURATIONS`: comma-separated step durations for the
//!   report (default `1.0,2.5`)
//! - `MOCK_RUNNER_COUNTER_FILE`: if set, a file whose byte length counts
//!   invocations; one byte is appended per run

use serde_json::{json, Value};
use std::io::Write;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let report_path = output_path(&args);

    if let Ok(counter) = std::env::var("MOCK_RUNNER_COUNTER_FILE") {
        if let Ok(mut f) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(counter)
        {
            let _ = f.write_all(b".");
        }
    }

    let mode = std::env::var("MOCK_RUNNER_MODE").unwrap_or_else(|_| "success".to_string());

    match mode.as_str() {
        "no_report" => {}
        "hang" => loop {
            std::thread::sleep(std::time::Duration::from_secs(60));
        },
        "blank" => {
            if let Some(path) = report_path {
                let _ = std::fs::write(path, "");
            }
        }
        "partial" => {
            // Timed steps followed by one skipped step.
            if let Some(path) = report_path {
                let mut steps = duration_steps();
                steps.push(json!({}));
                let _ = std::fs::write(path, report(steps).to_string());
            }
        }
        _ => {
            if let Some(path) = report_path {
                let _ = std::fs::write(path, report(duration_steps()).to_string());
            }
        }
    }
}

/// Value of the `-o` argument
fn output_path(args: &[String]) -> Option<String> {
    args.iter()
        .position(|a| a == "-o")
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn duration_steps() -> Vec<Value> {
    let raw = std::env::var("MOCK_RUNNER_DURATIONS").unwrap_or_else(|_| "1.0,2.5".to_string());
    raw.split(',')
        .filter_map(|s| s.trim().parse::<f64>().ok())
        .map(|d| json!({"result": {"duration": d}}))
        .collect()
}

fn report(steps: Vec<Value>) -> Value {
    json!([{"elements": [{"steps": steps}]}])
}
