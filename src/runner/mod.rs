//! Test-runner invocation and single-job execution

pub mod command;
pub mod executor;

pub use command::RunnerCommand;
pub use executor::{ExecutionOutcome, Executor, RunStatus};
