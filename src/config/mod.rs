//! Job configuration: specs, loading, and change detection

pub mod job;
pub mod watcher;

pub use job::{Browser, JobSpec};
pub use watcher::{ConfigSnapshot, ConfigWatcher};
