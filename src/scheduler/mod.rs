//! Interval scheduling: registry, tick loop, reload, and escalation

pub mod engine;
pub mod registry;

pub use engine::Scheduler;
pub use registry::{Registry, ScheduledJob, SkipReason};
