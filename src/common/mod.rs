//! Common utilities shared across the scheduler, executor, and CLI

pub mod error;
pub mod logging;
pub mod paths;
pub mod settings;

pub use error::{Error, Result};
pub use settings::Settings;
