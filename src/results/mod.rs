//! Result report parsing and durable summary bookkeeping

pub mod report;
pub mod store;

pub use report::RunReport;
pub use store::ResultStore;
