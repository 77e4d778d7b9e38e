//! Logging and tracing configuration
//!
//! The scheduler daemon logs to a rolling file in addition to stdout since
//! it runs unattended for long stretches; one-shot commands log to stdout
//! only.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Initialize tracing for one-shot commands (stdout logging)
///
/// Logs are controlled by the `RUST_LOG` environment variable.
/// Default level is INFO for this crate, WARN for dependencies.
pub fn init_cli() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("webtester=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// Initialize tracing for the scheduler daemon (file + stdout logging)
///
/// The daemon logs to both:
/// 1. `<log_dir>/webtester.log` (full detail, no ANSI)
/// 2. stdout (compact, for interactive runs)
///
/// Returns the appender guard, which must stay alive for the lifetime of
/// the process, and the log file path if file logging could be set up.
pub fn init_daemon(log_dir: &Path) -> (Option<WorkerGuard>, Option<PathBuf>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("webtester=debug,info"));

    if std::fs::create_dir_all(log_dir).is_ok() {
        let appender = tracing_appender::rolling::never(log_dir, "webtester.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);

        let file_layer = fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true);

        // The stdout layer is built per branch; fmt::Layer is monomorphic
        // over the subscriber stack it extends.
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .compact(),
            )
            .init();

        return (Some(guard), Some(log_dir.join("webtester.log")));
    }

    eprintln!("Warning: could not create log directory '{}'", log_dir.display());

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .compact(),
        )
        .init();

    (None, None)
}
