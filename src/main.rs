//! webtester — scheduler for browser-driven end-to-end test jobs
//!
//! `run` starts the long-lived scheduler; `check` validates the jobs file
//! before a deploy; `once` reproduces a single job run interactively.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;

use webtester::common::logging;
use webtester::results::ResultStore;
use webtester::{ConfigWatcher, Executor, Scheduler, Settings};

#[derive(Parser)]
#[command(name = "webtester", about = "Scheduler for browser-driven end-to-end test jobs")]
#[command(version, long_about = None)]
struct Cli {
    /// Path to the jobs file
    #[arg(long, default_value = "webtesterconf.yaml", global = true)]
    jobs: PathBuf,

    /// Path to the optional settings file
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the scheduler and run until interrupted
    Run,

    /// Validate the jobs file and list the parsed jobs
    Check,

    /// Execute one job immediately and print its outcome
    Once {
        /// Name of the job to run
        name: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::load(cli.settings.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // The daemon keeps a file log; one-shot commands log to stdout only.
    let _guard = if matches!(cli.command, Commands::Run) {
        let (guard, log_path) = logging::init_daemon(&settings.paths.log_dir);
        if let Some(path) = log_path {
            tracing::info!(log = %path.display(), "file logging enabled");
        }
        guard
    } else {
        logging::init_cli();
        None
    };

    let result = match cli.command {
        Commands::Run => run(&cli.jobs, settings).await,
        Commands::Check => check(&cli.jobs),
        Commands::Once { ref name } => once(name, &cli.jobs, settings).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Start the scheduler daemon
async fn run(jobs: &PathBuf, settings: Settings) -> webtester::Result<()> {
    let store = ResultStore::open(&settings.paths.results_dir)?;
    let executor = Executor::new(&settings, store);
    let watcher = ConfigWatcher::new(jobs);

    let scheduler = Scheduler::bootstrap(watcher, executor, settings.scheduler.clone())?;
    scheduler.run().await
}

/// Validate the jobs file and print what was parsed
fn check(jobs: &PathBuf) -> webtester::Result<()> {
    let snapshot = ConfigWatcher::new(jobs).load()?;

    println!(
        "\n{} {}",
        "Jobs file OK:".green().bold(),
        jobs.display().to_string().white().bold()
    );
    println!("{:<20} | {:>10} | Browser", "Name", "Interval");
    println!("{:-<20}-|-{:-<10}-|-{:-<10}", "", "", "");
    for job in snapshot.jobs() {
        println!(
            "{:<20} | {:>9}s | {}",
            job.name(),
            job.interval().as_secs(),
            job.browser()
        );
    }
    println!("\n{} job(s) parsed\n", snapshot.len());
    Ok(())
}

/// Run a single job to completion outside the schedule
async fn once(name: &str, jobs: &PathBuf, settings: Settings) -> webtester::Result<()> {
    let snapshot = ConfigWatcher::new(jobs).load()?;
    let job = snapshot
        .get(name)
        .ok_or_else(|| webtester::Error::JobNotFound(name.to_string()))?;

    let store = ResultStore::open(&settings.paths.results_dir)?;
    let executor = Executor::new(&settings, store.clone());

    println!("\n{} {}", "Running:".blue().bold(), job.to_string().white().bold());
    let outcome = executor.run(job).await;

    if let Some(mean) = outcome.mean {
        println!(
            "\n{} trimmed mean {} over {} sample(s)",
            "✓".green().bold(),
            format!("{mean:.3}s").white().bold(),
            outcome.durations.len()
        );
        println!("  summary: {}", store.mean_path(name).display());
        Ok(())
    } else {
        println!("\n{} {}", "✗".red().bold(), "no usable durations".red());
        Err(webtester::Error::NoRetainedDurations(name.to_string()))
    }
}
