//! CLI entry point for the allocsync tracker.

use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

use allocsync_tracker::audit::AuditLog;
use allocsync_tracker::broker;
use allocsync_tracker::clock::SystemClock;
use allocsync_tracker::config::Config;
use allocsync_tracker::error::Error;
use allocsync_tracker::execution;
use allocsync_tracker::feed::{self, HttpFeed};
use allocsync_tracker::notify;
use allocsync_tracker::scheduler::{Collaborators, Scheduler, Settings};
use allocsync_tracker::store::{BaselineStore, JsonFileStore};

#[derive(Parser)]
#[command(name = "allocsync")]
#[command(about = "Follow a portfolio allocation feed with a brokerage account")]
#[command(version)]
struct Cli {
    /// Path to the TOML config
    #[arg(long, default_value = "allocsync.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Poll the feed and rebalance until interrupted
    Run {
        /// Log orders instead of sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// Run a single cycle and print its outcome
    Once {
        /// Log orders instead of sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// Classify the changes between two feed documents (offline)
    Diff { old: PathBuf, new: PathBuf },

    /// Show broker positions with live prices
    Positions,

    /// Check feed, gateway and trading-hours state
    Status,

    /// Print the committed baseline
    Baseline,

    /// Delete the committed baseline so the next cycle bootstraps
    ResetBaseline {
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    // diff works without a config
    if let Command::Diff { old, new } = &cli.command {
        exit_on_error(show_diff(old, new));
        return;
    }

    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Run { dry_run } => run(&config, dry_run, false),
        Command::Once { dry_run } => run(&config, dry_run, true),
        Command::Diff { .. } => Ok(()),
        Command::Positions => show_positions(&config),
        Command::Status => check_status(&config),
        Command::Baseline => show_baseline(&config),
        Command::ResetBaseline { force } => reset_baseline(&config, force),
    };

    exit_on_error(result);
}

fn exit_on_error(result: anyhow::Result<()>) {
    let Err(e) = result else { return };
    match e.downcast_ref::<Error>() {
        Some(Error::Aborted(msg)) => {
            eprintln!("{msg}");
            process::exit(0);
        }
        _ => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}

fn run(config: &Config, dry_run: bool, once: bool) -> anyhow::Result<()> {
    let broker = broker::open(config, dry_run).context("connecting to the gateway")?;
    let feed = HttpFeed::new(
        &config.feed.url,
        Duration::from_secs(config.feed.timeout_secs),
    )?;
    let store = JsonFileStore::new(config.baseline_path());
    let notifier = notify::from_config(&config.notify)?;
    let mut audit = AuditLog::open(&config.audit_path())
        .with_context(|| format!("opening audit log {}", config.audit_path().display()))?;
    let settings = Settings::from_config(config)?;

    let deps = Collaborators {
        feed: &feed,
        broker: broker.as_ref(),
        store: &store,
        notifier: notifier.as_ref(),
        clock: &SystemClock,
    };
    let mut scheduler = Scheduler::new(deps, &mut audit, settings);

    if once {
        let report = scheduler.run_once();
        if let Some(exits) = &report.exits {
            print!("{}", exits.report);
        }
        println!("{} ({})", report.outcome, report.phase);
        println!("Next poll in {}s", report.sleep.as_secs());
        if dry_run {
            println!("\n[DRY RUN] No orders sent.");
        }
        return Ok(());
    }

    scheduler.run(None);
    Ok(())
}

fn show_positions(config: &Config) -> anyhow::Result<()> {
    let broker = broker::connect_gateway(config)?;
    execution::show_positions(config, &broker)?;
    Ok(())
}

fn check_status(config: &Config) -> anyhow::Result<()> {
    let broker = broker::connect_gateway(config)?;
    execution::check_status(config, &broker)?;
    Ok(())
}

fn show_diff(old: &Path, new: &Path) -> anyhow::Result<()> {
    let old = feed::load_document(old)?;
    let new = feed::load_document(new)?;
    let entries = allocsync::diff(Some(&old), &new).classify();

    if entries.is_empty() {
        println!("No material changes.");
        return Ok(());
    }
    println!("CHANGES (ratio denominator {}):", new.market_ratio());
    for entry in &entries {
        println!("  {entry}");
    }
    Ok(())
}

fn show_baseline(config: &Config) -> anyhow::Result<()> {
    let store = JsonFileStore::new(config.baseline_path());
    let Some(baseline) = store.load() else {
        println!("No baseline at {}", store.path().display());
        return Ok(());
    };

    let ratio = baseline.market_ratio();
    println!(
        "Baseline {} ({} records, market ratio {ratio}):",
        store.path().display(),
        baseline.records.len()
    );
    for rec in &baseline.records {
        println!(
            "  {:10} {:20} {:>7.2}%",
            rec.symbol().as_str(),
            rec.stock_name,
            rec.total_ratio / ratio * 100.0,
        );
    }
    Ok(())
}

fn reset_baseline(config: &Config, force: bool) -> anyhow::Result<()> {
    let store = JsonFileStore::new(config.baseline_path());
    if !force {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!(
                "Delete {}? The next cycle will bootstrap without trading.",
                store.path().display()
            ))
            .default(false)
            .interact()
            .map_err(|e| Error::Aborted(format!("confirmation prompt failed: {e}")))?;
        if !confirmed {
            return Err(Error::Aborted("Aborted.".into()).into());
        }
    }
    store.clear()?;
    println!("Baseline cleared.");
    Ok(())
}
