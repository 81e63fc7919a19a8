//! Style-Census main entry point
//!
//! This is the command-line interface for the Style-Census crawler.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use style_census::aggregate::{CensusReport, SlugOrdering};
use style_census::config::{load_config_with_hash, Config};
use style_census::crawler::{crawl, CrawlStatus};
use style_census::output::{compute_statistics, export_report, print_statistics};
use style_census::state::CrawlState;
use style_census::storage::{load_existing, open_store, StateStore};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Style-Census: a resumable wiki style crawler
///
/// Style-Census pages through the wiki content API, extracts the styling
/// metadata of every page (module CSS, inline styles, includes and classes)
/// and ranks how often each value is used.
#[derive(Parser, Debug)]
#[command(name = "style-census")]
#[command(version)]
#[command(about = "A resumable wiki style crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Start a fresh crawl, discarding the stored state
    #[arg(long)]
    fresh: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "export_report", "merge"])]
    dry_run: bool,

    /// Show statistics from the stored state and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_report", "merge"])]
    stats: bool,

    /// Write the JSON report from the stored state and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "merge"])]
    export_report: bool,

    /// Merge snapshot files into the stored state and exit
    #[arg(long, value_name = "SNAPSHOT", num_args = 1.., conflicts_with = "fresh")]
    merge: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.export_report {
        handle_export_report(&config)?;
    } else if !cli.merge.is_empty() {
        handle_merge(&config, &cli.merge)?;
    } else {
        return handle_crawl(&config, cli.fresh).await;
    }

    Ok(ExitCode::SUCCESS)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("style_census=info,warn"),
            1 => EnvFilter::new("style_census=debug,info"),
            2 => EnvFilter::new("style_census=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Style-Census Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Checkpoint every: {} pages", config.crawler.checkpoint_every);
    println!("  Max attempts: {}", config.crawler.max_attempts);
    println!("  Retry delay: {}ms", config.crawler.retry_delay_ms);
    println!("  Page size: {}", config.crawler.page_size);

    println!("\nAPI:");
    println!("  Endpoint: {}", config.api.endpoint);
    println!("  Timeout: {}s", config.api.timeout_secs);
    if let Some(user_agent) = &config.api.user_agent {
        println!("  User agent: {}", user_agent);
    }

    println!("\nOutput:");
    println!("  State: {}", config.output.state_path);
    println!("  Report: {}", config.output.report_path);

    println!("\nSites ({}):", config.sites.len());
    for url in config.base_urls() {
        println!("  - {}", url);
    }
    println!("  Default include site: {}", config.default_site());

    println!("\n✓ Configuration is valid");
}

/// Loads the state stored at `path`, failing if there is none
fn load_state_from(path: &Path) -> anyhow::Result<CrawlState> {
    match load_existing(path)? {
        Some(state) => Ok(state),
        None => bail!("no stored state at {}", path.display()),
    }
}

fn load_stored_state(config: &Config) -> anyhow::Result<CrawlState> {
    load_state_from(Path::new(&config.output.state_path))
}

fn build_report(config: &Config, state: &CrawlState) -> CensusReport {
    CensusReport::build(
        state,
        config.default_site(),
        &SlugOrdering::from_config(&config.ordering),
    )
}

/// Handles the --stats mode: shows statistics from the stored state
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("State: {}\n", config.output.state_path);

    let state = load_stored_state(config)?;
    let report = build_report(config, &state);
    print_statistics(&compute_statistics(&state, &report));

    Ok(())
}

/// Handles the --export-report mode: writes the JSON report
fn handle_export_report(config: &Config) -> anyhow::Result<()> {
    println!("=== Exporting Report ===\n");
    println!("State: {}", config.output.state_path);
    println!("Output: {}", config.output.report_path);
    println!();

    let state = load_stored_state(config)?;
    let report = build_report(config, &state);
    export_report(&report, Path::new(&config.output.report_path))?;

    println!("✓ Report exported to: {}", config.output.report_path);

    Ok(())
}

/// Handles the --merge mode: folds snapshot files into the stored state
fn handle_merge(config: &Config, paths: &[PathBuf]) -> anyhow::Result<()> {
    let snapshots = paths
        .iter()
        .map(|path| {
            load_state_from(path).with_context(|| format!("cannot merge {}", path.display()))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let mut store = open_store(Path::new(&config.output.state_path))?;
    let mut state = store.load()?.unwrap_or_default();

    for (path, snapshot) in paths.iter().zip(snapshots) {
        tracing::info!("Merging {} pages from {}", snapshot.len(), path.display());
        state.absorb(snapshot);
    }

    store.save(&state)?;
    println!(
        "✓ Merged {} snapshots, {} pages stored in {}",
        paths.len(),
        state.len(),
        store.describe()
    );

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, fresh: bool) -> anyhow::Result<ExitCode> {
    if fresh {
        tracing::info!("Starting fresh crawl (ignoring previous state)");
    } else {
        tracing::info!("Starting crawl (will resume from stored state if present)");
    }
    tracing::info!("Sites: {}", config.sites.join(", "));

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current step");
            on_signal.cancel();
        }
    });

    let (state, outcome) = match crawl(config, fresh, cancel).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    tracing::info!(
        "Crawl finished: {} batches, {} pages merged, {} checkpoints, {} pages stored",
        outcome.batches,
        outcome.pages_merged,
        outcome.checkpoints,
        state.len()
    );

    match outcome.status {
        CrawlStatus::Done => {
            let report = build_report(config, &state);
            export_report(&report, Path::new(&config.output.report_path))?;
            Ok(ExitCode::SUCCESS)
        }
        CrawlStatus::Cancelled => {
            tracing::warn!("Crawl cancelled; rerun to resume from the last checkpoint");
            Ok(ExitCode::from(130))
        }
    }
}
