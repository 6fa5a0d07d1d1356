//! Driftnet main entry point
//!
//! This is the command-line interface for the Driftnet distributed crawl
//! coordinator. Any number of processes started with the same store
//! endpoint cooperate on one crawl.

use clap::Parser;
use driftnet::config::{load_config, Config, ScopeKind};
use driftnet::crawler::crawl;
use driftnet::output::{
    load_artifact_backlog, load_statistics, print_artifacts, print_statistics,
};
use driftnet::store::{FrontierStore, RedisStore};
use driftnet::url::parse_candidate;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Driftnet: a distributed crawl-frontier coordinator
///
/// Driftnet crawls outward from seed URLs through a shared frontier,
/// fetching each URL at most once across all participating workers and
/// collecting contact addresses as it goes.
#[derive(Parser, Debug)]
#[command(name = "driftnet")]
#[command(version = "1.0.0")]
#[command(about = "A distributed crawl-frontier coordinator", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Starting URL added to the frontier before crawling
    #[arg(long)]
    url: Option<String>,

    /// Seed file: JSON array of {name, links} objects, or one URL per line
    #[arg(long, value_name = "FILE")]
    seed_file: Option<PathBuf>,

    /// Number of dispatcher loops to run in this process
    #[arg(long)]
    dispatchers: Option<u32>,

    /// Concurrent fetches per dispatcher
    #[arg(long)]
    workers: Option<u32>,

    /// Only enqueue links whose host falls under this domain suffix
    #[arg(long)]
    domain: Option<String>,

    /// Only enqueue links up to this depth from the seeds
    #[arg(long)]
    max_depth: Option<u32>,

    /// Shared store URL (default redis://127.0.0.1:6379)
    #[arg(long, value_name = "URL")]
    store_url: Option<String>,

    /// Wall-clock budget in seconds, after which dispatchers exit
    #[arg(long)]
    time_budget: Option<u64>,

    /// Ingest seeds and exit without dispatching any fetches
    #[arg(long, conflicts_with_all = ["stats", "artifacts", "shutdown"])]
    seed_only: bool,

    /// Show store statistics and exit
    #[arg(long, conflicts_with_all = ["seed_only", "artifacts", "shutdown"])]
    stats: bool,

    /// Print the unhandled artifact backlog and exit
    #[arg(long, conflicts_with_all = ["seed_only", "stats", "shutdown"])]
    artifacts: bool,

    /// Broadcast a shutdown signal and exit
    #[arg(long, conflicts_with_all = ["seed_only", "stats", "artifacts"])]
    shutdown: bool,

    /// Worker identity targeted by --shutdown (default: all workers)
    #[arg(long, requires = "shutdown", value_name = "WORKER")]
    target: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    // Load configuration (defaults when no file is given), then apply
    // command-line overrides.
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)?
        }
        None => Config::default(),
    };
    apply_overrides(&mut config, &cli);

    let store: Arc<dyn FrontierStore> = Arc::new(RedisStore::connect(&config.store).await?);

    if cli.stats {
        handle_stats(store.as_ref()).await?;
    } else if cli.artifacts {
        handle_artifacts(store.as_ref()).await?;
    } else if cli.shutdown {
        handle_shutdown(store.as_ref(), cli.target.as_deref()).await?;
    } else {
        handle_seed(store.as_ref(), &config, &cli).await?;
        if !cli.seed_only {
            handle_crawl(store, &config).await?;
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("driftnet=info,warn"),
            1 => EnvFilter::new("driftnet=debug,info"),
            2 => EnvFilter::new("driftnet=trace,debug"),
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

/// Applies command-line overrides onto the loaded configuration
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(url) = &cli.store_url {
        config.store.url = url.clone();
    }
    if let Some(dispatchers) = cli.dispatchers {
        config.dispatcher.dispatchers = dispatchers;
    }
    if let Some(workers) = cli.workers {
        config.dispatcher.workers = workers;
    }
    if let Some(budget) = cli.time_budget {
        config.dispatcher.time_budget_secs = Some(budget);
    }
    if let Some(file) = &cli.seed_file {
        config.seeds.file = Some(file.display().to_string());
    }

    // Scope flags select the matching policy; --domain wins over
    // --max-depth when both are given.
    if let Some(domain) = &cli.domain {
        config.scope.policy = ScopeKind::DomainSuffix;
        config.scope.domain = Some(domain.clone());
    } else if let Some(max_depth) = cli.max_depth {
        config.scope.policy = ScopeKind::Depth;
        config.scope.max_depth = Some(max_depth);
    }
}

/// Ingests seeds from --url and the configured seed file
async fn handle_seed(
    store: &dyn FrontierStore,
    config: &Config,
    cli: &Cli,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(raw) = &cli.url {
        // An explicit starting URL must be valid; reject the run otherwise.
        let url = parse_candidate(raw)
            .map_err(|e| format!("invalid starting URL '{}': {}", raw, e))?;
        let report = driftnet::seed::ingest(store, &[url.to_string()]).await?;
        tracing::info!(url = %url, inserted = report.inserted, "Starting URL ingested");
    }

    if let Some(path) = &config.seeds.file {
        let report = driftnet::seed::ingest_file(store, std::path::Path::new(path)).await?;
        if report.candidates == 0 {
            return Err(format!("seed file '{}' contained no valid URLs", path).into());
        }
        tracing::info!(
            file = %path,
            inserted = report.inserted,
            skipped = report.skipped,
            invalid = report.invalid,
            "Seed file ingested"
        );
    }

    Ok(())
}

/// Handles the --stats mode: shows statistics from the store
async fn handle_stats(store: &dyn FrontierStore) -> Result<(), Box<dyn std::error::Error>> {
    let stats = load_statistics(store).await?;
    print_statistics(&stats);
    Ok(())
}

/// Handles the --artifacts mode: prints the unhandled artifact backlog
async fn handle_artifacts(store: &dyn FrontierStore) -> Result<(), Box<dyn std::error::Error>> {
    let backlog = load_artifact_backlog(store).await?;
    print_artifacts(&backlog);
    Ok(())
}

/// Handles the --shutdown mode: broadcasts the shutdown signal
async fn handle_shutdown(
    store: &dyn FrontierStore,
    target: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    store.request_shutdown(target).await?;
    match target {
        Some(worker) => println!("Shutdown requested for worker '{}'", worker),
        None => println!("Global shutdown requested"),
    }
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    store: Arc<dyn FrontierStore>,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        dispatchers = config.dispatcher.dispatchers,
        workers = config.dispatcher.workers,
        "Starting crawl"
    );

    match crawl(store, config).await {
        Ok(()) => {
            tracing::info!("Crawl finished");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
