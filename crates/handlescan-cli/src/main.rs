//! handlescan - check where a username is registered.
//!
//! Probes every platform in the catalog for one username and prints a
//! found / not found / uncertain verdict per platform, with a preview of
//! each profile that was found.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use handlescan_catalog::{CatalogLoader, PlatformCatalog, PlatformCategory};
use handlescan_core::{AppConfig, PlatformId};
use handlescan_scanner::{
    FetcherConfig, HttpFetcher, PlatformFilter, ProbeOrchestrator, ProbeSettings,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod output;

/// Command-line arguments for handlescan
#[derive(Parser, Debug)]
#[command(name = "handlescan")]
#[command(about = "Check which platforms have a profile for a username")]
#[command(version)]
struct Args {
    /// Username to look up (a leading @ is ignored)
    #[arg(required_unless_present = "list")]
    username: Option<String>,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, env = "HANDLESCAN_CONFIG")]
    config: Option<PathBuf>,

    /// Platform catalog TOML file to use instead of the built-in one
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Maximum requests in flight
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Stop the whole run after this many seconds
    #[arg(long)]
    deadline: Option<u64>,

    /// Retries after a timeout or connection failure
    #[arg(long)]
    retries: Option<u32>,

    /// Only probe these platform ids (comma separated)
    #[arg(long, value_delimiter = ',', conflicts_with = "category")]
    only: Vec<String>,

    /// Only probe platforms in this category
    #[arg(long)]
    category: Option<PlatformCategory>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// List the catalog and exit
    #[arg(long)]
    list: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Initialize tracing subscriber for logging
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let mut config = AppConfig::load_existing(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            config.apply_env_overrides(|key| std::env::var(key).ok());
            config
        }
        None => AppConfig::load_with_env().context("Failed to load config")?,
    };

    if let Some(concurrency) = args.concurrency {
        config.probe.concurrency = concurrency;
    }
    if let Some(timeout) = args.timeout {
        config.probe.timeout_secs = timeout;
    }
    if let Some(deadline) = args.deadline {
        config.probe.run_deadline_secs = Some(deadline);
    }
    if let Some(retries) = args.retries {
        config.probe.max_retries = retries;
    }
    if let Some(catalog) = &args.catalog {
        config.catalog.path = Some(catalog.clone());
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn load_catalog(config: &AppConfig) -> Result<PlatformCatalog> {
    match &config.catalog.path {
        Some(path) => {
            info!("Loading platform catalog from {}", path.display());
            CatalogLoader::new(path)
                .and_then(|loader| loader.load())
                .with_context(|| format!("Failed to load catalog {}", path.display()))
        }
        None => PlatformCatalog::builtin().context("Built-in catalog is invalid"),
    }
}

fn build_filter(args: &Args, catalog: &PlatformCatalog) -> Result<PlatformFilter> {
    if let Some(category) = args.category {
        return Ok(PlatformFilter::Category(category));
    }
    if args.only.is_empty() {
        return Ok(PlatformFilter::All);
    }

    let mut ids = Vec::with_capacity(args.only.len());
    for raw in &args.only {
        let id = PlatformId::new(raw.trim())
            .with_context(|| format!("Invalid platform id {raw:?}"))?;
        if !catalog.contains(&id) {
            bail!("Unknown platform {id}; run with --list to see available platforms");
        }
        ids.push(id);
    }
    Ok(PlatformFilter::Specific(ids))
}

/// Cancel the run on Ctrl+C; finished platforms are still reported.
fn cancel_on_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Interrupted, reporting partial results");
                cancel.cancel();
            }
            Err(e) => warn!("Failed to install Ctrl+C handler: {}", e),
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = load_config(&args)?;
    let catalog = load_catalog(&config)?;

    if args.list {
        print!("{}", output::render_catalog(&catalog));
        return Ok(());
    }

    let Some(username) = args.username.as_deref() else {
        bail!("A username is required");
    };

    let filter = build_filter(&args, &catalog)?;
    let fetcher = Arc::new(
        HttpFetcher::new(FetcherConfig::from(&config.http))
            .context("Failed to initialize HTTP client")?,
    );
    let orchestrator = ProbeOrchestrator::new(fetcher, ProbeSettings::from(&config.probe))?
        .with_filter(filter);

    info!(
        "Starting handlescan v{} with {} platforms",
        env!("CARGO_PKG_VERSION"),
        catalog.len()
    );

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let report = orchestrator.run(username, &catalog, cancel).await?;

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{json}");
    } else {
        print!("{}", output::render_report(&report));
    }

    Ok(())
}
