//! Portfolio Sync - configuration synchronization for the InkMaster site.
//!
//! This library resolves the site's configuration document through a
//! layered fallback chain, projects it onto in-memory page trees, and
//! keeps those trees reconciled against external mutation.

pub mod cli;
pub mod config;
pub mod dom;
pub mod error;
pub mod metrics;
pub mod projector;
pub mod reconcile;
pub mod remote;
pub mod validation;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::sync::{mpsc, RwLock};
use tracing::{error, info, warn};

use crate::cli::{Cli, Commands, ProjectArgs, RunArgs};
use crate::config::hot_reload::{ConfigReloadEvent, ConfigWatcher};
use crate::config::{
    BackupCache, BackupStore, ConfigDocument, ConfigLoader, MemoryStore, PageLocation, RedisStore,
};
use crate::dom::PageTree;
use crate::metrics::{Metrics, MetricsServer};
use crate::projector::{FieldProjector, LinkProjector, Projector, ThemeProjector};
use crate::reconcile::ReconcileLoop;
use crate::remote::{HttpRemote, RemoteClient};
use crate::validation::{format_report, validate_document};

/// Runs the engine with the provided CLI arguments.
pub async fn run(cli: Cli) -> Result<()> {
    setup_logging(cli.log_level())?;

    match cli.command {
        Commands::Run(ref args) => run_engine(args, &cli).await,
        Commands::Project(ref args) => project_once(args, &cli).await,
        Commands::ConfigValidate { ref file } => validate_config(file.as_deref(), &cli).await,
        Commands::ConfigShow => show_config(&cli).await,
        Commands::ConfigPush { ref file } => push_config(file, &cli).await,
        Commands::Upload { kind, ref file } => upload(kind, file, &cli).await,
        Commands::Health => health(&cli).await,
    }
}

/// Initializes the tracing subscriber for structured logging.
fn setup_logging(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .json()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    Ok(())
}

fn page_location(nested: bool) -> PageLocation {
    if nested {
        PageLocation::Nested
    } else {
        PageLocation::Root
    }
}

fn projectors(location: PageLocation) -> Vec<Box<dyn Projector>> {
    vec![
        Box::new(FieldProjector::new(location)),
        Box::new(ThemeProjector),
        Box::new(LinkProjector),
    ]
}

async fn load_tree(path: &Path) -> Result<PageTree> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read page tree from '{}'", path.display()))?;
    PageTree::from_json(&json)
        .with_context(|| format!("'{}' is not a valid page tree", path.display()))
}

/// Runs the reconciliation loop until interrupted.
async fn run_engine(args: &RunArgs, cli: &Cli) -> Result<()> {
    info!("Starting portfolio sync engine");

    match &cli.redis_url {
        Some(url) => {
            let store = RedisStore::connect(url).await?;
            info!("Connected to Redis backup store");
            run_engine_with_store(args, cli, store).await
        }
        None => {
            info!("No Redis URL configured, keeping backup snapshots in memory");
            run_engine_with_store(args, cli, MemoryStore::new()).await
        }
    }
}

async fn run_engine_with_store<S: BackupStore + 'static>(
    args: &RunArgs,
    cli: &Cli,
    store: S,
) -> Result<()> {
    let tree = Arc::new(RwLock::new(load_tree(&args.tree).await?));
    info!(tree = %args.tree.display(), "Page tree loaded");

    let metrics = Arc::new(Metrics::new()?);
    if !args.disable_metrics {
        let metrics_server = MetricsServer::new(metrics.clone(), args.metrics_port);
        tokio::spawn(async move {
            if let Err(e) = metrics_server.start().await {
                error!(error = %e, "Prometheus server failed");
            }
        });
        info!(port = args.metrics_port, "Prometheus metrics server started");
    }

    let loader = ConfigLoader::new(HttpRemote::new(&cli.config_url), BackupCache::new(store));
    let looper = ReconcileLoop::new(
        loader,
        projectors(page_location(args.nested)),
        Arc::clone(&tree),
        metrics,
        Duration::from_millis(args.retry_interval_ms),
        args.max_attempts,
    );
    let (handle, join) = looper.spawn();
    info!("Reconciliation loop started");

    // Local config edits are published to the server and then re-applied,
    // so the loop always projects what the server serves.
    let (reload_tx, mut reload_rx) = mpsc::channel(10);
    let watched_config: Arc<RwLock<ConfigDocument>> =
        Arc::new(RwLock::new(ConfigDocument::default_document()));
    if let Some(config_path) = &args.watch_config {
        let watcher = ConfigWatcher::new(Arc::clone(&watched_config), config_path, reload_tx);
        watcher.start().await?;
        info!(path = %config_path.display(), "Config hot-reload enabled");
    }

    let client = RemoteClient::new(&cli.config_url);

    info!("Portfolio sync engine is running. Press Ctrl+C to stop.");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }

            Some(event) = reload_rx.recv() => {
                match event {
                    ConfigReloadEvent::Reloaded => {
                        let document = watched_config.read().await.clone();
                        match client.save_config(&document).await {
                            Ok(message) => info!(message, "Local edit published"),
                            Err(e) => warn!(error = %e, "Failed to publish local edit"),
                        }
                        handle.reapply().await;
                    }
                    ConfigReloadEvent::ReloadFailed { error_count } => {
                        warn!(error_count, "Local config edit failed validation");
                    }
                }
            }
        }
    }

    info!("Shutting down portfolio sync engine");
    handle.stop();
    let _ = join.await;

    Ok(())
}

/// Loads the document once, projects it, and writes the resulting tree.
async fn project_once(args: &ProjectArgs, cli: &Cli) -> Result<()> {
    let mut tree = load_tree(&args.tree).await?;

    let loader = ConfigLoader::new(
        HttpRemote::new(&cli.config_url),
        BackupCache::new(MemoryStore::new()),
    );
    let loaded = loader.load().await;
    info!(tier = %loaded.tier, "Configuration resolved");

    let mut total = projector::ProjectionReport::default();
    for projector in projectors(page_location(args.nested)) {
        let report = projector.project(&loaded.document, &mut tree);
        info!(
            projector = projector.name(),
            writes = report.writes,
            misses = report.misses,
            skips = report.skips,
            "Projection pass complete"
        );
        total.absorb(report);
    }

    let json = tree.to_json()?;
    match &args.out {
        Some(out) => {
            tokio::fs::write(out, json.as_bytes())
                .await
                .with_context(|| format!("failed to write '{}'", out.display()))?;
            info!(out = %out.display(), writes = total.writes, "Projected tree written");
        }
        None => println!("{}", json),
    }

    Ok(())
}

/// Validates a local or published document and reports any issues.
async fn validate_config(file: Option<&Path>, cli: &Cli) -> Result<()> {
    let raw = match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read '{}'", path.display()))?,
        None => {
            let url = format!("{}/config.json", cli.config_url.trim_end_matches('/'));
            reqwest::get(&url)
                .await
                .with_context(|| format!("failed to fetch '{}'", url))?
                .text()
                .await?
        }
    };

    let value: serde_json::Value =
        serde_json::from_str(&raw).context("document is not valid JSON")?;

    let result = validate_document(&value);
    print!("{}", format_report(&result));

    if !result.is_valid() {
        bail!("document failed validation with {} error(s)", result.error_count());
    }

    Ok(())
}

/// Displays the configuration the loader currently resolves.
async fn show_config(cli: &Cli) -> Result<()> {
    let loader = ConfigLoader::new(
        HttpRemote::new(&cli.config_url),
        BackupCache::new(MemoryStore::new()),
    );
    let loaded = loader.load().await;

    println!("# resolved from tier: {}", loaded.tier);
    println!("{}", serde_json::to_string_pretty(&loaded.document)?);

    Ok(())
}

/// Publishes a local document to the server.
async fn push_config(file: &Path, cli: &Cli) -> Result<()> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read '{}'", file.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).context("document is not valid JSON")?;

    let result = validate_document(&value);
    if !result.is_valid() {
        print!("{}", format_report(&result));
        bail!("refusing to publish an invalid document");
    }

    let document: ConfigDocument = serde_json::from_value(value)?;
    let client = RemoteClient::new(&cli.config_url);
    let message = client.save_config(&document).await?;

    println!("{}", message);
    Ok(())
}

/// Uploads an image to one of the server's slots.
async fn upload(kind: remote::ImageKind, file: &Path, cli: &Cli) -> Result<()> {
    let client = RemoteClient::new(&cli.config_url);
    let data = remote::upload::upload_image(&client, kind, file).await?;

    println!("Uploaded {} -> {}", data.original_name, data.relative_path);
    Ok(())
}

/// Checks the configuration server's health.
async fn health(cli: &Cli) -> Result<()> {
    let client = RemoteClient::new(&cli.config_url);
    let status = client.health().await?;

    println!(
        "{}: {} ({})",
        if status.success { "ok" } else { "degraded" },
        status.message,
        status.timestamp
    );
    for (folder, exists) in &status.folders {
        println!("  {} {}", if *exists { "✓" } else { "✗" }, folder);
    }

    if !status.success {
        bail!("configuration server reported a degraded state");
    }

    Ok(())
}
