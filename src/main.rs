//! Layered configuration resolver.
//!
//! # Architecture Overview
//!
//! ```text
//!   base ──▶ overlay ──▶ include 1 ──▶ … ──▶ include N      (static chain, frozen)
//!                                               │
//!                                               ▼
//!                                        ┌──────────────┐
//!   remote props ◀── fetch ◀── poll ─────│ConfigService │──▶ get / keys / props
//!        │                               └──────────────┘
//!        └──▶ DynamicSnapshot ──(atomic swap)──▲
//! ```
//!
//! Resolves the configuration, prints the merged view as JSON and, with
//! `--watch`, keeps the dynamic layer polling until Ctrl-C.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use layered_config::lifecycle::{bootstrap, signals};
use layered_config::observability::logging::{init_logging, LogFormat};
use layered_config::observability::metrics::init_metrics;
use layered_config::service::AdminSettings;
use layered_config::{LayerResolver, PropsView, Resources, SharedMetrics, SourceLoader};

/// Default directory searched for bundled resources.
const DEFAULT_RESOURCE_DIR: &str = "resources";

#[derive(Parser)]
#[command(name = "layered-config")]
#[command(about = "Resolve layered configuration and print the merged view", long_about = None)]
struct Cli {
    /// Base source: `file:<path>` or a bundled resource name.
    #[arg(short, long, default_value = "application.toml")]
    base: String,

    /// Directory searched for bundled resources, in order (repeatable).
    #[arg(short = 'r', long = "resource-dir")]
    resource_dirs: Vec<PathBuf>,

    /// Keep polling the dynamic layer until interrupted.
    #[arg(short, long)]
    watch: bool,

    /// Expose Prometheus metrics on this address.
    #[arg(long)]
    metrics_address: Option<SocketAddr>,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.log_format);

    tracing::info!("layered-config v{} starting", env!("CARGO_PKG_VERSION"));

    if let Some(addr) = cli.metrics_address {
        if let Err(e) = init_metrics(addr) {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter");
        }
    }

    let dirs = if cli.resource_dirs.is_empty() {
        vec![PathBuf::from(DEFAULT_RESOURCE_DIR)]
    } else {
        cli.resource_dirs
    };
    let resources = dirs
        .iter()
        .fold(Resources::new(), |resources, dir| resources.with_dir(dir));

    let resolver = LayerResolver::new(SourceLoader::new(resources));
    let service = bootstrap(&resolver, &cli.base, SharedMetrics::default()).await?;

    match AdminSettings::from_layer(service.static_chain()) {
        Ok(admin) => tracing::info!(
            port = admin.port,
            backlog = admin.backlog,
            shutdown_delay = ?admin.shutdown_delay,
            ui_location = %admin.ui_location,
            "Admin settings"
        ),
        Err(e) => tracing::debug!(error = %e, "No admin settings"),
    }

    println!("{}", PropsView::capture(&service).to_json_pretty()?);

    if cli.watch && service.is_polling() {
        tracing::info!("Watching dynamic configuration, press Ctrl-C to stop");
        signals::wait_for_shutdown_signal().await;
        if let Some(snapshot) = service.snapshot() {
            tracing::info!(sequence = snapshot.sequence(), "Last dynamic snapshot");
        }
    }

    service.shutdown().await;
    tracing::info!("Shutdown complete");
    Ok(())
}
