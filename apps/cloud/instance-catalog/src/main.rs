//! Instance Catalog
//!
//! Builds the schedulable instance type catalog for one region from a SKU
//! dump and the retail price feed. Can run once or keep prices fresh in the
//! background.

use clap::{Parser, Subcommand};
use core_config::FromEnv;
use core_config::tracing::{init_tracing, install_color_eyre};
use eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

mod config;
mod service;
mod sources;

use config::Config;
use service::{CatalogService, InstanceTypeSummary, load_kubelet_config};
use sources::JsonFileSkuSource;

#[derive(Parser)]
#[command(name = "instance-catalog")]
#[command(about = "Build the VM instance type catalog for a region")]
struct Cli {
    /// JSON file holding the raw SKU list
    #[arg(short, long, global = true, default_value = "skus.json")]
    skus: PathBuf,

    /// JSON file with kubelet settings (maxPods, kubeReserved, evictionHard, ...)
    #[arg(short, long, global = true)]
    kubelet_config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every purchasable instance type
    List {
        /// Print full instance types as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Print on-demand prices
    Prices {
        /// Instance types to show. Defaults to all.
        #[arg(short, long, value_delimiter = ',')]
        instance_types: Option<Vec<String>>,
    },

    /// Keep prices fresh and rebuild the catalog periodically
    Watch {
        /// Seconds between catalog rebuilds
        #[arg(short, long, default_value_t = 300)]
        interval: u64,
    },

    /// Show catalog and pricing status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    // Initialize metrics
    observability::init_metrics()?;

    let cli = Cli::parse();
    let kubelet = load_kubelet_config(cli.kubelet_config.as_deref())?;
    let source = Arc::new(JsonFileSkuSource::new(cli.skus));
    let service = CatalogService::new(&config, source).await;

    match cli.command {
        Commands::List { json } => {
            let instance_types = service.list(&kubelet).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&instance_types)?);
            } else {
                let summaries: Vec<InstanceTypeSummary> =
                    instance_types.iter().map(InstanceTypeSummary::from).collect();
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            }
            info!(count = instance_types.len(), "Listed instance types");
        }

        Commands::Prices { instance_types } => {
            let pricing = service.pricing();
            let names = match instance_types {
                Some(names) => names,
                None => pricing.instance_types().await,
            };
            let mut prices = serde_json::Map::new();
            for name in names {
                let price = pricing.on_demand_price(&name).await;
                prices.insert(name, serde_json::json!(price));
            }
            println!("{}", serde_json::to_string_pretty(&prices)?);
        }

        Commands::Watch { interval } => {
            run_watch(service, kubelet, Duration::from_secs(interval.max(1))).await?;
        }

        Commands::Status => {
            let status = service.status(Some(&kubelet)).await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}

async fn run_watch(
    service: CatalogService,
    kubelet: domain_instancetype::KubeletConfiguration,
    interval: Duration,
) -> Result<()> {
    let cancel = CancellationToken::new();
    // A single process is always the active one
    let (_elected_tx, elected) = watch::channel(true);
    let refresher = tokio::spawn(service.pricing().clone().run(elected, cancel.clone()));

    info!(interval_secs = interval.as_secs(), "Watching instance catalog");
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
            _ = ticker.tick() => {
                match service.list(&kubelet).await {
                    Ok(instance_types) => info!(count = instance_types.len(), "Rebuilt instance catalog"),
                    Err(e) => error!(error = %e, "Failed to rebuild instance catalog"),
                }
            }
        }
    }

    cancel.cancel();
    refresher.await?;
    print!("{}", observability::render_metrics());
    Ok(())
}
