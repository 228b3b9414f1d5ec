use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use snmp_telemetry::{
    actors::{PollCycle, PollerHandle},
    api::{ApiConfig, ApiState, spawn_api_server},
    config::{Config, StorageConfig, read_config_file},
    snmp::UdpSessionClient,
    storage::{MemoryBackend, TelemetryStore},
};
use tokio::sync::broadcast;
use tracing::{debug, error, info, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file
    #[arg(short)]
    file: String,
}

fn init() {
    let filter = filter::Targets::new().with_targets(vec![
        ("snmp_telemetry", LevelFilter::DEBUG),
        ("telemetry_hub", LevelFilter::TRACE),
        ("tower_http", LevelFilter::DEBUG),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

async fn open_store(config: &StorageConfig) -> anyhow::Result<Arc<dyn TelemetryStore>> {
    match config {
        StorageConfig::None => {
            info!("using in-memory storage, samples are lost on exit");
            Ok(Arc::new(MemoryBackend::new()))
        }
        #[cfg(feature = "storage-sqlite")]
        StorageConfig::Sqlite { path } => {
            let backend = snmp_telemetry::storage::sqlite::SqliteBackend::new(path)
                .await
                .context("failed to open SQLite storage")?;
            Ok(Arc::new(backend))
        }
        #[cfg(not(feature = "storage-sqlite"))]
        StorageConfig::Sqlite { .. } => {
            anyhow::bail!("SQLite storage configured but the storage-sqlite feature is disabled")
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config: Config = read_config_file(&args.file)?;
    let catalog = config.catalog()?;

    let store = open_store(&config.storage).await?;

    // Every run starts from an empty store
    let cleared = store
        .clear_all()
        .await
        .context("failed to clear telemetry store")?;
    info!("cleared {cleared} samples");

    let client = Arc::new(UdpSessionClient::new(config.polling.community.clone()));
    let cycle = PollCycle::new(
        client,
        Arc::clone(&store),
        config.targets.clone(),
        catalog,
        config.polling.timeout(),
        config.polling.max_concurrency,
    );

    let (report_tx, _) = broadcast::channel(16);
    let poller = PollerHandle::spawn(cycle, config.polling.interval(), report_tx);
    info!(
        "polling {} targets every {:?}",
        config.targets.len(),
        config.polling.interval()
    );

    let api_config = ApiConfig {
        bind_addr: config.api.bind,
        enable_cors: true,
    };
    let state = ApiState::new(Arc::clone(&store)).with_poller(poller.clone());
    let addr = spawn_api_server(api_config, state).await?;
    info!("serving telemetry on http://{addr}/telemetry");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutdown requested");

    if let Err(e) = poller.shutdown().await {
        warn!("poller did not shut down cleanly: {e:#}");
    }
    match store.count().await {
        Ok(count) => debug!("{count} samples in store at exit"),
        Err(e) => error!("failed to count samples: {e}"),
    }
    store.close().await?;

    Ok(())
}

