use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tondeal::adapters::{
    CachedPoolResolver, DexClient, DryRunSwapExecutor, PoolResolver, PostgresStore, PriceQuoter,
    SwapExecutor,
};
use tondeal::config::{AppConfig, LoggingConfig};
use tondeal::engine::{ExecutionEngine, Scheduler};
use tondeal::store::{OrderStore, ReadOnlyStore};
use tondeal::HttpPriceOracle;

/// Standing limit-order engine for TON jetton swaps
#[derive(Parser, Debug)]
#[command(name = "tondeal", version, about)]
struct Cli {
    /// Configuration directory
    #[arg(long, default_value = "config")]
    config: PathBuf,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,

    /// Evaluate orders but submit no swaps and retire nothing
    #[arg(long)]
    dry_run: bool,
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{},tondeal=debug,sqlx=warn", config.level))
    });

    if config.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_from(&cli.config).context("failed to load configuration")?;
    if cli.dry_run {
        config.dry_run.enabled = true;
    }

    init_logging(&config.logging);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("config error: {error}");
        }
        anyhow::bail!("invalid configuration");
    }

    let postgres = PostgresStore::new(&config.database.url, config.database.max_connections)
        .await
        .context("failed to connect to the order store")?;
    postgres.migrate().await?;
    let postgres = Arc::new(postgres);

    // Pool cache TTL is bounded by the cycle interval, so a stale pool can
    // only ever affect the cycle it was fetched in
    let pools: Arc<dyn PoolResolver> = Arc::new(CachedPoolResolver::new(
        postgres.as_ref().clone(),
        config.engine.cycle_interval(),
    ));

    let oracle: Arc<dyn PriceQuoter> = Arc::new(HttpPriceOracle::new(
        config.oracle.url.clone(),
        Duration::from_millis(config.oracle.timeout_ms),
    )?);

    let (store, swaps): (Arc<dyn OrderStore>, Arc<dyn SwapExecutor>) = if config.dry_run.enabled {
        info!("dry run enabled: no swaps will be submitted, no orders retired");
        (
            Arc::new(ReadOnlyStore::new(Arc::clone(&postgres))),
            Arc::new(DryRunSwapExecutor::new()),
        )
    } else {
        (
            Arc::clone(&postgres) as Arc<dyn OrderStore>,
            Arc::new(DexClient::new(
                config.chain.rpc_url.clone(),
                Duration::from_millis(config.chain.timeout_ms),
            )?),
        )
    };

    let engine = Arc::new(ExecutionEngine::new(
        store,
        pools,
        oracle,
        swaps,
        config.engine.clone(),
    ));

    if cli.once {
        let report = engine.run_cycle().await?;
        info!(%report, "single cycle complete");
        return Ok(());
    }

    let scheduler = Scheduler::new(engine, config.engine.clone());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    scheduler.run(shutdown_rx).await?;
    Ok(())
}
