//! LP Position Engine
//!
//! Polls the configured feeds, merges them into the working set every
//! interval and publishes the result to the state file.
//!
//! Supports hot-reloading via SIGHUP signal:
//!   kill -HUP $(pgrep lp-engine)
//!
//! Usage:
//!   lp-engine --config config/lp_engine.toml
//!   lp-engine --config config/lp_engine.toml --once

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use lp_engine::feeds::feed_from_location;
use lp_engine::pipeline::CycleGuard;
use lp_engine::{EngineConfig, FeeEstimator, FeedSet, RefreshPipeline, RefreshScheduler, WorkingSetStore};
use signal_hook::consts::SIGHUP;
use signal_hook_tokio::Signals;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

/// Reload flag - set by SIGHUP handler
static RELOAD_FLAG: AtomicBool = AtomicBool::new(false);

/// LP position reconciliation engine
#[derive(Parser)]
#[command(name = "lp-engine")]
struct Args {
    /// Path to the TOML config
    #[arg(short, long, env = "LP_ENGINE_CONFIG", default_value = "config/lp_engine.toml")]
    config: PathBuf,

    /// Run a single refresh cycle, print the summary and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Log level comes from the config unless RUST_LOG is set
    let initial = EngineConfig::load(&args.config).context("Failed to load configuration")?;
    let subscriber = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&initial.general.log_level)),
        )
        .with_target(false);
    if initial.general.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!("===========================================");
    info!("   LP Position Engine");
    info!("===========================================");
    info!("Config file: {}", args.config.display());

    // Both survive config reloads
    let store = Arc::new(WorkingSetStore::new());
    let guard = CycleGuard::new();

    if args.once {
        let scheduler = build_scheduler(&initial, Arc::clone(&store), guard)?;
        scheduler.tick().await?;
        let ws = store.snapshot().await;
        println!("{}", ws.summary.generate_report());
        return Ok(());
    }

    let mut signals = Signals::new([SIGHUP])?;
    tokio::spawn(async move {
        while let Some(sig) = signals.next().await {
            if sig == SIGHUP {
                info!("Received SIGHUP - flagging config reload");
                RELOAD_FLAG.store(true, Ordering::SeqCst);
            }
        }
    });

    let mut config = initial;
    loop {
        match run_engine(&config, Arc::clone(&store), guard.clone()).await {
            Ok(true) => {
                match EngineConfig::load(&args.config) {
                    Ok(reloaded) => {
                        info!("Restarting with new configuration...");
                        config = reloaded;
                    }
                    Err(e) => error!("Config reload failed, keeping current settings: {:#}", e),
                }
            }
            Ok(false) => {
                info!("Engine stopped normally");
                break;
            }
            Err(e) => {
                error!("Engine error: {:#}", e);
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        }
    }

    Ok(())
}

fn build_scheduler(
    config: &EngineConfig,
    store: Arc<WorkingSetStore>,
    guard: CycleGuard,
) -> Result<RefreshScheduler> {
    let timeout = Duration::from_secs(config.general.http_timeout_secs);

    let mut feeds = FeedSet::new(feed_from_location(&config.feeds.base, timeout)?);
    if let Some(wallet) = &config.feeds.wallet {
        feeds = feeds.with_wallet(feed_from_location(wallet, timeout)?);
    }
    if let Some(il) = &config.feeds.il {
        feeds = feeds.with_il(feed_from_location(il, timeout)?);
    }
    info!("Feeds: {:?}", feeds);

    let pipeline = RefreshPipeline::new(FeeEstimator::new(config.general.fee_rate)?);
    let mut scheduler = RefreshScheduler::new(store, feeds, pipeline).with_guard(guard);

    if let Some(path) = &config.general.output_file {
        let path = PathBuf::from(path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        info!("State file: {}", path.display());
        scheduler = scheduler.with_output_file(path);
    }

    Ok(scheduler)
}

/// Run the scheduler - returns true if should restart (config reload)
async fn run_engine(config: &EngineConfig, store: Arc<WorkingSetStore>, guard: CycleGuard) -> Result<bool> {
    let scheduler = build_scheduler(config, store, guard)?;

    let poll_interval = Duration::from_millis(config.general.poll_interval_ms);
    info!("Fee rate: {:.2}%", config.general.fee_rate * 100.0);
    info!("Poll interval: {:?}", poll_interval);

    scheduler.run(poll_interval, &RELOAD_FLAG).await
}
