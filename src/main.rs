/// Capture daemon: drives the recorder engine from a stdin event feed
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use tickvault::{
    config::load_config,
    events::{FeedEvent, Notifier, RecorderEvent},
    feed::{ContractDirectory, CsvContractDirectory, NullFeedSubscriber},
    recorder::RecorderEngine,
    store::{JsonSettingsStore, JsonlMarketStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let config = load_config(&config_path).context("loading configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(config.log_filter.clone())
        .init();

    info!("Starting tickvault recorder...");

    let settings_store = Arc::new(JsonSettingsStore::new(&config.setting_file));
    let store = Arc::new(JsonlMarketStore::new(&config.data_dir));
    let contracts: Arc<dyn ContractDirectory> = match &config.contracts_file {
        Some(path) => Arc::new(CsvContractDirectory::load(path).context("loading contracts")?),
        None => Arc::new(CsvContractDirectory::empty()),
    };
    let subscriber = Arc::new(NullFeedSubscriber);

    let (notifier, mut notifications) = Notifier::channel();
    tokio::spawn(async move {
        while let Some(event) = notifications.recv().await {
            match event {
                RecorderEvent::Log { message } => info!("{}", message),
                RecorderEvent::StatusUpdate {
                    tick_symbols,
                    bar_symbols,
                } => info!(
                    "Recording {} tick / {} bar symbols",
                    tick_symbols.len(),
                    bar_symbols.len()
                ),
                RecorderEvent::FatalError { details } => {
                    error!("Recorder exception: {}", details)
                }
            }
        }
    });

    let mut engine = RecorderEngine::new(
        &config,
        settings_store,
        contracts,
        subscriber,
        store,
        notifier,
    )?;

    let mut timer = tokio::time::interval(Duration::from_secs(config.timer_period_secs));
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        tokio::select! {
            _ = timer.tick() => {
                engine.process_event(FeedEvent::Timer);
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<FeedEvent>(&line) {
                        Ok(event) => engine.process_event(event),
                        Err(e) => warn!("Ignoring malformed feed line: {}", e),
                    }
                }
                // Feed closed
                Ok(None) => break,
                Err(e) => {
                    error!("Feed read error: {}", e);
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    info!("Shutting down...");
    engine.close().await;
    info!("Shutdown complete");

    Ok(())
}
