/// Persistence-side collaborator interfaces
use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Bar, RecorderSettings, Tick};

pub mod jsonl;
pub mod settings;

pub use jsonl::JsonlMarketStore;
pub use settings::JsonSettingsStore;

/// Bulk write access to the persistent market data store
///
/// Batches are per-symbol. `stream` marks a live capture write as
/// opposed to a backfill.
#[async_trait]
pub trait MarketStore: Send + Sync {
    async fn save_tick_batch(&self, ticks: &[Tick], stream: bool) -> Result<()>;

    async fn save_bar_batch(&self, bars: &[Bar], stream: bool) -> Result<()>;
}

/// Durable storage for recorder settings
pub trait SettingsStore: Send + Sync {
    fn load(&self) -> Result<RecorderSettings>;

    fn save(&self, settings: &RecorderSettings) -> Result<()>;
}
