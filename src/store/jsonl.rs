/// JSONL market data store - append-only files per symbol and kind
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::Result;
use crate::store::MarketStore;
use crate::types::{Bar, Tick};

/// File-backed store writing one JSON line per record
pub struct JsonlMarketStore {
    data_dir: PathBuf,
}

impl JsonlMarketStore {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        JsonlMarketStore {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    fn batch_file(&self, instrument_id: &str, kind: &str) -> PathBuf {
        self.data_dir.join(format!("{}.{}.jsonl", instrument_id, kind))
    }

    async fn append_batch<T: Serialize>(&self, path: PathBuf, records: &[T]) -> Result<()> {
        fs::create_dir_all(&self.data_dir).await?;

        let mut lines = String::new();
        for record in records {
            lines.push_str(&serde_json::to_string(record)?);
            lines.push('\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        file.write_all(lines.as_bytes()).await?;
        file.sync_all().await?;

        Ok(())
    }
}

#[async_trait]
impl MarketStore for JsonlMarketStore {
    async fn save_tick_batch(&self, ticks: &[Tick], _stream: bool) -> Result<()> {
        let first = match ticks.first() {
            Some(first) => first,
            None => return Ok(()),
        };

        let instrument_id = first.instrument_id();
        self.append_batch(self.batch_file(&instrument_id, "ticks"), ticks)
            .await?;

        debug!("Persisted {} ticks for {}", ticks.len(), instrument_id);
        Ok(())
    }

    async fn save_bar_batch(&self, bars: &[Bar], _stream: bool) -> Result<()> {
        let first = match bars.first() {
            Some(first) => first,
            None => return Ok(()),
        };

        let instrument_id = first.instrument_id();
        self.append_batch(self.batch_file(&instrument_id, "bars"), bars)
            .await?;

        debug!("Persisted {} bars for {}", bars.len(), instrument_id);
        Ok(())
    }
}
