/// In-memory batch accumulation between flush cycles
use std::collections::HashMap;
use std::mem;

use parking_lot::Mutex;

use crate::types::{Bar, Tick};

/// Per-symbol tick and bar batches, drained wholesale each flush cycle
///
/// Records append in arrival order. A drain swaps the whole per-symbol
/// map for an empty one under the lock, so a racing record lands fully
/// in the old map or fully in the new one.
#[derive(Default)]
pub struct BufferedCollector {
    ticks: Mutex<HashMap<String, Vec<Tick>>>,
    bars: Mutex<HashMap<String, Vec<Bar>>>,
}

impl BufferedCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_tick(&self, tick: Tick) {
        let mut ticks = self.ticks.lock();
        ticks.entry(tick.instrument_id()).or_default().push(tick);
    }

    pub fn record_bar(&self, bar: Bar) {
        let mut bars = self.bars.lock();
        bars.entry(bar.instrument_id()).or_default().push(bar);
    }

    /// Swap out and return all accumulated tick batches
    pub fn drain_ticks(&self) -> HashMap<String, Vec<Tick>> {
        mem::take(&mut *self.ticks.lock())
    }

    /// Swap out and return all accumulated bar batches
    pub fn drain_bars(&self) -> HashMap<String, Vec<Bar>> {
        mem::take(&mut *self.bars.lock())
    }

    pub fn tick_count(&self) -> usize {
        self.ticks.lock().values().map(Vec::len).sum()
    }

    pub fn bar_count(&self) -> usize {
        self.bars.lock().values().map(Vec::len).sum()
    }
}
