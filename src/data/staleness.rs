/// Tick staleness filtering
use chrono::{DateTime, Duration, Utc};

use crate::types::Tick;

/// Rejects ticks whose timestamp deviates too far from wall-clock now
///
/// The reference `now` is refreshed once per base timer tick rather than
/// per tick, bounding the filtering cost at high tick rates. Replayed or
/// clock-skewed data is dropped here before it reaches the buffers or
/// bar aggregation.
pub struct StalenessFilter {
    now: DateTime<Utc>,
    window: Duration,
}

impl StalenessFilter {
    pub fn new(window_secs: u64) -> Self {
        StalenessFilter {
            now: Utc::now(),
            window: Duration::seconds(window_secs as i64),
        }
    }

    /// Update the reference timestamp (called on each base timer tick)
    pub fn refresh(&mut self, now: DateTime<Utc>) {
        self.now = now;
    }

    /// Whether the tick timestamp is within the window around the reference now
    pub fn accept(&self, tick: &Tick) -> bool {
        let delta = (tick.datetime - self.now).abs();
        delta < self.window
    }
}
