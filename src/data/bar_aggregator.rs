/// Bar aggregation from live ticks
use chrono::{DateTime, TimeZone, Utc};
use tracing::debug;

use crate::types::{Bar, Tick};

/// Callback invoked with each completed bar
pub type OnBar = Box<dyn Fn(Bar) + Send + Sync>;

/// Bar in progress (not yet complete)
#[derive(Debug, Clone)]
struct PartialBar {
    symbol: String,
    exchange: String,
    start: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl PartialBar {
    fn open_from(start: DateTime<Utc>, tick: &Tick) -> Self {
        PartialBar {
            symbol: tick.symbol.clone(),
            exchange: tick.exchange.clone(),
            start,
            open: tick.last_price,
            high: tick.last_price,
            low: tick.last_price,
            close: tick.last_price,
            volume: tick.volume,
        }
    }

    fn update(&mut self, tick: &Tick) {
        self.close = tick.last_price;
        self.high = self.high.max(tick.last_price);
        self.low = self.low.min(tick.last_price);
        self.volume += tick.volume;
    }

    fn into_bar(self) -> Bar {
        Bar {
            symbol: self.symbol,
            exchange: self.exchange,
            datetime: self.start,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        }
    }
}

/// Aggregates ticks for a single symbol into fixed-interval OHLCV bars
///
/// The first tick of an interval opens the bar; subsequent ticks update
/// high/low/close/volume. A tick whose interval boundary lies past the
/// open bar finalizes it through the `on_bar` callback and opens a new
/// one. Ticks with identical or decreasing timestamps fold into the
/// current bar, so emitted interval starts are strictly increasing.
pub struct BarAggregator {
    interval_secs: i64,
    current: Option<PartialBar>,
    on_bar: OnBar,
}

impl BarAggregator {
    pub fn new<F>(interval_secs: i64, on_bar: F) -> Self
    where
        F: Fn(Bar) + Send + Sync + 'static,
    {
        BarAggregator {
            interval_secs: interval_secs.max(1),
            current: None,
            on_bar: Box::new(on_bar),
        }
    }

    /// Interval start boundary for a tick timestamp
    fn boundary(&self, datetime: DateTime<Utc>) -> DateTime<Utc> {
        let secs = datetime.timestamp().div_euclid(self.interval_secs) * self.interval_secs;
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    /// Process one tick; completed bars are emitted through the callback
    pub fn update_tick(&mut self, tick: &Tick) {
        let boundary = self.boundary(tick.datetime);

        let rollover = match &self.current {
            Some(bar) => boundary > bar.start,
            None => false,
        };

        if rollover {
            if let Some(bar) = self.current.take() {
                let completed = bar.into_bar();
                debug!(
                    "Bar completed: {} @ {} O:{:.2} H:{:.2} L:{:.2} C:{:.2} V:{}",
                    completed.instrument_id(),
                    completed.datetime,
                    completed.open,
                    completed.high,
                    completed.low,
                    completed.close,
                    completed.volume
                );
                (self.on_bar)(completed);
            }
        }

        match self.current.as_mut() {
            Some(bar) => bar.update(tick),
            None => self.current = Some(PartialBar::open_from(boundary, tick)),
        }
    }

    /// Get current in-progress bar (for monitoring)
    pub fn current_bar(&self) -> Option<Bar> {
        self.current.clone().map(PartialBar::into_bar)
    }
}
