/// Core type definitions for the market data recorder
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Exchange tag for synthetic/local instruments with no live subscription
pub const LOCAL_EXCHANGE: &str = "LOCAL";

/// Gateway tag attached to ticks synthesized from spread quotes
pub const SPREAD_GATEWAY: &str = "SPREAD";

/// Live tick data from the feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tick {
    pub symbol: String,
    pub exchange: String,
    pub gateway_name: String,
    pub datetime: DateTime<Utc>,
    pub last_price: f64,
    /// Volume traded at the last price
    pub volume: f64,
    pub bid_price: f64,
    pub ask_price: f64,
    pub bid_volume: f64,
    pub ask_volume: f64,
}

impl Tick {
    /// Composite "symbol@EXCHANGE" identifier
    pub fn instrument_id(&self) -> String {
        format!("{}@{}", self.symbol, self.exchange)
    }
}

/// OHLCV bar over one fixed time interval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    pub exchange: String,
    /// Interval start
    pub datetime: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn instrument_id(&self) -> String {
        format!("{}@{}", self.symbol, self.exchange)
    }
}

/// Two-sided quote for a computed spread instrument
///
/// `datetime` stays `None` until the spread source has produced its
/// first valid quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpreadQuote {
    pub name: String,
    pub datetime: Option<DateTime<Utc>>,
    pub bid_price: f64,
    pub ask_price: f64,
    pub bid_volume: f64,
    pub ask_volume: f64,
}

/// Contract metadata from the contract directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractMetadata {
    pub symbol: String,
    pub exchange: String,
    pub gateway_name: String,
}

impl ContractMetadata {
    pub fn instrument_id(&self) -> String {
        format!("{}@{}", self.symbol, self.exchange)
    }
}

/// Per-symbol enrollment record kept in the recording registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingEntry {
    pub symbol: String,
    pub exchange: String,
    pub gateway_name: String,
}

/// Durable registry state, rewritten on every enrollment change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderSettings {
    #[serde(default)]
    pub tick: HashMap<String, RecordingEntry>,
    #[serde(default)]
    pub bar: HashMap<String, RecordingEntry>,
    #[serde(default = "default_filter_window_secs")]
    pub filter_window_secs: u64,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        RecorderSettings {
            tick: HashMap::new(),
            bar: HashMap::new(),
            filter_window_secs: default_filter_window_secs(),
        }
    }
}

fn default_filter_window_secs() -> u64 {
    60
}

/// Static application configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_setting_file")]
    pub setting_file: String,
    #[serde(default)]
    pub contracts_file: Option<String>,
    #[serde(default = "default_timer_period_secs")]
    pub timer_period_secs: u64,
    #[serde(default = "default_flush_every")]
    pub flush_every: u32,
    #[serde(default = "default_bar_interval_secs")]
    pub bar_interval_secs: i64,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            data_dir: default_data_dir(),
            setting_file: default_setting_file(),
            contracts_file: None,
            timer_period_secs: default_timer_period_secs(),
            flush_every: default_flush_every(),
            bar_interval_secs: default_bar_interval_secs(),
            log_filter: default_log_filter(),
        }
    }
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_setting_file() -> String {
    "data/recorder_settings.json".to_string()
}

fn default_timer_period_secs() -> u64 {
    1
}

fn default_flush_every() -> u32 {
    10
}

fn default_bar_interval_secs() -> i64 {
    60
}

fn default_log_filter() -> String {
    "tickvault=debug,info".to_string()
}

/// Split a composite "symbol@EXCHANGE" identifier into its parts
pub fn split_instrument_id(instrument_id: &str) -> (String, String) {
    match instrument_id.rsplit_once('@') {
        Some((symbol, exchange)) => (symbol.to_string(), exchange.to_string()),
        None => (instrument_id.to_string(), String::new()),
    }
}

/// Check if the identifier names a synthetic/local instrument
pub fn is_local_instrument(instrument_id: &str) -> bool {
    matches!(instrument_id.rsplit_once('@'), Some((_, exchange)) if exchange == LOCAL_EXCHANGE)
}
