/// Event definitions for the recorder core
use serde::{Deserialize, Serialize};

use crate::types::{ContractMetadata, SpreadQuote, Tick};

/// Inbound feed events, dispatched through an explicit match
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedEvent {
    /// A price/quote observation for one symbol
    Tick(Tick),
    /// A contract has become available on its gateway
    Contract(ContractMetadata),
    /// Computed update for a synthetic spread instrument
    Spread(SpreadQuote),
    /// Base timer fired
    Timer,
}

/// Outbound notifications consumed by UI/ops tooling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecorderEvent {
    Log {
        message: String,
    },
    StatusUpdate {
        tick_symbols: Vec<String>,
        bar_symbols: Vec<String>,
    },
    FatalError {
        details: String,
    },
}
