/// Feed-side collaborator interfaces
use std::collections::HashMap;
use std::path::Path;

use tracing::info;

use crate::error::{RecorderError, Result};
use crate::types::ContractMetadata;

/// Read-only directory of tradable contracts
pub trait ContractDirectory: Send + Sync {
    fn get_contract(&self, instrument_id: &str) -> Option<ContractMetadata>;
}

/// Requests a live market data subscription; fire-and-forget
pub trait FeedSubscriber: Send + Sync {
    fn subscribe(&self, symbol: &str, exchange: &str, gateway_name: &str);
}

/// Contract directory backed by an instrument-master CSV file
///
/// Expected columns: `symbol,exchange,gateway_name`.
pub struct CsvContractDirectory {
    contracts: HashMap<String, ContractMetadata>,
}

impl CsvContractDirectory {
    pub fn empty() -> Self {
        CsvContractDirectory {
            contracts: HashMap::new(),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path.as_ref())
            .map_err(|e| RecorderError::Config(format!("Failed to open contracts file: {}", e)))?;

        let mut contracts = HashMap::new();
        for record in reader.deserialize::<ContractMetadata>() {
            let contract = record
                .map_err(|e| RecorderError::Config(format!("Invalid contract row: {}", e)))?;
            contracts.insert(contract.instrument_id(), contract);
        }

        info!("Loaded {} contracts", contracts.len());

        Ok(CsvContractDirectory { contracts })
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}

impl ContractDirectory for CsvContractDirectory {
    fn get_contract(&self, instrument_id: &str) -> Option<ContractMetadata> {
        self.contracts.get(instrument_id).cloned()
    }
}

/// Subscriber for offline/replay use
pub struct NullFeedSubscriber;

impl FeedSubscriber for NullFeedSubscriber {
    fn subscribe(&self, _symbol: &str, _exchange: &str, _gateway_name: &str) {}
}
