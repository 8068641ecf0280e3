/// Symbol enrollment for tick and bar recording
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::Result;
use crate::events::Notifier;
use crate::feed::{ContractDirectory, FeedSubscriber};
use crate::store::SettingsStore;
use crate::types::{
    is_local_instrument, split_instrument_id, RecorderSettings, RecordingEntry, SPREAD_GATEWAY,
};

/// Tracks which symbols are enrolled for recording
///
/// Every successful mutation persists the full settings document before
/// returning and emits a status snapshot with sorted symbol lists.
pub struct RecordingRegistry {
    settings: RecorderSettings,
    settings_store: Arc<dyn SettingsStore>,
    contracts: Arc<dyn ContractDirectory>,
    subscriber: Arc<dyn FeedSubscriber>,
    notifier: Notifier,
}

impl RecordingRegistry {
    pub fn new(
        settings: RecorderSettings,
        settings_store: Arc<dyn SettingsStore>,
        contracts: Arc<dyn ContractDirectory>,
        subscriber: Arc<dyn FeedSubscriber>,
        notifier: Notifier,
    ) -> Self {
        RecordingRegistry {
            settings,
            settings_store,
            contracts,
            subscriber,
            notifier,
        }
    }

    pub fn is_tick_enrolled(&self, instrument_id: &str) -> bool {
        self.settings.tick.contains_key(instrument_id)
    }

    pub fn is_bar_enrolled(&self, instrument_id: &str) -> bool {
        self.settings.bar.contains_key(instrument_id)
    }

    pub fn filter_window_secs(&self) -> u64 {
        self.settings.filter_window_secs
    }

    /// Enroll a symbol for raw tick recording
    ///
    /// Returns Ok(false) when the symbol was already enrolled or its
    /// contract could not be resolved; both outcomes are reported
    /// through the log notification.
    pub fn add_tick_recording(&mut self, instrument_id: &str) -> Result<bool> {
        if self.settings.tick.contains_key(instrument_id) {
            self.notifier
                .log(format!("Already in tick recording list: {}", instrument_id));
            return Ok(false);
        }

        let entry = match self.resolve_entry(instrument_id) {
            Some(entry) => entry,
            None => return Ok(false),
        };

        self.settings.tick.insert(instrument_id.to_string(), entry);
        self.persist()?;
        self.put_status();
        self.notifier
            .log(format!("Added tick recording: {}", instrument_id));
        info!("Added tick recording: {}", instrument_id);

        Ok(true)
    }

    /// Enroll a symbol for bar recording
    pub fn add_bar_recording(&mut self, instrument_id: &str) -> Result<bool> {
        if self.settings.bar.contains_key(instrument_id) {
            self.notifier
                .log(format!("Already in bar recording list: {}", instrument_id));
            return Ok(false);
        }

        let entry = match self.resolve_entry(instrument_id) {
            Some(entry) => entry,
            None => return Ok(false),
        };

        self.settings.bar.insert(instrument_id.to_string(), entry);
        self.persist()?;
        self.put_status();
        self.notifier
            .log(format!("Added bar recording: {}", instrument_id));
        info!("Added bar recording: {}", instrument_id);

        Ok(true)
    }

    pub fn remove_tick_recording(&mut self, instrument_id: &str) -> Result<bool> {
        if self.settings.tick.remove(instrument_id).is_none() {
            self.notifier
                .log(format!("Not in tick recording list: {}", instrument_id));
            return Ok(false);
        }

        self.persist()?;
        self.put_status();
        self.notifier
            .log(format!("Removed tick recording: {}", instrument_id));
        info!("Removed tick recording: {}", instrument_id);

        Ok(true)
    }

    pub fn remove_bar_recording(&mut self, instrument_id: &str) -> Result<bool> {
        if self.settings.bar.remove(instrument_id).is_none() {
            self.notifier
                .log(format!("Not in bar recording list: {}", instrument_id));
            return Ok(false);
        }

        self.persist()?;
        self.put_status();
        self.notifier
            .log(format!("Removed bar recording: {}", instrument_id));
        info!("Removed bar recording: {}", instrument_id);

        Ok(true)
    }

    /// Emit a status snapshot with sorted symbol lists
    pub fn put_status(&self) {
        let mut tick_symbols: Vec<String> = self.settings.tick.keys().cloned().collect();
        tick_symbols.sort();

        let mut bar_symbols: Vec<String> = self.settings.bar.keys().cloned().collect();
        bar_symbols.sort();

        self.notifier.status_update(tick_symbols, bar_symbols);
    }

    /// Resolve the enrollment entry for a symbol
    ///
    /// Non-local symbols must exist in the contract directory and
    /// trigger a live subscription. Local (synthetic) symbols enroll
    /// without either.
    fn resolve_entry(&self, instrument_id: &str) -> Option<RecordingEntry> {
        if is_local_instrument(instrument_id) {
            let (symbol, exchange) = split_instrument_id(instrument_id);
            return Some(RecordingEntry {
                symbol,
                exchange,
                gateway_name: SPREAD_GATEWAY.to_string(),
            });
        }

        match self.contracts.get_contract(instrument_id) {
            Some(contract) => {
                self.subscriber.subscribe(
                    &contract.symbol,
                    &contract.exchange,
                    &contract.gateway_name,
                );
                Some(RecordingEntry {
                    symbol: contract.symbol,
                    exchange: contract.exchange,
                    gateway_name: contract.gateway_name,
                })
            }
            None => {
                self.notifier
                    .log(format!("Contract not found: {}", instrument_id));
                warn!("Contract not found: {}", instrument_id);
                None
            }
        }
    }

    fn persist(&self) -> Result<()> {
        self.settings_store.save(&self.settings)
    }
}
