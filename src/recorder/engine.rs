/// Recorder engine: adapts feed events into the capture pipeline
use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::data::{BarAggregator, BufferedCollector, StalenessFilter};
use crate::error::Result;
use crate::events::{FeedEvent, Notifier};
use crate::feed::{ContractDirectory, FeedSubscriber};
use crate::recorder::{FlushScheduler, PersistenceWorker, WorkItem};
use crate::store::{MarketStore, SettingsStore};
use crate::types::{AppConfig, ContractMetadata, SpreadQuote, Tick, LOCAL_EXCHANGE, SPREAD_GATEWAY};

use super::registry::RecordingRegistry;

/// Long-lived recording engine
///
/// All event processing runs on the single driver task that owns the
/// engine; the persistence worker is the only other task, fed through
/// the work queue. Must be constructed inside a tokio runtime.
pub struct RecorderEngine {
    registry: RecordingRegistry,
    collector: Arc<BufferedCollector>,
    aggregators: HashMap<String, BarAggregator>,
    filter: StalenessFilter,
    scheduler: FlushScheduler,
    worker: PersistenceWorker,
    subscriber: Arc<dyn FeedSubscriber>,
    notifier: Notifier,
    bar_interval_secs: i64,
}

impl RecorderEngine {
    pub fn new(
        config: &AppConfig,
        settings_store: Arc<dyn SettingsStore>,
        contracts: Arc<dyn ContractDirectory>,
        subscriber: Arc<dyn FeedSubscriber>,
        store: Arc<dyn MarketStore>,
        notifier: Notifier,
    ) -> Result<Self> {
        let settings = settings_store.load()?;

        let registry = RecordingRegistry::new(
            settings,
            settings_store,
            contracts,
            Arc::clone(&subscriber),
            notifier.clone(),
        );

        let filter = StalenessFilter::new(registry.filter_window_secs());
        let worker = PersistenceWorker::start(store, notifier.clone());

        let engine = RecorderEngine {
            registry,
            collector: Arc::new(BufferedCollector::new()),
            aggregators: HashMap::new(),
            filter,
            scheduler: FlushScheduler::new(config.flush_every),
            worker,
            subscriber,
            notifier,
            bar_interval_secs: config.bar_interval_secs,
        };

        engine.registry.put_status();
        info!("Recorder engine started");

        Ok(engine)
    }

    /// Dispatch one inbound feed event
    pub fn process_event(&mut self, event: FeedEvent) {
        match event {
            FeedEvent::Tick(tick) => self.update_tick(&tick),
            FeedEvent::Contract(contract) => self.process_contract(&contract),
            FeedEvent::Spread(quote) => self.process_spread(&quote),
            FeedEvent::Timer => self.process_timer(),
        }
    }

    pub fn add_tick_recording(&mut self, instrument_id: &str) -> Result<bool> {
        self.registry.add_tick_recording(instrument_id)
    }

    pub fn add_bar_recording(&mut self, instrument_id: &str) -> Result<bool> {
        self.registry.add_bar_recording(instrument_id)
    }

    pub fn remove_tick_recording(&mut self, instrument_id: &str) -> Result<bool> {
        self.registry.remove_tick_recording(instrument_id)
    }

    pub fn remove_bar_recording(&mut self, instrument_id: &str) -> Result<bool> {
        self.registry.remove_bar_recording(instrument_id)
    }

    /// Forward a log message to the notification sink
    pub fn write_log(&self, message: impl Into<String>) {
        self.notifier.log(message);
    }

    /// Emit a status snapshot of current enrollments
    pub fn put_status(&self) {
        self.registry.put_status();
    }

    /// Cooperative shutdown; waits for the persistence worker to exit
    pub async fn close(&mut self) {
        self.worker.close().await;
        info!("Recorder engine closed");
    }

    fn update_tick(&mut self, tick: &Tick) {
        if !self.filter.accept(tick) {
            return;
        }

        let instrument_id = tick.instrument_id();

        if self.registry.is_tick_enrolled(&instrument_id) {
            self.collector.record_tick(tick.clone());
        }

        if self.registry.is_bar_enrolled(&instrument_id) {
            self.bar_aggregator(&instrument_id).update_tick(tick);
        }
    }

    /// Lazily create the per-symbol aggregator, wired into the collector
    fn bar_aggregator(&mut self, instrument_id: &str) -> &mut BarAggregator {
        let interval_secs = self.bar_interval_secs;
        let collector = Arc::clone(&self.collector);

        self.aggregators
            .entry(instrument_id.to_string())
            .or_insert_with(move || {
                BarAggregator::new(interval_secs, move |bar| collector.record_bar(bar))
            })
    }

    fn process_contract(&self, contract: &ContractMetadata) {
        let instrument_id = contract.instrument_id();

        if self.registry.is_tick_enrolled(&instrument_id)
            || self.registry.is_bar_enrolled(&instrument_id)
        {
            self.subscriber.subscribe(
                &contract.symbol,
                &contract.exchange,
                &contract.gateway_name,
            );
        }
    }

    fn process_spread(&mut self, quote: &SpreadQuote) {
        // A source that has not produced a quote yet carries no timestamp
        let datetime = match quote.datetime {
            Some(datetime) => datetime,
            None => return,
        };

        let tick = Tick {
            symbol: quote.name.clone(),
            exchange: LOCAL_EXCHANGE.to_string(),
            gateway_name: SPREAD_GATEWAY.to_string(),
            datetime,
            last_price: (quote.bid_price + quote.ask_price) / 2.0,
            volume: 0.0,
            bid_price: quote.bid_price,
            ask_price: quote.ask_price,
            bid_volume: quote.bid_volume,
            ask_volume: quote.ask_volume,
        };

        self.update_tick(&tick);
    }

    fn process_timer(&mut self) {
        self.filter.refresh(Utc::now());

        if !self.scheduler.on_timer() {
            return;
        }

        // Flush is suspended while the worker is stopped; batches stay
        // in the collector instead of piling into a dead queue.
        if !self.worker.is_active() {
            return;
        }

        for (_, bars) in self.collector.drain_bars() {
            self.worker.enqueue(WorkItem::BarBatch(bars));
        }

        for (_, ticks) in self.collector.drain_ticks() {
            self.worker.enqueue(WorkItem::TickBatch(ticks));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use parking_lot::Mutex;

    use crate::error::RecorderError;
    use crate::events::RecorderEvent;
    use crate::types::{Bar, RecorderSettings};

    use super::*;

    struct MemorySettingsStore {
        saved: Mutex<Option<RecorderSettings>>,
    }

    impl SettingsStore for MemorySettingsStore {
        fn load(&self) -> Result<RecorderSettings> {
            Ok(self.saved.lock().clone().unwrap_or_default())
        }

        fn save(&self, settings: &RecorderSettings) -> Result<()> {
            *self.saved.lock() = Some(settings.clone());
            Ok(())
        }
    }

    struct MapContractDirectory {
        contracts: std::collections::HashMap<String, ContractMetadata>,
    }

    impl MapContractDirectory {
        fn with(symbols: &[(&str, &str)]) -> Self {
            let mut contracts = std::collections::HashMap::new();
            for (symbol, exchange) in symbols {
                let contract = ContractMetadata {
                    symbol: symbol.to_string(),
                    exchange: exchange.to_string(),
                    gateway_name: "CTP".to_string(),
                };
                contracts.insert(contract.instrument_id(), contract);
            }
            MapContractDirectory { contracts }
        }
    }

    impl ContractDirectory for MapContractDirectory {
        fn get_contract(&self, instrument_id: &str) -> Option<ContractMetadata> {
            self.contracts.get(instrument_id).cloned()
        }
    }

    struct RecordingSubscriber {
        calls: Mutex<Vec<String>>,
    }

    impl FeedSubscriber for RecordingSubscriber {
        fn subscribe(&self, symbol: &str, exchange: &str, _gateway_name: &str) {
            self.calls.lock().push(format!("{}@{}", symbol, exchange));
        }
    }

    struct MockStore {
        fail: bool,
        calls: AtomicUsize,
        ticks: Mutex<Vec<Tick>>,
        bars: Mutex<Vec<Bar>>,
    }

    impl MockStore {
        fn new(fail: bool) -> Self {
            MockStore {
                fail,
                calls: AtomicUsize::new(0),
                ticks: Mutex::new(Vec::new()),
                bars: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MarketStore for MockStore {
        async fn save_tick_batch(&self, ticks: &[Tick], _stream: bool) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(RecorderError::Store("disk full".to_string()));
            }
            self.ticks.lock().extend_from_slice(ticks);
            Ok(())
        }

        async fn save_bar_batch(&self, bars: &[Bar], _stream: bool) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(RecorderError::Store("disk full".to_string()));
            }
            self.bars.lock().extend_from_slice(bars);
            Ok(())
        }
    }

    struct Fixture {
        engine: RecorderEngine,
        store: Arc<MockStore>,
        subscriber: Arc<RecordingSubscriber>,
        rx: tokio::sync::mpsc::UnboundedReceiver<RecorderEvent>,
    }

    fn make_engine(config: AppConfig, symbols: &[(&str, &str)], fail_store: bool) -> Fixture {
        let store = Arc::new(MockStore::new(fail_store));
        let subscriber = Arc::new(RecordingSubscriber {
            calls: Mutex::new(Vec::new()),
        });
        let (notifier, rx) = Notifier::channel();

        let engine = RecorderEngine::new(
            &config,
            Arc::new(MemorySettingsStore {
                saved: Mutex::new(None),
            }),
            Arc::new(MapContractDirectory::with(symbols)),
            subscriber.clone(),
            store.clone(),
            notifier,
        )
        .unwrap();

        Fixture {
            engine,
            store,
            subscriber,
            rx,
        }
    }

    fn make_tick(datetime: DateTime<Utc>, price: f64) -> Tick {
        Tick {
            symbol: "rb2110".to_string(),
            exchange: "SHFE".to_string(),
            gateway_name: "CTP".to_string(),
            datetime,
            last_price: price,
            volume: 1.0,
            bid_price: price - 1.0,
            ask_price: price + 1.0,
            bid_volume: 2.0,
            ask_volume: 3.0,
        }
    }

    #[tokio::test]
    async fn test_tick_recording_gated_by_enrollment() {
        let mut fixture = make_engine(AppConfig::default(), &[("rb2110", "SHFE")], false);
        let now = Utc::now();

        // Not enrolled yet; nothing is buffered
        fixture.engine.process_event(FeedEvent::Tick(make_tick(now, 5000.0)));
        assert_eq!(fixture.engine.collector.tick_count(), 0);

        fixture.engine.add_tick_recording("rb2110@SHFE").unwrap();
        fixture.engine.process_event(FeedEvent::Tick(make_tick(now, 5001.0)));
        assert_eq!(fixture.engine.collector.tick_count(), 1);

        fixture.engine.close().await;
    }

    #[tokio::test]
    async fn test_stale_tick_leaves_no_state() {
        let mut fixture = make_engine(AppConfig::default(), &[("rb2110", "SHFE")], false);
        fixture.engine.add_tick_recording("rb2110@SHFE").unwrap();
        fixture.engine.add_bar_recording("rb2110@SHFE").unwrap();

        let stale = Utc::now() - chrono::Duration::seconds(120);
        fixture.engine.process_event(FeedEvent::Tick(make_tick(stale, 5000.0)));

        assert_eq!(fixture.engine.collector.tick_count(), 0);
        assert!(fixture.engine.aggregators.is_empty());

        fixture.engine.close().await;
    }

    #[tokio::test]
    async fn test_one_second_bar_scenario() {
        let config = AppConfig {
            bar_interval_secs: 1,
            ..AppConfig::default()
        };
        let mut fixture = make_engine(config, &[("rb2110", "SHFE")], false);
        fixture.engine.add_bar_recording("rb2110@SHFE").unwrap();

        // Align to a whole second so sub-second offsets stay in one interval
        let base = Utc.timestamp_opt(Utc::now().timestamp(), 0).unwrap();

        for (millis, price) in [(100, 10.0), (500, 12.0), (1200, 11.0)] {
            let datetime = base + chrono::Duration::milliseconds(millis);
            fixture.engine.process_event(FeedEvent::Tick(make_tick(datetime, price)));
        }

        assert_eq!(fixture.engine.collector.bar_count(), 1);

        let bars = fixture.engine.collector.drain_bars();
        let bar = &bars["rb2110@SHFE"][0];
        assert_eq!(bar.datetime, base);
        assert_eq!(bar.open, 10.0);
        assert_eq!(bar.high, 12.0);
        assert_eq!(bar.low, 10.0);
        assert_eq!(bar.close, 12.0);

        // A new bar is open for the tick past the boundary
        let current = fixture.engine.aggregators["rb2110@SHFE"].current_bar().unwrap();
        assert_eq!(current.open, 11.0);

        fixture.engine.close().await;
    }

    #[tokio::test]
    async fn test_flush_on_the_tenth_timer_tick() {
        let mut fixture = make_engine(AppConfig::default(), &[("rb2110", "SHFE")], false);
        fixture.engine.add_tick_recording("rb2110@SHFE").unwrap();
        fixture.engine.process_event(FeedEvent::Tick(make_tick(Utc::now(), 5000.0)));

        for _ in 0..9 {
            fixture.engine.process_event(FeedEvent::Timer);
        }
        assert_eq!(fixture.engine.collector.tick_count(), 1);
        assert_eq!(fixture.store.calls.load(Ordering::SeqCst), 0);

        fixture.engine.process_event(FeedEvent::Timer);
        assert_eq!(fixture.engine.collector.tick_count(), 0);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fixture.store.ticks.lock().len(), 1);

        fixture.engine.close().await;
    }

    #[tokio::test]
    async fn test_spread_quote_synthesizes_local_tick() {
        let config = AppConfig {
            flush_every: 1,
            ..AppConfig::default()
        };
        let mut fixture = make_engine(config, &[], false);
        fixture.engine.add_tick_recording("spread1@LOCAL").unwrap();

        // Uninitialized source is skipped
        fixture.engine.process_event(FeedEvent::Spread(SpreadQuote {
            name: "spread1".to_string(),
            datetime: None,
            bid_price: 99.0,
            ask_price: 101.0,
            bid_volume: 5.0,
            ask_volume: 6.0,
        }));
        assert_eq!(fixture.engine.collector.tick_count(), 0);

        fixture.engine.process_event(FeedEvent::Spread(SpreadQuote {
            name: "spread1".to_string(),
            datetime: Some(Utc::now()),
            bid_price: 99.0,
            ask_price: 101.0,
            bid_volume: 5.0,
            ask_volume: 6.0,
        }));

        let drained = fixture.engine.collector.drain_ticks();
        let tick = &drained["spread1@LOCAL"][0];
        assert_eq!(tick.last_price, 100.0);
        assert_eq!(tick.exchange, LOCAL_EXCHANGE);
        assert_eq!(tick.gateway_name, SPREAD_GATEWAY);
        assert_eq!(tick.bid_price, 99.0);
        assert_eq!(tick.ask_price, 101.0);

        fixture.engine.close().await;
    }

    #[tokio::test]
    async fn test_contract_event_resubscribes_enrolled_symbols() {
        let mut fixture = make_engine(AppConfig::default(), &[("rb2110", "SHFE")], false);
        fixture.engine.add_tick_recording("rb2110@SHFE").unwrap();
        fixture.subscriber.calls.lock().clear();

        fixture.engine.process_event(FeedEvent::Contract(ContractMetadata {
            symbol: "rb2110".to_string(),
            exchange: "SHFE".to_string(),
            gateway_name: "CTP".to_string(),
        }));
        fixture.engine.process_event(FeedEvent::Contract(ContractMetadata {
            symbol: "unknown".to_string(),
            exchange: "SHFE".to_string(),
            gateway_name: "CTP".to_string(),
        }));

        assert_eq!(
            *fixture.subscriber.calls.lock(),
            vec!["rb2110@SHFE".to_string()]
        );

        fixture.engine.close().await;
    }

    #[tokio::test]
    async fn test_store_failure_stops_flushing_but_keeps_buffering() {
        let config = AppConfig {
            flush_every: 1,
            ..AppConfig::default()
        };
        let mut fixture = make_engine(config, &[("rb2110", "SHFE")], true);
        fixture.engine.add_tick_recording("rb2110@SHFE").unwrap();

        fixture.engine.process_event(FeedEvent::Tick(make_tick(Utc::now(), 5000.0)));
        fixture.engine.process_event(FeedEvent::Timer);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!fixture.engine.worker.is_active());
        assert_eq!(fixture.store.calls.load(Ordering::SeqCst), 1);

        let mut fatals = 0;
        while let Ok(event) = fixture.rx.try_recv() {
            if matches!(event, RecorderEvent::FatalError { .. }) {
                fatals += 1;
            }
        }
        assert_eq!(fatals, 1);

        // Ingestion keeps accepting; batches accumulate instead of flushing
        fixture.engine.process_event(FeedEvent::Tick(make_tick(Utc::now(), 5001.0)));
        fixture.engine.process_event(FeedEvent::Timer);
        assert_eq!(fixture.engine.collector.tick_count(), 1);
        assert_eq!(fixture.store.calls.load(Ordering::SeqCst), 1);

        fixture.engine.close().await;
    }
}
