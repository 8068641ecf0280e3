/// Background persistence worker
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{error, info};

use crate::events::Notifier;
use crate::store::MarketStore;
use crate::types::{Bar, Tick};

/// Unit of work handed to the persistence worker: one per-symbol batch
#[derive(Debug)]
pub enum WorkItem {
    TickBatch(Vec<Tick>),
    BarBatch(Vec<Bar>),
}

const DEQUEUE_WAIT: Duration = Duration::from_secs(1);

/// Single consumer draining the work queue on a dedicated task
///
/// A store error is terminal: the worker stops, surfaces one
/// fatal-error notification, and never retries or restarts itself.
pub struct PersistenceWorker {
    tx: mpsc::UnboundedSender<WorkItem>,
    active: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl PersistenceWorker {
    pub fn start(store: Arc<dyn MarketStore>, notifier: Notifier) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let active = Arc::new(AtomicBool::new(true));

        let handle = tokio::spawn(run(rx, store, notifier, Arc::clone(&active)));

        PersistenceWorker {
            tx,
            active,
            handle: Some(handle),
        }
    }

    /// Hand a batch to the worker; ownership transfers on enqueue
    pub fn enqueue(&self, item: WorkItem) {
        let _ = self.tx.send(item);
    }

    /// False once the worker has stopped (shutdown or fatal store error)
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Cooperative shutdown; waits for the consumer loop to exit
    pub async fn close(&mut self) {
        self.active.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

async fn run(
    mut rx: mpsc::UnboundedReceiver<WorkItem>,
    store: Arc<dyn MarketStore>,
    notifier: Notifier,
    active: Arc<AtomicBool>,
) {
    while active.load(Ordering::Acquire) {
        match timeout(DEQUEUE_WAIT, rx.recv()).await {
            // Bounded wait elapsed; re-check the stop flag
            Err(_) => continue,
            Ok(None) => break,
            Ok(Some(item)) => {
                let result = match item {
                    WorkItem::TickBatch(ticks) => store.save_tick_batch(&ticks, true).await,
                    WorkItem::BarBatch(bars) => store.save_bar_batch(&bars, true).await,
                };

                if let Err(e) = result {
                    active.store(false, Ordering::Release);
                    error!("Persistence worker stopped: {} ({})", e, e.error_code());
                    notifier.fatal_error(e.to_string());
                }
            }
        }
    }

    info!("Persistence worker exited");
}
