/// Fire-and-forget notification channel toward the UI/ops layer
use tokio::sync::mpsc;

use super::types::RecorderEvent;

/// Sender half of the notification channel
///
/// Sends never block and never fail the pipeline; a dropped receiver
/// simply discards notifications.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<RecorderEvent>,
}

impl Notifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<RecorderEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Notifier { tx }, rx)
    }

    pub fn log(&self, message: impl Into<String>) {
        let _ = self.tx.send(RecorderEvent::Log {
            message: message.into(),
        });
    }

    pub fn status_update(&self, tick_symbols: Vec<String>, bar_symbols: Vec<String>) {
        let _ = self.tx.send(RecorderEvent::StatusUpdate {
            tick_symbols,
            bar_symbols,
        });
    }

    pub fn fatal_error(&self, details: impl Into<String>) {
        let _ = self.tx.send(RecorderEvent::FatalError {
            details: details.into(),
        });
    }
}
