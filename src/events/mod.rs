pub mod notifier;
pub mod types;

pub use notifier::Notifier;
pub use types::{FeedEvent, RecorderEvent};
