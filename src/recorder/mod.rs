pub mod engine;
pub mod registry;
pub mod scheduler;
pub mod worker;

pub use engine::RecorderEngine;
pub use registry::RecordingRegistry;
pub use scheduler::FlushScheduler;
pub use worker::{PersistenceWorker, WorkItem};
