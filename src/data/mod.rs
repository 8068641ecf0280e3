pub mod bar_aggregator;
pub mod collector;
pub mod staleness;

pub use bar_aggregator::BarAggregator;
pub use collector::BufferedCollector;
pub use staleness::StalenessFilter;
