pub mod collector;
pub mod snapshot;

pub use collector::StatsCollector;
pub use snapshot::{StatValue, StatsSnapshot};
