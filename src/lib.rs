pub mod accounting;
pub mod bus;
pub mod config;
pub mod error;
pub mod hooks;
pub mod job;
pub mod metrics;
pub mod proxy;
pub mod publisher;
pub mod request;
pub mod scheduler;
pub mod store;

pub use bus::{Event, MessageBus, Topic};
pub use config::{ConfigLoader, TelemetryConfig};
pub use error::{Error, Result};
pub use hooks::{CrawlHooks, JobTelemetry};
pub use job::{JobStatus, JobStatusManager};
pub use metrics::{StatValue, StatsCollector, StatsSnapshot};
pub use publisher::EventPublisher;
pub use scheduler::{SchedulerState, StatsScheduler};
pub use store::CounterStore;
