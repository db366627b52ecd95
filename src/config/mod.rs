pub mod loader;
pub mod schema;

pub use loader::{ConfigFormat, ConfigLoader};
pub use schema::{JobConfig, ProxyConfig, StatsStoreConfig, TelemetryConfig};
