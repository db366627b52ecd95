pub mod api;
pub mod status;

pub use api::{HttpJobApi, JobApi};
pub use status::{FINISHED_REASON, JobMetrics, JobStatus, JobStatusManager, JobUpdate};
