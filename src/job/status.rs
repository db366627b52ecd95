use crate::job::api::JobApi;
use crate::metrics::snapshot::{
    ELAPSED_TIME_SECONDS, ITEM_SCRAPED_COUNT, REQUEST_COUNT, RESPONSE_BYTES,
};
use crate::metrics::{StatsCollector, StatsSnapshot};
use crate::publisher::EventPublisher;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Stop reason the engine reports when the crawl ran to completion.
pub const FINISHED_REASON: &str = "finished";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Running,
    Completed,
    Incomplete,
}

impl JobStatus {
    /// Anything but a clean finish counts as incomplete.
    pub fn from_stop_reason(reason: &str) -> Self {
        if reason == FINISHED_REASON {
            JobStatus::Completed
        } else {
            JobStatus::Incomplete
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobMetrics {
    pub lifespan: u64,
    pub total_bytes: u64,
    pub item_count: u64,
    pub request_count: u64,
}

impl JobMetrics {
    pub fn from_snapshot(snapshot: &StatsSnapshot) -> Self {
        Self {
            lifespan: snapshot.count(ELAPSED_TIME_SECONDS),
            total_bytes: snapshot.count(RESPONSE_BYTES),
            item_count: snapshot.count(ITEM_SCRAPED_COUNT),
            request_count: snapshot.count(REQUEST_COUNT),
        }
    }
}

/// Body of one status update sent to the Job API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobUpdate {
    pub status: JobStatus,
    #[serde(flatten)]
    pub metrics: Option<JobMetrics>,
}

/// Owns the job's lifecycle state and reports transitions to the Job API.
pub struct JobStatusManager {
    job_id: String,
    api: Arc<dyn JobApi>,
    stats: Arc<StatsCollector>,
    publisher: Arc<EventPublisher>,
    status: Mutex<Option<JobStatus>>,
}

impl JobStatusManager {
    pub fn new(
        job_id: String,
        api: Arc<dyn JobApi>,
        stats: Arc<StatsCollector>,
        publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            job_id,
            api,
            stats,
            publisher,
            status: Mutex::new(None),
        }
    }

    pub async fn status(&self) -> Option<JobStatus> {
        *self.status.lock().await
    }

    pub async fn open(&self) {
        {
            let mut status = self.status.lock().await;
            if status.is_some() {
                log::warn!("Job {} already opened", self.job_id);
                return;
            }
            *status = Some(JobStatus::Running);
        }

        let update = JobUpdate {
            status: JobStatus::Running,
            metrics: None,
        };
        if let Err(e) = self.api.update(&update).await {
            log::error!("Could not mark job {} as running: {}", self.job_id, e);
        }
    }

    /// Moves the job to its terminal state, reports it, publishes the final
    /// stats and flushes the publisher. Returns `None` if the job was
    /// already closed.
    pub async fn close(&self, stop_reason: &str) -> Option<JobStatus> {
        let terminal = JobStatus::from_stop_reason(stop_reason);
        {
            let mut status = self.status.lock().await;
            if status.is_some_and(|s| s.is_terminal()) {
                return None;
            }
            *status = Some(terminal);
        }

        let snapshot = self.stats.snapshot();
        let metrics = JobMetrics::from_snapshot(&snapshot);
        log::info!(
            "Job {} closed ({}): {:?}, {} items, {} requests, {} bytes in {}s",
            self.job_id,
            stop_reason,
            terminal,
            metrics.item_count,
            metrics.request_count,
            metrics.total_bytes,
            metrics.lifespan
        );

        let update = JobUpdate {
            status: terminal,
            metrics: Some(metrics),
        };
        if let Err(e) = self.api.update(&update).await {
            log::error!("Could not report final status of job {}: {}", self.job_id, e);
        }

        self.publisher
            .publish_stats(&self.job_id, Value::Object(snapshot.to_json()));
        if let Err(e) = self.publisher.flush().await {
            log::error!("Flushing events of job {} failed: {}", self.job_id, e);
        }

        Some(terminal)
    }
}
