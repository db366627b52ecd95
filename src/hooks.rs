use crate::bus::MessageBus;
use crate::config::TelemetryConfig;
use crate::error::Result;
use crate::job::{HttpJobApi, JobApi, JobStatus, JobStatusManager};
use crate::metrics::snapshot::{
    DATABASE_SIZE_JSON, FINISH_REASON, FINISH_TIME, ITEM_SCRAPED_COUNT, REQUEST_COUNT,
    RESPONSE_BYTES, RESPONSE_COUNT, RESPONSE_STATUS_COUNT_PREFIX, format_time,
};
use crate::metrics::{StatValue, StatsCollector, StatsSnapshot};
use crate::proxy::ProxyUsageTracker;
use crate::publisher::EventPublisher;
use crate::request::{CrawlRequest, CrawlResponse};
use crate::scheduler::{SchedulerState, StatsScheduler};
use crate::store::{self, CounterStore};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};
use std::sync::Arc;
use validator::Validate;

/// Lifecycle callbacks the crawl engine invokes. None of them fail: a
/// telemetry problem degrades reporting, never the crawl.
#[async_trait]
pub trait CrawlHooks: Send + Sync {
    async fn on_open(&self);

    /// Called before a request is handed to the downloader.
    fn on_request(&self, _request: &mut CrawlRequest) {}

    fn on_item(&self, item: Value);

    fn on_request_complete(&self, request: &CrawlRequest, response: &CrawlResponse);

    async fn on_close(&self, reason: &str);
}

/// Wires the counters, snapshot scheduler, status manager, proxy tracker
/// and event publisher for one job.
pub struct JobTelemetry {
    config: TelemetryConfig,
    stats: Arc<StatsCollector>,
    publisher: Arc<EventPublisher>,
    scheduler: StatsScheduler,
    status: JobStatusManager,
    proxy: Option<ProxyUsageTracker>,
}

impl JobTelemetry {
    pub fn new(
        config: TelemetryConfig,
        api: Arc<dyn JobApi>,
        bus: Arc<dyn MessageBus>,
        store: Arc<dyn CounterStore>,
    ) -> Result<Self> {
        config.validate()?;
        config.check()?;

        let stats = Arc::new(StatsCollector::new());
        let publisher = Arc::new(EventPublisher::new(bus)?);
        let scheduler = StatsScheduler::new(stats.clone(), store, config.stats.key.clone());
        let status = JobStatusManager::new(
            config.job.key.clone(),
            api,
            stats.clone(),
            publisher.clone(),
        );
        let proxy = ProxyUsageTracker::from_config(&config.proxy, stats.clone());

        Ok(Self {
            config,
            stats,
            publisher,
            scheduler,
            status,
            proxy,
        })
    }

    /// Builds the HTTP Job API client and opens the configured store.
    pub async fn connect(config: TelemetryConfig, bus: Arc<dyn MessageBus>) -> Result<Self> {
        let api = Arc::new(HttpJobApi::new(&config.job)?);
        let store = store::connect(&config.stats.store_url).await?;
        Self::new(config, api, bus, store)
    }

    pub fn stats(&self) -> Arc<StatsCollector> {
        self.stats.clone()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub async fn status(&self) -> Option<JobStatus> {
        self.status.status().await
    }

    pub async fn scheduler_state(&self) -> SchedulerState {
        self.scheduler.state().await
    }
}

#[async_trait]
impl CrawlHooks for JobTelemetry {
    async fn on_open(&self) {
        log::info!("Opening job {}", self.config.job.key);
        self.stats.start(Utc::now());
        self.status.open().await;

        if let Err(e) = self.scheduler.start(self.config.stats.interval_secs).await {
            log::error!("Stats snapshots disabled: {}", e);
        }
    }

    fn on_request(&self, request: &mut CrawlRequest) {
        self.stats.inc_value(REQUEST_COUNT, 1);
        if let Some(proxy) = &self.proxy {
            proxy.process_request(request);
        }
    }

    fn on_item(&self, item: Value) {
        let encoded_len = serde_json::to_string(&item).map(|s| s.len()).unwrap_or(0);
        self.stats.inc_value(ITEM_SCRAPED_COUNT, 1);
        self.stats.inc_value(DATABASE_SIZE_JSON, encoded_len as u64);

        let job = &self.config.job;
        self.publisher
            .publish_item(job.item_target(), item, job.unique.clone());
    }

    fn on_request_complete(&self, request: &CrawlRequest, response: &CrawlResponse) {
        let tally = response.byte_tally();
        self.stats.inc_value(RESPONSE_COUNT, 1);
        self.stats.inc_value(RESPONSE_BYTES, tally);
        self.stats.inc_value(
            &format!("{}{}", RESPONSE_STATUS_COUNT_PREFIX, response.status),
            1,
        );
        if let Some(proxy) = &self.proxy {
            proxy.process_response(request, response);
        }

        let duration_ms = request
            .meta
            .download_latency
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let payload = json!({
            "url": response.url,
            "status": response.status,
            "method": request.method,
            "duration": duration_ms,
            "time": format_time(&Utc::now()),
            "response_size": response.body.len(),
            "fingerprint": request.fingerprint(),
        });
        self.publisher.publish_request(&self.config.job.key, payload);
    }

    async fn on_close(&self, reason: &str) {
        self.stats
            .set_value(FINISH_REASON, StatValue::Text(reason.to_string()));
        self.stats.set_value(FINISH_TIME, StatValue::Time(Utc::now()));

        self.scheduler.stop().await;
        self.status.close(reason).await;
    }
}
