use crate::config::ProxyConfig;
use crate::metrics::snapshot::{PROXY_COUNT, PROXY_NAME, PROXY_RESPONSE_BYTES};
use crate::metrics::{StatValue, StatsCollector};
use crate::request::{CrawlRequest, CrawlResponse};
use std::sync::Arc;

/// Routes requests through the proxy pool and counts the bytes that came
/// back through it.
pub struct ProxyUsageTracker {
    endpoint: String,
    stats: Arc<StatsCollector>,
}

impl ProxyUsageTracker {
    /// Returns `None` when proxy routing is disabled for the job.
    pub fn from_config(config: &ProxyConfig, stats: Arc<StatsCollector>) -> Option<Self> {
        if !config.enabled {
            return None;
        }

        if let Some(name) = &config.name {
            stats.set_value(PROXY_NAME, StatValue::Text(name.clone()));
        }

        Some(Self {
            endpoint: config.endpoint(),
            stats,
        })
    }

    pub fn process_request(&self, request: &mut CrawlRequest) {
        if request.meta.proxies_disabled {
            return;
        }
        log::debug!("Using proxies with request {}", request.url);
        request.meta.proxy = Some(self.endpoint.clone());
        self.stats.inc_value(PROXY_COUNT, 1);
    }

    pub fn process_response(&self, request: &CrawlRequest, response: &CrawlResponse) {
        if request.meta.proxies_disabled {
            return;
        }
        self.stats.inc_value(PROXY_RESPONSE_BYTES, response.byte_tally());
    }
}
