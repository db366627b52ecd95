#![allow(dead_code)]

use async_trait::async_trait;
use crawl_telemetry::config::{JobConfig, ProxyConfig, StatsStoreConfig, TelemetryConfig};
use crawl_telemetry::job::{JobApi, JobUpdate};
use crawl_telemetry::{Error, Result};
use std::sync::Mutex;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn test_config(api_host: &str) -> TelemetryConfig {
    TelemetryConfig {
        job: JobConfig {
            key: "7.8.9".to_string(),
            api_host: api_host.to_string(),
            auth_token: "tok".to_string(),
            collection: Some("7-8-items".to_string()),
            unique: Some("False".to_string()),
        },
        stats: StatsStoreConfig {
            store_url: "memory:".to_string(),
            key: "scrapy_stats_7.8.9".to_string(),
            interval_secs: 60.0,
        },
        proxy: ProxyConfig {
            enabled: true,
            user: "alice".to_string(),
            pass: "s3cret".to_string(),
            host: "proxy.local".to_string(),
            port: "8000".to_string(),
            name: Some("residential".to_string()),
        },
    }
}

/// Job API double that keeps every update it receives.
#[derive(Default)]
pub struct RecordingApi {
    updates: Mutex<Vec<JobUpdate>>,
    pub fail: bool,
}

impl RecordingApi {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn updates(&self) -> Vec<JobUpdate> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobApi for RecordingApi {
    async fn update(&self, update: &JobUpdate) -> Result<()> {
        self.updates.lock().unwrap().push(update.clone());
        if self.fail {
            return Err(Error::Api("job api down".to_string()));
        }
        Ok(())
    }
}
