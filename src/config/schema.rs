use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use url::Url;
use validator::Validate;

/// Everything the telemetry core needs, built once at process start.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TelemetryConfig {
    #[validate]
    pub job: JobConfig,

    #[validate]
    pub stats: StatsStoreConfig,

    #[serde(default)]
    pub proxy: ProxyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct JobConfig {
    /// Job key in the form `jid.sid.pid`
    #[validate(length(min = 1))]
    pub key: String,

    #[validate(url)]
    pub api_host: String,

    #[serde(default)]
    pub auth_token: String,

    /// Collection that item events are routed to
    #[serde(default)]
    pub collection: Option<String>,

    #[serde(default)]
    pub unique: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StatsStoreConfig {
    #[validate(length(min = 1))]
    pub store_url: String,

    #[validate(length(min = 1))]
    pub key: String,

    #[serde(default = "default_interval")]
    pub interval_secs: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub pass: String,

    #[serde(default)]
    pub host: String,

    #[serde(default)]
    pub port: String,

    #[serde(default)]
    pub name: Option<String>,
}

fn default_interval() -> f64 {
    30.0
}

impl TelemetryConfig {
    /// Checks the rules derive(Validate) cannot express.
    pub fn check(&self) -> Result<()> {
        self.job.ids()?;

        let interval = self.stats.interval_secs;
        if !interval.is_finite() || interval <= 0.0 {
            return Err(Error::Config(format!(
                "stats interval must be a positive number of seconds, got {}",
                interval
            )));
        }

        if self.proxy.enabled && (self.proxy.host.is_empty() || self.proxy.port.is_empty()) {
            return Err(Error::Config(
                "proxies are enabled but proxy host or port is missing".to_string(),
            ));
        }

        Ok(())
    }
}

impl JobConfig {
    /// Splits the job key into `(jid, sid, pid)`.
    pub fn ids(&self) -> Result<(&str, &str, &str)> {
        let mut parts = self.key.split('.');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(jid), Some(sid), Some(pid), None)
                if !jid.is_empty() && !sid.is_empty() && !pid.is_empty() =>
            {
                Ok((jid, sid, pid))
            }
            _ => Err(Error::Config(format!(
                "job key must look like jid.sid.pid, got {:?}",
                self.key
            ))),
        }
    }

    pub fn job_url(&self) -> Result<Url> {
        let (jid, sid, pid) = self.ids()?;
        let url = format!(
            "{}/api/projects/{}/spiders/{}/jobs/{}",
            self.api_host.trim_end_matches('/'),
            pid,
            sid,
            jid
        );
        Ok(Url::parse(&url)?)
    }

    /// Item events go to the collection when one is configured.
    pub fn item_target(&self) -> &str {
        self.collection.as_deref().unwrap_or(&self.key)
    }
}

impl ProxyConfig {
    pub fn endpoint(&self) -> String {
        format!(
            "http://{}:{}@{}:{}",
            self.user, self.pass, self.host, self.port
        )
    }
}
