use crate::config::schema::TelemetryConfig;
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use validator::Validate;

/// Environment variables read by [`ConfigLoader::from_env`], with the
/// config path each one lands on.
const ENV_KEYS: &[(&str, &str)] = &[
    ("ESTELA_SPIDER_JOB", "job.key"),
    ("ESTELA_API_HOST", "job.api_host"),
    ("ESTELA_AUTH_TOKEN", "job.auth_token"),
    ("ESTELA_COLLECTION", "job.collection"),
    ("ESTELA_UNIQUE_COLLECTION", "job.unique"),
    ("REDIS_URL", "stats.store_url"),
    ("REDIS_STATS_KEY", "stats.key"),
    ("REDIS_STATS_INTERVAL", "stats.interval_secs"),
    ("ESTELA_PROXY_USER", "proxy.user"),
    ("ESTELA_PROXY_PASS", "proxy.pass"),
    ("ESTELA_PROXY_URL", "proxy.host"),
    ("ESTELA_PROXY_PORT", "proxy.port"),
    ("ESTELA_PROXY_NAME", "proxy.name"),
];

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<TelemetryConfig> {
        let config = Self::load_file(path.as_ref())?;
        Self::validate(config)
    }

    pub fn from_env() -> Result<TelemetryConfig> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source, so tests can inject fixtures.
    pub fn from_lookup<F>(lookup: F) -> Result<TelemetryConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = ::config::Config::builder();
        for &(var, path) in ENV_KEYS {
            builder = builder.set_override_option(path, lookup(var))?;
        }

        let proxies_enabled = lookup("ESTELA_PROXIES_ENABLED")
            .map(|v| !v.is_empty())
            .unwrap_or(false);
        builder = builder.set_override("proxy.enabled", proxies_enabled)?;

        let config: TelemetryConfig = builder.build()?.try_deserialize()?;
        Self::validate(config)
    }

    fn validate(config: TelemetryConfig) -> Result<TelemetryConfig> {
        config.validate().map_err(Error::Validation)?;
        config.check()?;
        Ok(config)
    }

    fn load_file(path: &Path) -> Result<TelemetryConfig> {
        let format = ConfigFormat::from_path(path).ok_or_else(|| {
            Error::Config(format!("Unsupported file extension: {}", path.display()))
        })?;
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

        format
            .parse(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }
}

/// Serialization formats a job settings file may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(ConfigFormat::Json),
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "toml" => Some(ConfigFormat::Toml),
            _ => None,
        }
    }

    pub fn parse(self, content: &str) -> Result<TelemetryConfig> {
        let config = match self {
            ConfigFormat::Json => serde_json::from_str(content)?,
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Toml => toml::from_str(content)?,
        };
        Ok(config)
    }
}
