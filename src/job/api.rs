use crate::config::JobConfig;
use crate::error::{Error, Result};
use crate::job::status::JobUpdate;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Remote Job API, used only as a sink for status updates.
#[async_trait]
pub trait JobApi: Send + Sync {
    async fn update(&self, update: &JobUpdate) -> Result<()>;
}

pub struct HttpJobApi {
    client: Client,
    job_url: Url,
    auth_token: String,
}

impl HttpJobApi {
    pub fn new(config: &JobConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("crawl-telemetry/0.1")
            .build()?;

        Ok(Self {
            client,
            job_url: config.job_url()?,
            auth_token: config.auth_token.clone(),
        })
    }

    pub fn job_url(&self) -> &Url {
        &self.job_url
    }
}

#[async_trait]
impl JobApi for HttpJobApi {
    async fn update(&self, update: &JobUpdate) -> Result<()> {
        log::debug!("Updating job {} to {:?}", self.job_url, update.status);

        let res = self
            .client
            .patch(self.job_url.clone())
            .header("Authorization", format!("Token {}", self.auth_token))
            .json(update)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(Error::Api(format!("{} returned {}: {}", self.job_url, status, body)));
        }
        Ok(())
    }
}
