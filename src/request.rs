use crate::accounting::{Headers, response_byte_tally};
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Per-request metadata the engine carries alongside a request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestMeta {
    /// Opts this request out of proxy routing.
    pub proxies_disabled: bool,
    pub proxy: Option<String>,
    pub download_latency: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrawlRequest {
    pub url: String,
    pub method: String,
    pub body: Vec<u8>,
    pub meta: RequestMeta,
}

impl CrawlRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: "GET".to_string(),
            body: Vec::new(),
            meta: RequestMeta::default(),
        }
    }

    pub fn without_proxy(mut self) -> Self {
        self.meta.proxies_disabled = true;
        self
    }

    /// Stable hex digest identifying the request.
    pub fn fingerprint(&self) -> String {
        let url = url::Url::parse(&self.url)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| self.url.clone());

        let mut hasher = Sha256::new();
        hasher.update(self.method.to_ascii_uppercase().as_bytes());
        hasher.update(url.as_bytes());
        hasher.update(&self.body);
        format!("{:x}", hasher.finalize())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrawlResponse {
    pub url: String,
    pub status: u16,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl CrawlResponse {
    pub fn new(url: impl Into<String>, status: u16, headers: Headers, body: Vec<u8>) -> Self {
        Self {
            url: url.into(),
            status,
            headers,
            body,
        }
    }

    pub fn byte_tally(&self) -> u64 {
        response_byte_tally(&self.body, &self.headers, self.status)
    }
}
