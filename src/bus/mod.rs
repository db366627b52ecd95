use crate::error::Result;
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod jsonl;
pub mod memory;

pub use jsonl::JsonlBus;
pub use memory::MemoryBus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    #[serde(rename = "job_items")]
    Items,
    #[serde(rename = "job_requests")]
    Requests,
    #[serde(rename = "job_stats")]
    Stats,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Items => "job_items",
            Topic::Requests => "job_requests",
            Topic::Stats => "job_stats",
        }
    }
}

/// One record destined for the message bus.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub topic: Topic,
    pub job_id: String,
    pub payload: Value,
    pub unique: Option<String>,
}

impl Event {
    pub fn new(topic: Topic, job_id: impl Into<String>, payload: Value) -> Self {
        Self {
            topic,
            job_id: job_id.into(),
            payload,
            unique: None,
        }
    }

    pub fn with_unique(mut self, unique: Option<String>) -> Self {
        self.unique = unique;
        self
    }

    /// The value as it travels on the bus.
    pub fn value(&self) -> Value {
        let mut value = Map::new();
        value.insert("jid".to_string(), Value::String(self.job_id.clone()));
        value.insert("payload".to_string(), self.payload.clone());
        if self.topic == Topic::Items {
            let unique = self.unique.clone().map(Value::String).unwrap_or(Value::Null);
            value.insert("unique".to_string(), unique);
        }
        Value::Object(value)
    }
}

/// Asynchronous producer for a topic-based message bus.
///
/// `send` enqueues the event before returning; the returned future
/// resolves once the bus has acknowledged or definitively failed it.
#[async_trait]
pub trait MessageBus: Send + Sync {
    fn send(&self, event: &Event) -> BoxFuture<'static, Result<()>>;

    /// Waits until everything enqueued so far has left the producer.
    async fn flush(&self) -> Result<()>;
}
