use super::{Event, MessageBus};
use crate::error::{Error, Result};
use async_trait::async_trait;
use futures::future::{self, BoxFuture, FutureExt};
use serde_json::json;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Mutex;

/// Appends every event as one JSON line to a local file. Useful when a job
/// runs without a broker.
pub struct JsonlBus {
    file: Mutex<BufWriter<File>>,
}

impl JsonlBus {
    pub fn new(path: PathBuf) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            file: Mutex::new(BufWriter::new(file)),
        })
    }

    fn append(&self, event: &Event) -> Result<()> {
        let line = json!({ "topic": event.topic.as_str(), "value": event.value() });
        let mut file = self
            .file
            .lock()
            .map_err(|_| Error::Bus("jsonl writer poisoned".to_string()))?;
        serde_json::to_writer(&mut *file, &line)?;
        writeln!(file)?;
        Ok(())
    }
}

#[async_trait]
impl MessageBus for JsonlBus {
    fn send(&self, event: &Event) -> BoxFuture<'static, Result<()>> {
        future::ready(self.append(event)).boxed()
    }

    async fn flush(&self) -> Result<()> {
        let mut file = self
            .file
            .lock()
            .map_err(|_| Error::Bus("jsonl writer poisoned".to_string()))?;
        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Topic;
    use serde_json::Value;

    #[tokio::test]
    async fn writes_one_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let bus = JsonlBus::new(path.clone()).unwrap();

        bus.send(&Event::new(Topic::Requests, "1.2.3", json!({"url": "a"})))
            .await
            .unwrap();
        bus.send(&Event::new(Topic::Stats, "1.2.3", json!({})))
            .await
            .unwrap();
        bus.flush().await.unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        let lines: Vec<Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["topic"], "job_requests");
        assert_eq!(lines[0]["value"]["payload"]["url"], "a");
        assert_eq!(lines[1]["topic"], "job_stats");
    }
}
