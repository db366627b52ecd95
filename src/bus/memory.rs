use super::{Event, MessageBus, Topic};
use crate::error::{Error, Result};
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug, Default)]
struct Recorded {
    sent: Vec<Event>,
    delivered: Vec<Event>,
}

/// In-process bus that records what it is given. Acknowledgements can be
/// delayed and topics can be made to fail, which makes it the test double
/// for the publisher and the hooks.
#[derive(Debug, Default)]
pub struct MemoryBus {
    recorded: Arc<Mutex<Recorded>>,
    failing: HashSet<Topic>,
    ack_delay: Option<Duration>,
    flushes: AtomicUsize,
}

fn lock(recorded: &Mutex<Recorded>) -> MutexGuard<'_, Recorded> {
    recorded.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ack_delay(mut self, delay: Duration) -> Self {
        self.ack_delay = Some(delay);
        self
    }

    pub fn failing_topic(mut self, topic: Topic) -> Self {
        self.failing.insert(topic);
        self
    }

    /// Every event handed to `send`, in order.
    pub fn sent(&self) -> Vec<Event> {
        lock(&self.recorded).sent.clone()
    }

    /// Events whose acknowledgement completed successfully.
    pub fn delivered(&self) -> Vec<Event> {
        lock(&self.recorded).delivered.clone()
    }

    pub fn sent_to(&self, topic: Topic) -> Vec<Event> {
        self.sent().into_iter().filter(|e| e.topic == topic).collect()
    }

    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageBus for MemoryBus {
    fn send(&self, event: &Event) -> BoxFuture<'static, Result<()>> {
        lock(&self.recorded).sent.push(event.clone());

        let recorded = self.recorded.clone();
        let fail = self.failing.contains(&event.topic);
        let delay = self.ack_delay;
        let event = event.clone();

        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if fail {
                return Err(Error::Bus(format!("{} rejected", event.topic.as_str())));
            }
            lock(&recorded).delivered.push(event);
            Ok(())
        }
        .boxed()
    }

    async fn flush(&self) -> Result<()> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
