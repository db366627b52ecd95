use crate::bus::{Event, MessageBus, Topic};
use crate::error::{Error, Result};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::task::{JoinError, JoinSet};

/// Fire-and-forget publishing with a final flush.
///
/// `publish` enqueues on the bus and returns at once; a continuation
/// spawned on the runtime captured at construction waits for the
/// acknowledgement and only logs failures. Finished continuations are
/// reaped on every publish. `flush` waits for every continuation spawned
/// before it was called.
pub struct EventPublisher {
    bus: Arc<dyn MessageBus>,
    runtime: Handle,
    in_flight: Mutex<JoinSet<()>>,
    failed: Arc<AtomicU64>,
}

fn log_abnormal_end(res: std::result::Result<(), JoinError>) {
    if let Err(e) = res {
        log::error!("Event delivery task ended abnormally: {}", e);
    }
}

impl EventPublisher {
    /// Fails when called outside a tokio runtime, since acknowledgements
    /// are awaited on that runtime.
    pub fn new(bus: Arc<dyn MessageBus>) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| Error::Config(format!("event publisher needs a tokio runtime: {}", e)))?;

        Ok(Self {
            bus,
            runtime,
            in_flight: Mutex::new(JoinSet::new()),
            failed: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Safe to call from any thread, with or without a runtime.
    pub fn publish(&self, event: Event) {
        let ack = self.bus.send(&event);
        let failed = self.failed.clone();
        let topic = event.topic;

        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while let Some(res) = in_flight.try_join_next() {
            log_abnormal_end(res);
        }
        in_flight.spawn_on(
            async move {
                if let Err(e) = ack.await {
                    failed.fetch_add(1, Ordering::SeqCst);
                    log::error!("Failed to deliver event to {}: {}", topic.as_str(), e);
                }
            },
            &self.runtime,
        );
    }

    pub fn publish_item(&self, target: &str, payload: Value, unique: Option<String>) {
        self.publish(Event::new(Topic::Items, target, payload).with_unique(unique));
    }

    pub fn publish_request(&self, job_id: &str, payload: Value) {
        self.publish(Event::new(Topic::Requests, job_id, payload));
    }

    pub fn publish_stats(&self, job_id: &str, payload: Value) {
        self.publish(Event::new(Topic::Stats, job_id, payload));
    }

    /// Blocks until all earlier sends are acknowledged or failed, then
    /// flushes the producer itself.
    pub async fn flush(&self) -> Result<()> {
        let mut pending = std::mem::take(
            &mut *self
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        log::debug!("Flushing {} pending events", pending.len());

        while let Some(res) = pending.join_next().await {
            log_abnormal_end(res);
        }

        self.bus.flush().await
    }

    /// Continuations spawned and not yet reaped.
    pub fn pending(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Number of sends that ended in a delivery error.
    pub fn failed_count(&self) -> u64 {
        self.failed.load(Ordering::SeqCst)
    }
}
