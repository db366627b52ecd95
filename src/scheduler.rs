use crate::error::{Error, Result};
use crate::metrics::StatsCollector;
use crate::store::CounterStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

struct Inner {
    state: SchedulerState,
    stop_tx: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

/// Mirrors the live counters into the shared store on a fixed period.
pub struct StatsScheduler {
    stats: Arc<StatsCollector>,
    store: Arc<dyn CounterStore>,
    key: String,
    inner: Mutex<Inner>,
}

impl StatsScheduler {
    pub fn new(stats: Arc<StatsCollector>, store: Arc<dyn CounterStore>, key: String) -> Self {
        Self {
            stats,
            store,
            key,
            inner: Mutex::new(Inner {
                state: SchedulerState::Idle,
                stop_tx: None,
                task: None,
            }),
        }
    }

    pub async fn state(&self) -> SchedulerState {
        self.inner.lock().await.state
    }

    /// Starts ticking every `interval_secs`; the first snapshot is written
    /// right away.
    pub async fn start(&self, interval_secs: f64) -> Result<()> {
        if !interval_secs.is_finite() || interval_secs <= 0.0 {
            return Err(Error::Config(format!(
                "snapshot interval must be positive, got {}",
                interval_secs
            )));
        }
        let period = Duration::try_from_secs_f64(interval_secs)
            .map_err(|e| Error::Config(format!("snapshot interval {}: {}", interval_secs, e)))?;

        let mut inner = self.inner.lock().await;
        if inner.state != SchedulerState::Idle {
            return Err(Error::InvalidState(format!(
                "snapshot scheduler cannot start from {:?}",
                inner.state
            )));
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(run_snapshots(
            self.stats.clone(),
            self.store.clone(),
            self.key.clone(),
            period,
            stop_rx,
        ));

        inner.state = SchedulerState::Running;
        inner.stop_tx = Some(stop_tx);
        inner.task = Some(task);
        log::info!("Writing stats to {} every {:.1}s", self.key, interval_secs);
        Ok(())
    }

    /// Cancels the timer and removes the shared key. Calling it again is a no-op.
    pub async fn stop(&self) {
        let mut inner = self.inner.lock().await;
        match inner.state {
            SchedulerState::Stopped => return,
            SchedulerState::Idle => {
                inner.state = SchedulerState::Stopped;
                return;
            }
            SchedulerState::Running => inner.state = SchedulerState::Stopped,
        }

        if let Some(stop_tx) = inner.stop_tx.take() {
            let _ = stop_tx.send(true);
        }
        if let Some(task) = inner.task.take() {
            if let Err(e) = task.await {
                log::error!("Snapshot task ended abnormally: {}", e);
            }
        }

        if let Err(e) = self.store.delete(&self.key).await {
            log::warn!("Could not delete stats key {}: {}", self.key, e);
        }
        log::debug!("Snapshot scheduler stopped");
    }
}

async fn run_snapshots(
    stats: Arc<StatsCollector>,
    store: Arc<dyn CounterStore>,
    key: String,
    period: Duration,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = stop_rx.changed() => break,
            _ = ticker.tick() => {
                if *stop_rx.borrow() {
                    break;
                }
                store_stats(&stats, store.as_ref(), &key).await;
            }
        }
    }
}

async fn store_stats(stats: &StatsCollector, store: &dyn CounterStore, key: &str) {
    let snapshot = stats.snapshot();
    if let Err(e) = store.write(key, &snapshot.to_json()).await {
        log::warn!("Skipping stats snapshot for {}: {}", key, e);
    }
}
