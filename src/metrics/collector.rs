use crate::metrics::snapshot::{
    DATABASE_SIZE_JSON, ELAPSED_TIME_SECONDS, START_TIME, StatValue, StatsSnapshot,
};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Live counter set for one job.
///
/// Every mutation and every snapshot goes through a single lock, so
/// increments from concurrent hooks are never lost and a snapshot is a
/// consistent copy of all counters at one instant.
#[derive(Debug, Default)]
pub struct StatsCollector {
    values: Mutex<HashMap<String, StatValue>>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> MutexGuard<'_, HashMap<String, StatValue>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks the beginning of the job.
    pub fn start(&self, now: DateTime<Utc>) {
        self.set_value(START_TIME, StatValue::Time(now));
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        match self.values().get(START_TIME) {
            Some(StatValue::Time(t)) => Some(*t),
            _ => None,
        }
    }

    pub fn inc_value(&self, key: &str, by: u64) {
        let mut values = self.values();
        match values.get_mut(key) {
            Some(StatValue::Count(n)) => *n = n.saturating_add(by),
            Some(other) => {
                log::warn!("Counter {} held a non-numeric value {:?}, resetting", key, other);
                *other = StatValue::Count(by);
            }
            None => {
                values.insert(key.to_string(), StatValue::Count(by));
            }
        }
    }

    pub fn set_value(&self, key: &str, value: StatValue) {
        self.values().insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<StatValue> {
        self.values().get(key).cloned()
    }

    pub fn get_count(&self, key: &str) -> u64 {
        self.values()
            .get(key)
            .and_then(StatValue::as_count)
            .unwrap_or(0)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        self.snapshot_at(Utc::now())
    }

    /// Copies the live counters and adds the derived fields. The live set
    /// itself is left untouched.
    pub fn snapshot_at(&self, now: DateTime<Utc>) -> StatsSnapshot {
        let mut copy: BTreeMap<String, StatValue> = self
            .values()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let elapsed = match copy.get(START_TIME) {
            Some(StatValue::Time(start)) => Some((now - *start).num_seconds().max(0) as u64),
            _ => None,
        };
        if let Some(elapsed) = elapsed {
            copy.insert(ELAPSED_TIME_SECONDS.to_string(), StatValue::Count(elapsed));
        }
        copy.entry(DATABASE_SIZE_JSON.to_string())
            .or_insert(StatValue::Count(0));

        StatsSnapshot::new(copy)
    }
}
