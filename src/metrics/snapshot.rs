use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const START_TIME: &str = "start_time";
pub const FINISH_TIME: &str = "finish_time";
pub const FINISH_REASON: &str = "finish_reason";
pub const ELAPSED_TIME_SECONDS: &str = "elapsed_time_seconds";
pub const ITEM_SCRAPED_COUNT: &str = "item_scraped_count";
pub const DATABASE_SIZE_JSON: &str = "database_size_json";
pub const REQUEST_COUNT: &str = "downloader/request_count";
pub const RESPONSE_COUNT: &str = "downloader/response_count";
pub const RESPONSE_BYTES: &str = "downloader/response_bytes";
pub const RESPONSE_STATUS_COUNT_PREFIX: &str = "downloader/response_status_count/";
pub const PROXY_NAME: &str = "downloader/proxy_name";
pub const PROXY_COUNT: &str = "downloader/proxies/count";
pub const PROXY_RESPONSE_BYTES: &str = "downloader/proxies/response_bytes";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq)]
pub enum StatValue {
    Count(u64),
    Time(DateTime<Utc>),
    Text(String),
}

impl StatValue {
    pub fn as_count(&self) -> Option<u64> {
        match self {
            StatValue::Count(n) => Some(*n),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            StatValue::Count(n) => Value::from(*n),
            StatValue::Time(t) => Value::String(format_time(t)),
            StatValue::Text(s) => Value::String(s.clone()),
        }
    }
}

impl Serialize for StatValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

pub fn format_time(t: &DateTime<Utc>) -> String {
    t.format(TIME_FORMAT).to_string()
}

/// Point-in-time copy of the job's counters, including derived fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StatsSnapshot {
    values: BTreeMap<String, StatValue>,
}

impl StatsSnapshot {
    pub(crate) fn new(values: BTreeMap<String, StatValue>) -> Self {
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&StatValue> {
        self.values.get(key)
    }

    /// Numeric counter value, 0 when missing.
    pub fn count(&self, key: &str) -> u64 {
        self.values
            .get(key)
            .and_then(StatValue::as_count)
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &StatValue)> {
        self.values.iter()
    }

    pub fn to_json(&self) -> Map<String, Value> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }
}
