//! Rolling observation buffer
//!
//! All devices share one append-only buffer held under a single cache key;
//! filtering by device happens at read time. The backing cache serializes
//! individual get/set calls but not the read-modify-write append, so appends
//! go through a single-writer lock to keep concurrent ingestion sources from
//! losing each other's batches.
//!
//! Entries are stored as raw JSON values. Ones that no longer parse into an
//! [`Observation`] are skipped on read and dropped at the next trim; a
//! missing buffer is a valid state, never an error.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use serde_json::Value;

use super::Observation;
use crate::cache::Cache;

pub struct ObservationStore {
    cache: Arc<dyn Cache>,
    key: String,
    retention: Duration,
    append_lock: Mutex<()>,
}

impl ObservationStore {
    pub fn new(cache: Arc<dyn Cache>, key: impl Into<String>, retention: Duration) -> Self {
        ObservationStore {
            cache,
            key: key.into(),
            retention,
            append_lock: Mutex::new(()),
        }
    }

    /// Append a batch to the shared buffer, dropping entries that have aged
    /// out of the retention window. Returns how many readings were stored.
    pub fn append(&self, batch: Vec<Observation>, now: DateTime<Utc>) -> usize {
        let _guard = self.append_lock.lock().unwrap();

        let mut buffer = self.stored_entries();
        let mut appended = 0;
        for observation in batch {
            match serde_json::to_value(&observation) {
                Ok(entry) => {
                    buffer.push(entry);
                    appended += 1;
                }
                Err(e) => {
                    warn!(
                        "Dropping unserializable observation from {}: {}",
                        observation.device_id, e
                    );
                }
            }
        }

        let cutoff = now - self.retention;
        let before = buffer.len();
        buffer.retain(|entry| entry_taken_at(entry).map_or(false, |taken_at| taken_at > cutoff));
        if buffer.len() < before {
            debug!("Trimmed {} expired buffer entries", before - buffer.len());
        }

        self.cache.set(&self.key, Value::Array(buffer));
        appended
    }

    /// Current buffer contents in append order. A buffer that does not exist
    /// yet is initialized empty as a side effect of the first read.
    pub fn read(&self) -> Vec<Observation> {
        let entries = match self.cache.get(&self.key) {
            Some(Value::Array(entries)) => entries,
            Some(_) => {
                warn!("Observation buffer under key '{}' is not an array, resetting", self.key);
                self.cache.set(&self.key, Value::Array(Vec::new()));
                Vec::new()
            }
            None => {
                self.cache.set(&self.key, Value::Array(Vec::new()));
                Vec::new()
            }
        };

        entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<Observation>(entry) {
                Ok(observation) => Some(observation),
                Err(e) => {
                    warn!("Skipping malformed stored observation: {}", e);
                    None
                }
            })
            .collect()
    }

    fn stored_entries(&self) -> Vec<Value> {
        match self.cache.get(&self.key) {
            Some(Value::Array(entries)) => entries,
            _ => Vec::new(),
        }
    }
}

fn entry_taken_at(entry: &Value) -> Option<DateTime<Utc>> {
    entry.get("taken_at")?.as_str()?.parse::<DateTime<Utc>>().ok()
}
