//! Shared key-value cache abstraction
//!
//! The observation buffer lives behind this seam so the backing medium can
//! be swapped (in-process map, external cache) without touching the
//! pipeline. Individual `get`/`set` calls are serialized by the backend;
//! compound read-modify-write sequences are not, and callers that need them
//! must bring their own lock.

use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value;

pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: Value);
}

/// In-process cache backend.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        MemoryCache {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.read().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) {
        self.entries.write().unwrap().insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn get_returns_absent_for_unknown_key() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn set_then_get_round_trips() {
        let cache = MemoryCache::new();
        cache.set("key", json!([1, 2, 3]));
        assert_eq!(cache.get("key"), Some(json!([1, 2, 3])));
    }

    #[test]
    fn set_overwrites_existing_value() {
        let cache = MemoryCache::new();
        cache.set("key", json!("old"));
        cache.set("key", json!("new"));
        assert_eq!(cache.get("key"), Some(json!("new")));
    }
}
