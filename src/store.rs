//! Key-value store backing the CR replica.
//!
//! A thread-safe `key -> value` map with interior mutability. Absent keys are
//! not an error at this layer — `get` returns `None` and callers apply the
//! harness convention that an unset key reads as `"0"`.

use std::collections::HashMap;
use std::sync::Mutex;

pub const DEFAULT_VALUE: &str = "0";

pub struct KVStore {
    data: Mutex<HashMap<String, String>>,
}

impl Default for KVStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KVStore {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
        }
    }

    /// Retrieve a value, or `DEFAULT_VALUE` if the key has never been set.
    pub fn get_or_default(&self, key: &str) -> String {
        self.data
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .unwrap_or_else(|| DEFAULT_VALUE.to_string())
    }

    pub fn put(&self, key: String, value: String) {
        self.data.lock().unwrap().insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_key_reads_as_default() {
        let store = KVStore::new();
        assert_eq!(store.get_or_default("missing"), "0");
    }

    #[test]
    fn put_then_get_round_trips() {
        let store = KVStore::new();
        store.put("k".into(), "v".into());
        assert_eq!(store.get_or_default("k"), "v");
    }

    #[test]
    fn put_overwrites_previous_value() {
        let store = KVStore::new();
        store.put("k".into(), "v1".into());
        store.put("k".into(), "v2".into());
        assert_eq!(store.get_or_default("k"), "v2");
    }
}
