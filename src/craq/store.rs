//! Versioned key-value store backing the CRAQ replica.
//!
//! Each key maps to an ascending-by-version sequence of entries, each either
//! `Clean` (committed at the tail) or `Dirty` (written but not yet
//! acknowledged back down the chain). At most one entry per key is clean,
//! and every dirty entry for a key outranks the clean one, if any.

use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Clean,
    Dirty,
}

#[derive(Debug, Clone)]
struct Entry {
    version: u64,
    value: String,
    state: State,
}

/// What a local read of a key resolves to without going over the network.
pub enum ReadOutcome {
    /// No entry exists for the key at all.
    Absent,
    /// A clean entry exists; this is the value to return.
    Clean(String),
    /// Only dirty entries exist; the caller must query the tail's clean
    /// version and resolve it with [`VersionedStore::value_at_or_below`].
    NeedsVersionQuery,
}

pub struct VersionedStore {
    data: Mutex<HashMap<String, Vec<Entry>>>,
}

impl Default for VersionedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionedStore {
    pub fn new() -> Self {
        VersionedStore {
            data: Mutex::new(HashMap::new()),
        }
    }

    /// The highest version seen for `key`, or 0 if none. The head uses
    /// `1 + max_version(key)` to assign the next write's version.
    pub fn max_version(&self, key: &str) -> u64 {
        self.data
            .lock()
            .unwrap()
            .get(key)
            .and_then(|entries| entries.last())
            .map(|e| e.version)
            .unwrap_or(0)
    }

    /// Append a new dirty entry. Used at the head (after assigning a fresh
    /// version) and at intermediate replicas (for a version forwarded from
    /// upstream), before forwarding to `next`.
    pub fn append_dirty(&self, key: &str, version: u64, value: String) {
        self.data
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .push(Entry {
                version,
                value,
                state: State::Dirty,
            });
    }

    /// Append a new entry directly as clean and evict anything older. Used
    /// only at the tail, where a write commits the instant it is applied.
    pub fn append_clean(&self, key: &str, version: u64, value: String) {
        let mut data = self.data.lock().unwrap();
        let entries = data.entry(key.to_string()).or_default();
        entries.push(Entry {
            version,
            value,
            state: State::Clean,
        });
        entries.retain(|e| e.version >= version);
    }

    /// Mark the entry at `version` clean and drop every strictly
    /// lower-versioned entry for `key`. Called at the head and at
    /// intermediate replicas once the downstream acknowledgement for that
    /// version has returned.
    pub fn mark_clean_and_evict(&self, key: &str, version: u64) {
        let mut data = self.data.lock().unwrap();
        if let Some(entries) = data.get_mut(key) {
            for e in entries.iter_mut() {
                if e.version == version {
                    e.state = State::Clean;
                }
            }
            entries.retain(|e| e.version >= version);
        }
    }

    /// Resolve a `GET` without contacting the tail, if possible.
    ///
    /// A dirty entry forces a version query even when an older clean entry is
    /// also present for the key: the tail may have already committed that
    /// dirty version clean by the time this replica is read, well before the
    /// fold-back acknowledgement reaches here, so returning the stale clean
    /// value directly would let a read go back in time relative to the tail.
    pub fn read(&self, key: &str) -> ReadOutcome {
        let data = self.data.lock().unwrap();
        let Some(entries) = data.get(key) else {
            return ReadOutcome::Absent;
        };
        if entries.is_empty() {
            return ReadOutcome::Absent;
        }
        if entries.iter().any(|e| e.state == State::Dirty) {
            return ReadOutcome::NeedsVersionQuery;
        }
        match entries.iter().find(|e| e.state == State::Clean) {
            Some(clean) => ReadOutcome::Clean(clean.value.clone()),
            None => ReadOutcome::NeedsVersionQuery,
        }
    }

    /// The tail's notion of "the version that is clean for this key" (what a
    /// `VERSION` query answers). `None` if the key has never been written.
    pub fn clean_version(&self, key: &str) -> Option<u64> {
        let data = self.data.lock().unwrap();
        data.get(key)?
            .iter()
            .find(|e| e.state == State::Clean)
            .map(|e| e.version)
    }

    /// Resolve a dirty read once the tail has reported `target_version` as
    /// clean: return that version's value if still present locally, else
    /// fall back to the lowest-versioned entry still present (by invariant,
    /// clean or about to become clean with the same value).
    pub fn value_at_or_lowest(&self, key: &str, target_version: u64) -> Option<String> {
        let data = self.data.lock().unwrap();
        let entries = data.get(key)?;
        entries
            .iter()
            .find(|e| e.version == target_version)
            .or_else(|| entries.first())
            .map(|e| e.value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_on_unset_key_is_absent() {
        let store = VersionedStore::new();
        assert!(matches!(store.read("k"), ReadOutcome::Absent));
    }

    #[test]
    fn single_clean_entry_reads_directly() {
        let store = VersionedStore::new();
        store.append_clean("k", 1, "a".into());
        match store.read("k") {
            ReadOutcome::Clean(v) => assert_eq!(v, "a"),
            _ => panic!("expected clean"),
        }
    }

    #[test]
    fn all_dirty_needs_version_query() {
        let store = VersionedStore::new();
        store.append_dirty("k", 1, "a".into());
        assert!(matches!(store.read("k"), ReadOutcome::NeedsVersionQuery));
    }

    #[test]
    fn newer_dirty_entry_forces_version_query_despite_older_clean_entry() {
        // Mid-propagation shape: the fold-back ack for v2 hasn't reached this
        // replica yet, but the tail may already have committed it clean.
        // Returning "a" directly here would be a stale, back-in-time read.
        let store = VersionedStore::new();
        store.append_clean("k", 1, "a".into());
        store.append_dirty("k", 2, "b".into());
        assert!(matches!(store.read("k"), ReadOutcome::NeedsVersionQuery));
    }

    #[test]
    fn marking_clean_evicts_older_versions() {
        let store = VersionedStore::new();
        store.append_dirty("k", 1, "a".into());
        store.append_dirty("k", 2, "b".into());
        store.mark_clean_and_evict("k", 1);
        // version 1 is now clean and version 2 (>= 1) survives, still dirty.
        match store.read("k") {
            ReadOutcome::Clean(v) => assert_eq!(v, "a"),
            _ => panic!("expected clean"),
        }
        store.mark_clean_and_evict("k", 2);
        match store.read("k") {
            ReadOutcome::Clean(v) => assert_eq!(v, "b"),
            _ => panic!("expected clean"),
        }
    }

    #[test]
    fn version_query_resolves_to_tails_clean_version() {
        let store = VersionedStore::new();
        store.append_dirty("k", 1, "a".into());
        store.append_dirty("k", 2, "b".into());
        assert_eq!(store.value_at_or_lowest("k", 1), Some("a".into()));
    }

    #[test]
    fn version_query_falls_back_to_lowest_present_after_eviction_race() {
        let store = VersionedStore::new();
        store.append_dirty("k", 5, "x".into());
        // version 3 (what a racing VERSION reply names) has already been
        // evicted locally; the lowest entry still present is the answer.
        assert_eq!(store.value_at_or_lowest("k", 3), Some("x".into()));
    }

    #[test]
    fn max_version_defaults_to_zero() {
        let store = VersionedStore::new();
        assert_eq!(store.max_version("k"), 0);
        store.append_dirty("k", 1, "a".into());
        assert_eq!(store.max_version("k"), 1);
    }
}
