//! Per-key change flags accumulated between renders.

use std::collections::BTreeMap;

/// Change flags keyed by record id (collections) or field name (models).
///
/// `true` means the change came from a peer, `false` that it was local. Once a
/// key is recorded as local it stays local until the batch is taken.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeBatch {
    changes: BTreeMap<String, bool>,
}

impl ChangeBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a change. A local flag is never overwritten by a remote one.
    pub fn record(&mut self, key: impl Into<String>, is_remote: bool) {
        let key = key.into();
        if self.changes.get(&key) != Some(&false) {
            self.changes.insert(key, is_remote);
        }
    }

    /// The flag for `key`, if it changed.
    pub fn get(&self, key: &str) -> Option<bool> {
        self.changes.get(key).copied()
    }

    /// Whether `key` changed remotely.
    pub fn is_remote(&self, key: &str) -> bool {
        self.get(key) == Some(true)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.changes.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Iterate `(key, is_remote)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.changes.iter().map(|(key, remote)| (key.as_str(), *remote))
    }

    /// Move the accumulated flags out, leaving this batch empty.
    pub fn take(&mut self) -> ChangeBatch {
        std::mem::take(self)
    }
}

impl<K: Into<String>> FromIterator<(K, bool)> for ChangeBatch {
    fn from_iter<I: IntoIterator<Item = (K, bool)>>(iter: I) -> Self {
        let mut batch = ChangeBatch::new();
        for (key, is_remote) in iter {
            batch.record(key, is_remote);
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_then_remote_stays_local() {
        let mut batch = ChangeBatch::new();
        batch.record("k", false);
        batch.record("k", true);
        assert_eq!(batch.get("k"), Some(false));
    }

    #[test]
    fn remote_then_local_becomes_local() {
        let mut batch = ChangeBatch::new();
        batch.record("k", true);
        assert!(batch.is_remote("k"));
        batch.record("k", false);
        assert_eq!(batch.get("k"), Some(false));
    }

    #[test]
    fn take_clears() {
        let mut batch: ChangeBatch = [("a", true), ("b", false)].into_iter().collect();
        let taken = batch.take();
        assert_eq!(taken.len(), 2);
        assert!(batch.is_empty());
        assert_eq!(
            taken.iter().collect::<Vec<_>>(),
            vec![("a", true), ("b", false)]
        );
    }

    #[test]
    fn keys_are_independent() {
        let mut batch = ChangeBatch::new();
        batch.record("a", false);
        batch.record("b", true);
        assert!(!batch.is_remote("a"));
        assert!(batch.is_remote("b"));
        assert!(batch.contains("a"));
        assert!(!batch.contains("c"));
        assert_eq!(batch.get("c"), None);
    }
}
