use super::cache_set::CacheSet;

use std::{collections::HashMap, sync::Arc};

/// The complete mapping of cache keys to reference sets at one point in time.
///
/// A published snapshot is never modified. Writers derive a new snapshot with
/// `with_set` or `without_key`; both copy the key map but share the sets.
#[derive(Clone, Debug, Default)]
pub(crate) struct Snapshot {
    sets: HashMap<Arc<str>, CacheSet>,
}

impl Snapshot {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            sets: HashMap::with_capacity(capacity),
        }
    }

    pub(crate) fn get(&self, key: &str) -> Option<&CacheSet> {
        self.sets.get(key)
    }

    pub(crate) fn contains_key(&self, key: &str) -> bool {
        self.sets.contains_key(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.sets.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = &str> {
        self.sets.keys().map(|key| &**key)
    }

    /// Returns a copy of this snapshot with `key` mapped to `set`.
    pub(crate) fn with_set(&self, key: &str, set: CacheSet) -> Self {
        let mut sets = self.sets.clone();
        // Reuse the existing key allocation when overwriting.
        let key = match self.sets.get_key_value(key) {
            Some((existing, _)) => Arc::clone(existing),
            None => Arc::from(key),
        };
        sets.insert(key, set);
        Self { sets }
    }

    /// Returns a copy of this snapshot without `key`, or `None` if the key is
    /// not present.
    pub(crate) fn without_key(&self, key: &str) -> Option<Self> {
        if !self.sets.contains_key(key) {
            return None;
        }
        let mut sets = self.sets.clone();
        sets.remove(key);
        Some(Self { sets })
    }
}
