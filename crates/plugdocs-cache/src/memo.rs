//! Compute-once memoization.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

/// Map from key to a shared, computed-once value.
///
/// [`Memo::get_or_compute`] runs the producer only when the key is missing.
/// Later calls return the same [`Arc`], so callers can compare results by
/// pointer. Entries live until [`Memo::clear`].
///
/// The producer runs outside the lock. If two callers miss the same key at the
/// same time both compute, and the first insert is kept for everyone.
#[derive(Debug)]
pub struct Memo<K, V> {
    entries: RwLock<HashMap<K, Arc<V>>>,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash, V> Memo<K, V> {
    /// Create an empty memo.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the stored value for `key`, computing it with `producer` on a miss.
    pub fn get_or_compute<F>(&self, key: K, producer: F) -> Arc<V>
    where
        F: FnOnce() -> V,
    {
        if let Some(value) = self.entries.read().unwrap().get(&key) {
            return Arc::clone(value);
        }

        let computed = Arc::new(producer());
        let mut entries = self.entries.write().unwrap();
        Arc::clone(entries.entry(key).or_insert(computed))
    }

    /// Whether a value is stored for `key`.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.read().unwrap().contains_key(key)
    }

    /// Number of memoized values.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    /// Whether nothing has been memoized.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every memoized value.
    pub fn clear(&self) {
        self.entries.write().unwrap().clear();
    }
}
