// ─── Ordered Map ───
// Insertion-ordered key/value container backing every config section.

use std::collections::HashMap;

/// What `append` does when the key is already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Update the existing entry's value, keeping its position and index.
    #[default]
    Replace,
    /// Refuse the append and leave the map untouched.
    Reject,
    /// Store a second entry; lookups address the first occurrence.
    Allow,
}

/// A single stored entry. `index` is 1-based and assigned at append time;
/// it survives value updates and is never reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<V> {
    pub key: String,
    pub value: V,
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct OrderedMap<V> {
    entries: Vec<Entry<V>>,
    positions: HashMap<String, usize>,
    policy: DuplicatePolicy,
    next_index: usize,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self::with_policy(DuplicatePolicy::Replace)
    }
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
            policy,
            next_index: 1,
        }
    }

    /// Append `key` at the end. Returns `false` only when the policy is
    /// `Reject` and the key already exists.
    pub fn append(&mut self, key: impl Into<String>, value: V) -> bool {
        let key = key.into();
        if let Some(&position) = self.positions.get(&key) {
            match self.policy {
                DuplicatePolicy::Replace => {
                    self.entries[position].value = value;
                    return true;
                }
                DuplicatePolicy::Reject => return false,
                DuplicatePolicy::Allow => {}
            }
        }

        let position = self.entries.len();
        self.positions.entry(key.clone()).or_insert(position);
        self.entries.push(Entry {
            key,
            value,
            index: self.next_index,
        });
        self.next_index += 1;
        true
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.positions
            .get(key)
            .map(|&position| &self.entries[position].value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        match self.positions.get(key) {
            Some(&position) => Some(&mut self.entries[position].value),
            None => None,
        }
    }

    /// Value stored under `key`, appending `make()` first when absent.
    pub fn get_or_insert_with(&mut self, key: &str, make: impl FnOnce() -> V) -> &mut V {
        let position = match self.positions.get(key) {
            Some(&position) => position,
            None => {
                self.append(key, make());
                self.entries.len() - 1
            }
        };
        &mut self.entries[position].value
    }

    /// Update the value of an existing key without moving it.
    /// Returns `false` if the key is absent.
    pub fn set_in_place(&mut self, key: &str, value: V) -> bool {
        match self.get_mut(key) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Update in place when present, otherwise append.
    pub fn set(&mut self, key: &str, value: V) {
        if let Some(slot) = self.get_mut(key) {
            *slot = value;
            return;
        }
        self.append(key, value);
    }

    /// Remove the first entry stored under `key`.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let position = self.positions.remove(key)?;
        let removed = self.entries.remove(position);
        self.rebuild_positions();
        Some(removed.value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }

    /// Stable index assigned to `key` when it was first appended.
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.positions
            .get(key)
            .map(|&position| self.entries[position].index)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry<V>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.positions.clear();
        self.next_index = 1;
    }

    fn rebuild_positions(&mut self) {
        self.positions.clear();
        for (position, entry) in self.entries.iter().enumerate() {
            self.positions.entry(entry.key.clone()).or_insert(position);
        }
    }
}

impl OrderedMap<String> {
    /// Convenience accessor returning an owned string, empty when absent.
    pub fn value_or_empty(&self, key: &str) -> String {
        self.get(key).cloned().unwrap_or_default()
    }

    /// Build a map from `(key, value)` pairs, appended in order.
    pub fn from_pairs<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, String)>,
    {
        let mut map = Self::new();
        for (key, value) in pairs {
            map.append(key, value);
        }
        map
    }
}

impl<V: PartialEq> PartialEq for OrderedMap<V> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_follow_first_insertion_order() {
        let mut map = OrderedMap::new();
        map.append("zeta", 1);
        map.append("alpha", 2);
        map.append("mid", 3);
        map.append("zeta", 10);

        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);
        assert_eq!(map.get("zeta"), Some(&10));
        assert_eq!(map.index_of("zeta"), Some(1));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn reject_policy_refuses_existing_key() {
        let mut map = OrderedMap::with_policy(DuplicatePolicy::Reject);
        assert!(map.append("a", "1".to_string()));
        assert!(!map.append("a", "2".to_string()));
        assert_eq!(map.value_or_empty("a"), "1");
    }

    #[test]
    fn allow_policy_keeps_duplicates_and_reads_first() {
        let mut map = OrderedMap::with_policy(DuplicatePolicy::Allow);
        map.append("--add-opens", "a".to_string());
        map.append("--add-opens", "b".to_string());

        assert_eq!(map.len(), 2);
        assert_eq!(map.value_or_empty("--add-opens"), "a");

        map.remove("--add-opens");
        assert_eq!(map.value_or_empty("--add-opens"), "b");
        assert_eq!(map.index_of("--add-opens"), Some(2));
    }

    #[test]
    fn set_in_place_requires_existing_key() {
        let mut map = OrderedMap::new();
        assert!(!map.set_in_place("missing", 1));
        map.append("present", 1);
        assert!(map.set_in_place("present", 2));
        assert_eq!(map.get("present"), Some(&2));
        assert_eq!(map.index_of("present"), Some(1));
    }

    #[test]
    fn removal_does_not_recycle_indices() {
        let mut map = OrderedMap::new();
        map.append("a", 1);
        map.append("b", 2);
        assert_eq!(map.remove("a"), Some(1));
        map.append("c", 3);

        let indices: Vec<_> = map.iter().map(|e| (e.key.as_str(), e.index)).collect();
        assert_eq!(indices, vec![("b", 2), ("c", 3)]);
    }
}
