//! Identity-keyed side tables that do not keep their keys alive.

use std::collections::HashMap;

use on_change_model::{Value, WeakValue};

const MIN_SWEEP: usize = 64;

struct Entry<V> {
    key: WeakValue,
    value: V,
}

/// Maps object-typed values, by identity, to `V`.
///
/// Keys are held weakly. An entry whose key has been dropped is never
/// returned (its address may since have been reused by another object) and
/// is removed by the next sweep, which runs whenever the table has doubled
/// since the last one.
pub(crate) struct IdentityMap<V> {
    entries: HashMap<usize, Entry<V>>,
    sweep_at: usize,
}

impl<V> IdentityMap<V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            sweep_at: MIN_SWEEP,
        }
    }

    pub fn get(&self, key: &Value) -> Option<&V> {
        let entry = self.entries.get(&key.identity()?)?;
        entry.key.is_alive().then_some(&entry.value)
    }

    /// Inserts or replaces the entry for `key`. Primitives are not stored.
    pub fn insert(&mut self, key: &Value, value: V) {
        let (Some(id), Some(weak)) = (key.identity(), key.downgrade()) else {
            return;
        };
        if self.entries.len() >= self.sweep_at {
            self.sweep();
        }
        self.entries.insert(id, Entry { key: weak, value });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.sweep_at = MIN_SWEEP;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn sweep(&mut self) {
        self.entries.retain(|_, entry| entry.key.is_alive());
        self.sweep_at = (self.entries.len() * 2).max(MIN_SWEEP);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use on_change_model::Object;

    #[test]
    fn entries_follow_identity() {
        let mut map = IdentityMap::new();
        let a = Value::from(Object::new());
        let b = Value::from(Object::new());
        map.insert(&a, 1);
        assert_eq!(map.get(&a), Some(&1));
        assert_eq!(map.get(&a.clone()), Some(&1));
        assert_eq!(map.get(&b), None);
        map.insert(&a, 2);
        assert_eq!(map.get(&a), Some(&2));
        map.insert(&Value::from(1), 3);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn dropped_keys_are_swept() {
        let mut map = IdentityMap::new();
        let keep = Value::from(Object::new());
        map.insert(&keep, 0);
        for i in 0..(MIN_SWEEP * 4) {
            let temp = Value::from(Object::new());
            map.insert(&temp, i);
        }
        assert!(map.len() <= MIN_SWEEP * 2);
        assert_eq!(map.get(&keep), Some(&0));
    }
}
