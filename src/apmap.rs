//! An ordered attachment-point map that defends ID uniqueness.

use std::cmp::Ordering;
use std::fmt;

use crate::ap::Ap;
use crate::idgen::{self, ApId};

/// An AP-to-AP map ordered by key ID.
///
/// Templates use this to map inner attachment points to their projections on
/// the template surface. Keys are compared by ID, which makes the map robust
/// to keys that look alike; when a key about to be inserted collides with an
/// existing, distinct key instance — same ID, or properties that compare
/// equal — the incoming key is re-identified with a freshly minted ID past
/// the largest ID this map has seen. Aliasing between distinct points can
/// therefore never corrupt the map.
pub struct UniqueApMap {
    // Sorted by key ID. Key IDs are stable while the entry is in the map.
    entries: Vec<(Ap, Ap)>,
    max_seen: u64,
}

impl UniqueApMap {
    pub fn new() -> Self {
        UniqueApMap {
            entries: Vec::new(),
            max_seen: 0,
        }
    }

    /// Inserts a key/value pair, re-identifying the key first if it collides
    /// with a distinct key instance already present. Returns the value the
    /// key replaced, if the very same key instance was already mapped.
    pub fn insert(&mut self, key: Ap, value: Ap) -> Option<Ap> {
        if self.collides_with_existing(&key) {
            idgen::ensure_ap_id_beyond(ApId::from_raw(self.max_seen));
            key.set_id(idgen::next_ap_id());
        }
        let id = key.id();
        self.max_seen = self.max_seen.max(id.value()).max(value.id().value());
        match self.position_of_id(id) {
            Ok(i) => {
                let old = std::mem::replace(&mut self.entries[i].1, value);
                Some(old)
            }
            Err(i) => {
                self.entries.insert(i, (key, value));
                None
            }
        }
    }

    fn collides_with_existing(&self, key: &Ap) -> bool {
        self.entries.iter().any(|(k, _)| {
            k != key && (k.id() == key.id() || k.compare_content(key) == Ordering::Equal)
        })
    }

    fn position_of_id(&self, id: ApId) -> Result<usize, usize> {
        self.entries.binary_search_by(|(k, _)| k.id().cmp(&id))
    }

    pub fn get(&self, key: &Ap) -> Option<Ap> {
        self.get_by_id(key.id())
    }

    pub fn get_by_id(&self, id: ApId) -> Option<Ap> {
        self.position_of_id(id)
            .ok()
            .map(|i| self.entries[i].1.clone())
    }

    pub fn contains_key(&self, key: &Ap) -> bool {
        self.position_of_id(key.id()).is_ok()
    }

    /// Removes the entry with the key's ID and returns its value.
    pub fn remove(&mut self, key: &Ap) -> Option<Ap> {
        self.position_of_id(key.id())
            .ok()
            .map(|i| self.entries.remove(i).1)
    }

    /// The key mapping to the given value instance, if any.
    pub fn key_of_value(&self, value: &Ap) -> Option<Ap> {
        self.entries
            .iter()
            .find(|(_, v)| v == value)
            .map(|(k, _)| k.clone())
    }

    /// Position of the key in ID order.
    pub fn index_of_key(&self, key: &Ap) -> Option<usize> {
        self.position_of_id(key.id()).ok()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Ap> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &Ap> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Ap, &Ap)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The largest attachment point ID this map has ever held.
    pub fn max_seen_id(&self) -> u64 {
        self.max_seen
    }
}

impl Default for UniqueApMap {
    fn default() -> Self {
        UniqueApMap::new()
    }
}

impl fmt::Debug for UniqueApMap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ap::Ap;

    fn plain_ap(atom_pos: usize) -> Ap {
        Ap::new_unowned(Some(atom_pos), None, None)
    }

    #[test]
    fn entries_stay_ordered_by_key_id() {
        let (a, b, c) = (plain_ap(0), plain_ap(1), plain_ap(2));
        let mut m = UniqueApMap::new();
        m.insert(c.clone(), plain_ap(10));
        m.insert(a.clone(), plain_ap(11));
        m.insert(b.clone(), plain_ap(12));
        let ids: Vec<_> = m.keys().map(|k| k.id()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
        assert_eq!(m.len(), 3);
    }

    #[test]
    fn content_equal_distinct_key_is_re_identified() {
        let a = plain_ap(7);
        let lookalike = a.clone_ap();
        // Force the lookalike to carry the same ID as the mapped key.
        lookalike.set_id(a.id());

        let mut m = UniqueApMap::new();
        m.insert(a.clone(), plain_ap(0));
        let id_before = lookalike.id();
        m.insert(lookalike.clone(), plain_ap(1));

        assert_ne!(lookalike.id(), id_before);
        assert_ne!(lookalike.id(), a.id());
        assert_eq!(m.len(), 2);
        // Both entries remain reachable under their own IDs.
        assert!(m.get(&a).is_some());
        assert!(m.get(&lookalike).is_some());
    }

    #[test]
    fn re_identified_key_exceeds_everything_the_map_saw() {
        let a = plain_ap(3);
        let big_value = plain_ap(3);
        let mut m = UniqueApMap::new();
        m.insert(a.clone(), big_value.clone());

        let twin = a.clone_ap();
        m.insert(twin.clone(), plain_ap(4));
        assert!(twin.id().value() > a.id().value());
        assert!(twin.id().value() > big_value.id().value());
    }

    #[test]
    fn same_instance_insert_replaces_the_value() {
        let k = plain_ap(1);
        let v1 = plain_ap(5);
        let v2 = plain_ap(6);
        let mut m = UniqueApMap::new();
        assert!(m.insert(k.clone(), v1.clone()).is_none());
        assert_eq!(m.insert(k.clone(), v2.clone()), Some(v1));
        assert_eq!(m.get(&k), Some(v2));
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn remove_and_lookup_by_id() {
        let k = plain_ap(0);
        let v = plain_ap(9);
        let mut m = UniqueApMap::new();
        m.insert(k.clone(), v.clone());
        assert_eq!(m.get_by_id(k.id()), Some(v.clone()));
        assert_eq!(m.remove(&k), Some(v));
        assert!(m.is_empty());
        assert!(m.get(&k).is_none());
    }
}
