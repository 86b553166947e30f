//! Sets of items that are considered equivalent under molecular symmetry.

use crate::vertex::Vertex;

/// An ordered collection with set semantics: items are kept in insertion
/// order and adding an item already present is a silent no-op.
///
/// Symmetric sets reference elements shared with the rest of a graph, so the
/// type deliberately implements no `Clone`: a copy of a set over one graph's
/// elements is meaningless for another graph, and cloning the structure that
/// holds the elements must rebuild its sets against the copied elements.
#[derive(Debug, PartialEq)]
pub struct SymmetricSet<T> {
    items: Vec<T>,
}

impl<T: PartialEq> SymmetricSet<T> {
    pub fn new() -> Self {
        SymmetricSet { items: Vec::new() }
    }

    /// Adds the item unless an equal one is already present. Returns whether
    /// the item was added.
    pub fn add(&mut self, item: T) -> bool {
        if self.items.contains(&item) {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    /// Removes the first occurrence of an equal item, if any. Returns
    /// whether an item was removed.
    pub fn remove(&mut self, item: &T) -> bool {
        match self.items.iter().position(|x| x == item) {
            Some(i) => {
                self.items.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T: PartialEq> Default for SymmetricSet<T> {
    fn default() -> Self {
        SymmetricSet::new()
    }
}

impl<T: PartialEq> FromIterator<T> for SymmetricSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = SymmetricSet::new();
        for item in iter {
            set.add(item);
        }
        set
    }
}

impl<T: PartialEq + Clone> SymmetricSet<T> {
    /// Rebuilds an equal set. Internal use only: public callers must rebuild
    /// sets against the elements of the structure that will hold them.
    pub(crate) fn duplicate(&self) -> Self {
        SymmetricSet {
            items: self.items.clone(),
        }
    }
}

/// Positions, on one vertex, of attachment points equivalent by symmetry.
pub type SymmetricAps = SymmetricSet<usize>;

/// Vertices of one graph equivalent by symmetry.
pub type SymmetricVertexes = SymmetricSet<Vertex>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_keeps_insertion_order_and_ignores_duplicates() {
        let mut s: SymmetricSet<usize> = SymmetricSet::new();
        assert!(s.add(3));
        assert!(s.add(1));
        assert!(!s.add(3));
        assert!(s.add(2));
        assert_eq!(s.iter().copied().collect::<Vec<_>>(), vec![3, 1, 2]);
    }

    #[test]
    fn remove_drops_only_matching_item() {
        let mut s: SymmetricSet<usize> = [5, 7, 9].into_iter().collect();
        assert!(s.remove(&7));
        assert!(!s.remove(&7));
        assert_eq!(s.len(), 2);
        assert!(s.contains(&5));
        assert!(s.contains(&9));
    }
}
