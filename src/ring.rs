//! Ring closures: ordered vertex paths closed by a chord.

use std::cell::RefCell;
use std::error::Error;
use std::fmt;
use std::rc::Rc;

use crate::edge::BondType;
use crate::idgen::VertexId;
use crate::vertex::Vertex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RingError {
    /// A distance was requested from or to a vertex outside the ring.
    NotInRing(VertexId),
}

impl fmt::Display for RingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RingError::NotInRing(id) => {
                write!(f, "vertex {id} is not part of the ring")
            }
        }
    }
}

impl Error for RingError {}

struct RingData {
    vertices: Vec<Vertex>,
    bond: BondType,
}

/// A handle to a ring: the ordered sequence of vertices along a closed
/// path, plus the bond type of the chord joining head and tail.
///
/// Distances along a ring are index differences in the stored sequence, not
/// shortest paths in the surrounding graph.
#[derive(Clone)]
pub struct Ring(Rc<RefCell<RingData>>);

impl PartialEq for Ring {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Ring {}

impl Ring {
    pub fn new() -> Ring {
        Ring(Rc::new(RefCell::new(RingData {
            vertices: Vec::new(),
            bond: BondType::Undefined,
        })))
    }

    pub fn from_vertices(vertices: Vec<Vertex>) -> Ring {
        Ring(Rc::new(RefCell::new(RingData {
            vertices,
            bond: BondType::Undefined,
        })))
    }

    /// Appends a vertex at the tail end of the path.
    pub fn append_vertex(&self, vertex: Vertex) {
        self.0.borrow_mut().vertices.push(vertex);
    }

    pub fn head(&self) -> Option<Vertex> {
        self.0.borrow().vertices.first().cloned()
    }

    pub fn tail(&self) -> Option<Vertex> {
        self.0.borrow().vertices.last().cloned()
    }

    pub fn vertex_at(&self, position: usize) -> Option<Vertex> {
        self.0.borrow().vertices.get(position).cloned()
    }

    pub fn position_of(&self, vertex: &Vertex) -> Option<usize> {
        self.0.borrow().vertices.iter().position(|v| v == vertex)
    }

    pub fn vertices(&self) -> Vec<Vertex> {
        self.0.borrow().vertices.clone()
    }

    pub fn size(&self) -> usize {
        self.0.borrow().vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().vertices.is_empty()
    }

    /// The bond type of the chord closing the ring.
    pub fn bond_type(&self) -> BondType {
        self.0.borrow().bond
    }

    pub fn set_bond_type(&self, bond: BondType) {
        self.0.borrow_mut().bond = bond;
    }

    pub fn contains(&self, vertex: &Vertex) -> bool {
        self.0.borrow().vertices.contains(vertex)
    }

    pub fn contains_id(&self, id: VertexId) -> bool {
        self.0.borrow().vertices.iter().any(|v| v.vertex_id() == id)
    }

    /// Number of edges between two member vertices along the stored path.
    pub fn distance(&self, a: &Vertex, b: &Vertex) -> Result<usize, RingError> {
        let pa = self
            .position_of(a)
            .ok_or_else(|| RingError::NotInRing(a.vertex_id()))?;
        let pb = self
            .position_of(b)
            .ok_or_else(|| RingError::NotInRing(b.vertex_id()))?;
        Ok(pa.abs_diff(pb))
    }

    /// Of `a` and `b`, the one closer to the head vertex.
    pub fn closer_to_head(&self, a: &Vertex, b: &Vertex) -> Option<Vertex> {
        self.closer_to(a, b, &self.head()?)
    }

    /// Of `a` and `b`, the one closer to the tail vertex.
    pub fn closer_to_tail(&self, a: &Vertex, b: &Vertex) -> Option<Vertex> {
        self.closer_to(a, b, &self.tail()?)
    }

    /// Of `a` and `b`, the one closer to `target`; ties go to `a`. When one
    /// distance cannot be measured the other operand wins, provided it is a
    /// member; the result is never a non-member.
    pub fn closer_to(&self, a: &Vertex, b: &Vertex, target: &Vertex) -> Option<Vertex> {
        let da = match self.distance(a, target) {
            Ok(d) => d,
            Err(_) => return self.contains(b).then(|| b.clone()),
        };
        let db = match self.distance(b, target) {
            Ok(d) => d,
            Err(_) => return self.contains(a).then(|| a.clone()),
        };
        if da <= db {
            Some(a.clone())
        } else {
            Some(b.clone())
        }
    }

    /// Inserts a vertex so it ends up at the given position, shifting later
    /// members. Rejected if the vertex is already a member or the position
    /// is not strictly inside the current sequence.
    pub fn insert_at(&self, position: usize, vertex: Vertex) -> bool {
        let mut d = self.0.borrow_mut();
        if d.vertices.contains(&vertex) || position >= d.vertices.len() {
            return false;
        }
        d.vertices.insert(position, vertex);
        true
    }

    /// Inserts a vertex between two members, at the larger of their two
    /// positions. Rejected if the vertex is already a member or either
    /// anchor is not one.
    pub fn insert_between(&self, vertex: Vertex, a: &Vertex, b: &Vertex) -> bool {
        let mut d = self.0.borrow_mut();
        if d.vertices.contains(&vertex) {
            return false;
        }
        let pa = d.vertices.iter().position(|v| v == a);
        let pb = d.vertices.iter().position(|v| v == b);
        let (Some(pa), Some(pb)) = (pa, pb) else {
            return false;
        };
        d.vertices.insert(pa.max(pb), vertex);
        true
    }

    /// Removes the first occurrence of a member. Returns whether it was
    /// present.
    pub fn remove_vertex(&self, vertex: &Vertex) -> bool {
        let mut d = self.0.borrow_mut();
        match d.vertices.iter().position(|v| v == vertex) {
            Some(i) => {
                d.vertices.remove(i);
                true
            }
            None => false,
        }
    }

    /// Swaps a member for another vertex in place. Returns whether a swap
    /// happened.
    pub fn replace_vertex(&self, old: &Vertex, new: Vertex) -> bool {
        let mut d = self.0.borrow_mut();
        match d.vertices.iter().position(|v| v == old) {
            Some(i) => {
                d.vertices[i] = new;
                true
            }
            None => false,
        }
    }
}

impl Default for Ring {
    fn default() -> Self {
        Ring::new()
    }
}

impl fmt::Debug for Ring {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let d = self.0.borrow();
        write!(f, "Ring({} vertices, {:?})", d.vertices.len(), d.bond)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring_of(n: usize) -> (Ring, Vec<Vertex>) {
        let vs: Vec<Vertex> = (0..n).map(|_| Vertex::new_empty()).collect();
        (Ring::from_vertices(vs.clone()), vs)
    }

    #[test]
    fn distance_is_index_difference_and_symmetric() {
        let (r, vs) = ring_of(5);
        assert_eq!(r.distance(&vs[1], &vs[4]).unwrap(), 3);
        assert_eq!(r.distance(&vs[4], &vs[1]).unwrap(), 3);
        assert_eq!(r.distance(&vs[2], &vs[2]).unwrap(), 0);
        let outsider = Vertex::new_empty();
        assert_eq!(
            r.distance(&vs[0], &outsider),
            Err(RingError::NotInRing(outsider.vertex_id()))
        );
    }

    #[test]
    fn closer_to_prefers_smaller_distance_and_ties_go_first() {
        let (r, vs) = ring_of(5);
        assert_eq!(r.closer_to_head(&vs[1], &vs[3]), Some(vs[1].clone()));
        assert_eq!(r.closer_to_tail(&vs[1], &vs[3]), Some(vs[3].clone()));
        assert_eq!(
            r.closer_to(&vs[1], &vs[3], &vs[2]),
            Some(vs[1].clone())
        );
    }

    #[test]
    fn closer_to_degrades_to_the_measurable_member() {
        let (r, vs) = ring_of(3);
        let outsider = Vertex::new_empty();
        assert_eq!(
            r.closer_to(&outsider, &vs[2], &vs[0]),
            Some(vs[2].clone())
        );
        assert_eq!(
            r.closer_to(&vs[2], &outsider, &vs[0]),
            Some(vs[2].clone())
        );
        let other = Vertex::new_empty();
        assert_eq!(r.closer_to(&outsider, &other, &vs[0]), None);
    }

    #[test]
    fn insert_at_rejects_duplicates_and_out_of_range() {
        let (r, vs) = ring_of(3);
        let v = Vertex::new_empty();
        assert!(!r.insert_at(3, v.clone()));
        assert!(!r.insert_at(0, vs[1].clone()));
        assert!(r.insert_at(1, v.clone()));
        assert_eq!(r.position_of(&v), Some(1));
        assert_eq!(r.size(), 4);
    }

    #[test]
    fn insert_between_lands_at_the_larger_position() {
        let (r, vs) = ring_of(4);
        let v = Vertex::new_empty();
        assert!(r.insert_between(v.clone(), &vs[2], &vs[1]));
        assert_eq!(r.position_of(&v), Some(2));
        let w = Vertex::new_empty();
        let outsider = Vertex::new_empty();
        assert!(!r.insert_between(w, &vs[0], &outsider));
    }

    #[test]
    fn replace_and_remove() {
        let (r, vs) = ring_of(3);
        let v = Vertex::new_empty();
        assert!(r.replace_vertex(&vs[1], v.clone()));
        assert!(r.contains(&v));
        assert!(!r.contains(&vs[1]));
        assert!(r.remove_vertex(&v));
        assert_eq!(r.size(), 2);
        assert!(!r.remove_vertex(&v));
    }

    #[test]
    fn head_tail_and_membership_by_id() {
        let (r, vs) = ring_of(3);
        assert_eq!(r.head(), Some(vs[0].clone()));
        assert_eq!(r.tail(), Some(vs[2].clone()));
        assert!(r.contains_id(vs[1].vertex_id()));
        assert!(!r.contains_id(Vertex::new_empty().vertex_id()));
    }
}
