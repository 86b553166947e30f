//! Attachment points: the connectable slots on a vertex.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::apclass::ApClass;
use crate::edge::{Edge, EdgeData};
use crate::idgen::{self, ApId};
use crate::vertex::{Vertex, VertexData};

pub(crate) struct ApData {
    pub(crate) id: ApId,
    pub(crate) atom_pos: Option<usize>,
    pub(crate) class: Option<ApClass>,
    pub(crate) dir_vec: Option<[f64; 3]>,
    pub(crate) owner: Weak<RefCell<VertexData>>,
    pub(crate) user: Weak<RefCell<EdgeData>>,
}

/// A handle to an attachment point.
///
/// An attachment point belongs to at most one vertex (its owner) and is used
/// by at most one edge (its user). Handles are cheap to clone and compare by
/// identity: two handles are equal when they designate the same point, never
/// because two points look alike. Every point carries a process-wide unique
/// ID minted at creation.
#[derive(Clone)]
pub struct Ap(pub(crate) Rc<RefCell<ApData>>);

impl PartialEq for Ap {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Ap {}

impl Ap {
    pub(crate) fn new_unowned(
        atom_pos: Option<usize>,
        dir_vec: Option<[f64; 3]>,
        class: Option<ApClass>,
    ) -> Ap {
        Ap(Rc::new(RefCell::new(ApData {
            id: idgen::next_ap_id(),
            atom_pos,
            class,
            dir_vec,
            owner: Weak::new(),
            user: Weak::new(),
        })))
    }

    /// A copy of this point with the same properties but a freshly minted ID
    /// and no owner or user.
    pub(crate) fn clone_ap(&self) -> Ap {
        let d = self.0.borrow();
        Ap::new_unowned(d.atom_pos, d.dir_vec, d.class.clone())
    }

    pub fn id(&self) -> ApId {
        self.0.borrow().id
    }

    pub(crate) fn set_id(&self, id: ApId) {
        self.0.borrow_mut().id = id;
    }

    /// Index of the source atom this point sits on, if the owner has an
    /// atomistic representation.
    pub fn atom_pos(&self) -> Option<usize> {
        self.0.borrow().atom_pos
    }

    pub fn set_atom_pos(&self, atom_pos: Option<usize>) {
        self.0.borrow_mut().atom_pos = atom_pos;
    }

    pub fn ap_class(&self) -> Option<ApClass> {
        self.0.borrow().class.clone()
    }

    pub fn set_ap_class(&self, class: Option<ApClass>) {
        self.0.borrow_mut().class = class;
    }

    /// Direction of the bond this point would form, in the owner's frame.
    pub fn dir_vec(&self) -> Option<[f64; 3]> {
        self.0.borrow().dir_vec
    }

    pub fn set_dir_vec(&self, dir_vec: Option<[f64; 3]>) {
        self.0.borrow_mut().dir_vec = dir_vec;
    }

    /// The vertex this point belongs to, if any.
    pub fn owner(&self) -> Option<Vertex> {
        self.0.borrow().owner.upgrade().map(Vertex)
    }

    pub(crate) fn set_owner(&self, owner: &Vertex) {
        self.0.borrow_mut().owner = Rc::downgrade(&owner.0);
    }

    pub(crate) fn clear_owner(&self) {
        self.0.borrow_mut().owner = Weak::new();
    }

    /// The edge using this point at the level of the owner's graph, if any.
    pub fn edge_user(&self) -> Option<Edge> {
        self.0.borrow().user.upgrade().map(Edge)
    }

    pub(crate) fn set_user(&self, user: &Edge) {
        self.0.borrow_mut().user = Rc::downgrade(&user.0);
    }

    pub(crate) fn clear_user(&self) {
        self.0.borrow_mut().user = Weak::new();
    }

    /// Whether no edge uses this point at the level of the owner's graph.
    ///
    /// A point can be available here and still be engaged from outside: if
    /// the owner's graph is the inner graph of a template, the projection of
    /// this point on the template surface may be used by an edge out there.
    /// Use [`Ap::is_available_throughout`] for the boundary-crossing answer.
    pub fn is_available(&self) -> bool {
        self.0.borrow().user.upgrade().is_none()
    }

    /// Whether this point is available at every level of template embedding.
    ///
    /// # Panics
    ///
    /// Panics if this point is available inside a template whose surface has
    /// no projection for it. Template maintenance keeps a projection for
    /// every available inner point, so a missing one means the embedding was
    /// corrupted.
    pub fn is_available_throughout(&self) -> bool {
        if !self.is_available() {
            return false;
        }
        let Some(outer) = self.projection_on_jacket() else {
            return true;
        };
        match outer {
            Some(outer) => outer.is_available_throughout(),
            None => panic!(
                "available attachment point {} has no projection on the \
                 surface of the embedding template",
                self.id()
            ),
        }
    }

    /// The edge using this point at any level of embedding, found by walking
    /// outward through template surfaces.
    pub fn edge_user_throughout(&self) -> Option<Edge> {
        if let Some(e) = self.edge_user() {
            return Some(e);
        }
        self.projection_on_jacket()??.edge_user_throughout()
    }

    /// The projection of this point on the surface of the template embedding
    /// the owner's graph. Outer `None`: there is no embedding template.
    /// Inner `None`: there is one, but it has no projection of this point.
    fn projection_on_jacket(&self) -> Option<Option<Ap>> {
        let owner = self.owner()?;
        let graph = owner.graph_owner()?;
        let jacket = graph.template_jacket()?;
        Some(jacket.outer_ap_of_inner(self))
    }

    /// Descends through template surfaces to the deepest point this one is a
    /// projection of. Returns this very point when it projects nothing.
    pub fn embedded_ap(&self) -> Ap {
        if let Some(owner) = self.owner() {
            if owner.is_template() {
                if let Some(inner) = owner.inner_ap_of_outer(self) {
                    return inner.embedded_ap();
                }
            }
        }
        self.clone()
    }

    /// Whether this point is the source end of the edge using it.
    pub fn is_src_in_user(&self) -> bool {
        match self.edge_user() {
            Some(e) => e.src_ap() == *self,
            None => false,
        }
    }

    /// Like [`Ap::is_src_in_user`], but the using edge may live at an outer
    /// embedding level and use a projection of this point.
    pub fn is_src_in_user_throughout(&self) -> bool {
        match self.edge_user_throughout() {
            Some(e) => e.src_ap().embedded_ap() == self.embedded_ap(),
            None => false,
        }
    }

    /// The point at the other end of the edge using this one, if any.
    pub fn linked_ap(&self) -> Option<Ap> {
        let e = self.edge_user()?;
        if e.src_ap() == *self {
            Some(e.trg_ap())
        } else {
            Some(e.src_ap())
        }
    }

    /// Like [`Ap::linked_ap`], crossing template boundaries: the returned
    /// point belongs to the embedding level where the using edge lives.
    pub fn linked_ap_throughout(&self) -> Option<Ap> {
        let e = self.edge_user_throughout()?;
        let me = self.embedded_ap();
        if e.src_ap().embedded_ap() == me {
            Some(e.trg_ap())
        } else if e.trg_ap().embedded_ap() == me {
            Some(e.src_ap())
        } else {
            None
        }
    }

    /// Position of this point in the owner's ordered list of points.
    pub fn index_in_owner(&self) -> Option<usize> {
        self.owner()?.index_of_ap(self)
    }

    /// Structural equality: same atom position, same position in the owner
    /// list, same class. IDs are ignored, so structurally identical points
    /// on two copies of a vertex compare equal.
    pub fn same_as(&self, other: &Ap) -> bool {
        if self.atom_pos() != other.atom_pos() {
            return false;
        }
        if self.owner().is_some()
            && other.owner().is_some()
            && self.index_in_owner() != other.index_in_owner()
        {
            return false;
        }
        self.ap_class() == other.ap_class()
    }

    /// Orders points by their properties alone: atom position, class, then
    /// direction vector. Identity and IDs play no part, so distinct points
    /// can compare equal.
    pub(crate) fn compare_content(&self, other: &Ap) -> Ordering {
        cmp_option(self.atom_pos(), other.atom_pos())
            .then_with(|| cmp_option(self.ap_class(), other.ap_class()))
            .then_with(|| cmp_dir_vec(self.dir_vec(), other.dir_vec()))
    }
}

fn cmp_option<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => x.cmp(&y),
    }
}

fn cmp_dir_vec(a: Option<[f64; 3]>, b: Option<[f64; 3]>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => x
            .iter()
            .zip(y.iter())
            .map(|(p, q)| p.total_cmp(q))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal),
    }
}

impl fmt::Debug for Ap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let d = self.0.borrow();
        write!(f, "Ap#{}", d.id)?;
        if let Some(c) = &d.class {
            write!(f, "[{c}]")?;
        }
        if let Some(p) = d.atom_pos {
            write!(f, "@{p}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::BondType;
    use crate::vertex::Vertex;

    #[test]
    fn fresh_points_are_available_and_unowned() {
        let ap = Ap::new_unowned(None, None, None);
        assert!(ap.is_available());
        assert!(ap.owner().is_none());
        assert!(ap.edge_user().is_none());
        assert!(ap.linked_ap().is_none());
    }

    #[test]
    fn clone_ap_copies_properties_but_mints_a_new_id() {
        let class: ApClass = "amine:0".parse().unwrap();
        let ap = Ap::new_unowned(Some(2), Some([1.0, 0.0, 0.0]), Some(class.clone()));
        let copy = ap.clone_ap();
        assert_ne!(copy.id(), ap.id());
        assert_eq!(copy.atom_pos(), Some(2));
        assert_eq!(copy.ap_class(), Some(class));
        assert!(copy.owner().is_none());
    }

    #[test]
    fn handle_equality_is_identity_not_likeness() {
        let a = Ap::new_unowned(Some(0), None, None);
        let b = Ap::new_unowned(Some(0), None, None);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert!(a.same_as(&b));
    }

    #[test]
    fn linked_ap_sees_across_the_using_edge() {
        let v1 = Vertex::new_empty();
        let v2 = Vertex::new_empty();
        let a = v1.add_ap();
        let b = v2.add_ap();
        let e = Edge::new(&a, &b, BondType::Single).unwrap();
        assert_eq!(a.linked_ap(), Some(b.clone()));
        assert_eq!(b.linked_ap(), Some(a.clone()));
        assert!(a.is_src_in_user());
        assert!(!b.is_src_in_user());
        assert_eq!(a.edge_user(), Some(e));
    }

    #[test]
    fn same_as_ignores_ids_but_not_class() {
        let c1: ApClass = "hyd:1".parse().unwrap();
        let c2: ApClass = "hyd:2".parse().unwrap();
        let a = Ap::new_unowned(Some(0), None, Some(c1.clone()));
        let b = Ap::new_unowned(Some(0), None, Some(c1));
        let c = Ap::new_unowned(Some(0), None, Some(c2));
        assert!(a.same_as(&b));
        assert!(!a.same_as(&c));
    }
}
