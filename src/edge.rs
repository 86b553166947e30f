//! Edges connecting two attachment points.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::ap::Ap;
use crate::graph::GraphError;
use crate::vertex::Vertex;

/// The type of bond an edge stands for.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BondType {
    /// Explicitly no bond: the edge only records connectivity.
    None,
    #[default]
    Undefined,
    /// Any bond order is acceptable.
    Any,
    Single,
    Double,
    Triple,
    Quadruple,
}

impl BondType {
    /// The bond order in an atomistic rendering, when the type defines one.
    pub fn bond_order(self) -> Option<u8> {
        match self {
            BondType::Single => Some(1),
            BondType::Double => Some(2),
            BondType::Triple => Some(3),
            BondType::Quadruple => Some(4),
            BondType::None | BondType::Undefined | BondType::Any => None,
        }
    }

    /// Whether an atomistic rendering draws a bond for this type.
    pub fn creates_bond(self) -> bool {
        self.bond_order().is_some()
    }
}

pub(crate) struct EdgeData {
    pub(crate) src: Ap,
    pub(crate) trg: Ap,
    pub(crate) bond: BondType,
}

/// A handle to a directed edge between two attachment points.
///
/// The source end belongs to the parent vertex and the target end to the
/// child; the roles are fixed for the life of the edge. Handles compare by
/// identity, like [`Ap`] handles.
#[derive(Clone)]
pub struct Edge(pub(crate) Rc<RefCell<EdgeData>>);

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Edge {}

impl Edge {
    /// Connects two available attachment points.
    ///
    /// Both points are checked before either is touched: on `Err` neither
    /// point has gained a user. On success both points atomically record
    /// this edge as their user.
    ///
    /// The points hold only weak references back, so the edge lives through
    /// its strong handles. Construction goes through [`Graph::add_edge`],
    /// which keeps one; a bare edge whose last handle is dropped releases
    /// both ends.
    ///
    /// [`Graph::add_edge`]: crate::graph::Graph::add_edge
    pub(crate) fn new(src: &Ap, trg: &Ap, bond: BondType) -> Result<Edge, GraphError> {
        if !src.is_available() {
            return Err(GraphError::ApNotAvailable(src.id()));
        }
        if !trg.is_available() {
            return Err(GraphError::ApNotAvailable(trg.id()));
        }
        let edge = Edge(Rc::new(RefCell::new(EdgeData {
            src: src.clone(),
            trg: trg.clone(),
            bond,
        })));
        src.set_user(&edge);
        trg.set_user(&edge);
        Ok(edge)
    }

    pub fn src_ap(&self) -> Ap {
        self.0.borrow().src.clone()
    }

    pub fn trg_ap(&self) -> Ap {
        self.0.borrow().trg.clone()
    }

    /// The deepest point the source end is a projection of.
    pub fn src_ap_throughout(&self) -> Ap {
        self.src_ap().embedded_ap()
    }

    /// The deepest point the target end is a projection of.
    pub fn trg_ap_throughout(&self) -> Ap {
        self.trg_ap().embedded_ap()
    }

    pub fn src_vertex(&self) -> Option<Vertex> {
        self.src_ap().owner()
    }

    pub fn trg_vertex(&self) -> Option<Vertex> {
        self.trg_ap().owner()
    }

    pub fn bond_type(&self) -> BondType {
        self.0.borrow().bond
    }

    pub fn set_bond_type(&self, bond: BondType) {
        self.0.borrow_mut().bond = bond;
    }

    /// Structural equality ignoring identities: same end positions on the
    /// respective owners, same end classes, same bond type.
    pub fn same_as(&self, other: &Edge) -> bool {
        self.src_ap().index_in_owner() == other.src_ap().index_in_owner()
            && self.trg_ap().index_in_owner() == other.trg_ap().index_in_owner()
            && self.src_ap().ap_class() == other.src_ap().ap_class()
            && self.trg_ap().ap_class() == other.trg_ap().ap_class()
            && self.bond_type() == other.bond_type()
    }

    /// Releases both end points. The edge handle stays valid but no longer
    /// counts as the user of either point.
    pub(crate) fn disconnect(&self) {
        let (src, trg) = {
            let d = self.0.borrow();
            (d.src.clone(), d.trg.clone())
        };
        if src.edge_user().as_ref() == Some(self) {
            src.clear_user();
        }
        if trg.edge_user().as_ref() == Some(self) {
            trg.clear_user();
        }
    }
}

impl fmt::Debug for Edge {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let d = self.0.borrow();
        write!(f, "Edge({:?} -{:?}-> {:?})", d.src, d.bond, d.trg)
    }
}
