//! Graphs of building blocks connected through attachment points.

use std::cell::RefCell;
use std::error::Error;
use std::fmt;
use std::rc::{Rc, Weak};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;

use crate::ap::Ap;
use crate::apclass::ApClass;
use crate::edge::{BondType, Edge};
use crate::idgen::{self, ApId, GraphId};
use crate::ring::Ring;
use crate::symmetry::SymmetricVertexes;
use crate::vertex::{Vertex, VertexData};

/// Failure of a graph-building operation. Construction failures leave no
/// partial state behind.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    /// An edge was requested over a point already used by another edge.
    ApNotAvailable(ApId),
    /// A template rejected an inner graph whose free points cannot cover
    /// the given required class.
    ContractUnsatisfied(Option<ApClass>),
    /// Required points cannot be declared once an inner graph is in place.
    RequiredApsLocked,
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GraphError::ApNotAvailable(id) => {
                write!(f, "attachment point {id} is already used by an edge")
            }
            GraphError::ContractUnsatisfied(Some(class)) => write!(
                f,
                "inner graph has no free attachment point covering required class {class}"
            ),
            GraphError::ContractUnsatisfied(None) => write!(
                f,
                "inner graph has no free attachment point covering an untyped requirement"
            ),
            GraphError::RequiredApsLocked => {
                write!(f, "required attachment points cannot change once an inner graph is set")
            }
        }
    }
}

impl Error for GraphError {}

pub(crate) struct GraphData {
    pub(crate) id: GraphId,
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) rings: Vec<Ring>,
    pub(crate) sym_vertices: Vec<SymmetricVertexes>,
    pub(crate) jacket: Weak<RefCell<VertexData>>,
}

/// A handle to a graph owning vertices, edges, rings, and vertex-level
/// symmetry classes. Handles compare by identity.
#[derive(Clone)]
pub struct Graph(pub(crate) Rc<RefCell<GraphData>>);

impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Graph {}

impl Graph {
    pub fn new() -> Graph {
        Graph(Rc::new(RefCell::new(GraphData {
            id: idgen::next_graph_id(),
            vertices: Vec::new(),
            edges: Vec::new(),
            rings: Vec::new(),
            sym_vertices: Vec::new(),
            jacket: Weak::new(),
        })))
    }

    pub fn graph_id(&self) -> GraphId {
        self.0.borrow().id
    }

    /// Adds a vertex and takes ownership of it. The process-wide vertex ID
    /// counter is advanced past the vertex's ID so later fresh IDs cannot
    /// collide with adopted ones.
    pub fn add_vertex(&self, vertex: &Vertex) {
        vertex.set_graph_owner(Some(self));
        idgen::ensure_vertex_id_beyond(vertex.vertex_id());
        self.0.borrow_mut().vertices.push(vertex.clone());
    }

    /// Connects two available points with a new edge and records it.
    pub fn add_edge(&self, src: &Ap, trg: &Ap, bond: BondType) -> Result<Edge, GraphError> {
        let edge = Edge::new(src, trg, bond)?;
        self.0.borrow_mut().edges.push(edge.clone());
        Ok(edge)
    }

    pub fn add_ring(&self, ring: Ring) {
        self.0.borrow_mut().rings.push(ring);
    }

    pub fn add_sym_vertices(&self, set: SymmetricVertexes) {
        self.0.borrow_mut().sym_vertices.push(set);
    }

    pub fn vertices(&self) -> Vec<Vertex> {
        self.0.borrow().vertices.clone()
    }

    pub fn edges(&self) -> Vec<Edge> {
        self.0.borrow().edges.clone()
    }

    pub fn rings(&self) -> Vec<Ring> {
        self.0.borrow().rings.clone()
    }

    pub fn vertex_count(&self) -> usize {
        self.0.borrow().vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.0.borrow().edges.len()
    }

    pub fn contains_vertex(&self, vertex: &Vertex) -> bool {
        self.0.borrow().vertices.contains(vertex)
    }

    /// The first vertex, by convention the root the structure grows from.
    pub fn source_vertex(&self) -> Option<Vertex> {
        self.0.borrow().vertices.first().cloned()
    }

    /// All attachment points not used by any edge at this level, in vertex
    /// order.
    pub fn available_aps(&self) -> Vec<Ap> {
        self.vertices()
            .iter()
            .flat_map(|v| v.aps())
            .filter(Ap::is_available)
            .collect()
    }

    /// Looks an attachment point up by ID anywhere in this graph.
    pub fn ap_with_id(&self, id: ApId) -> Option<Ap> {
        self.vertices()
            .iter()
            .flat_map(|v| v.aps())
            .find(|ap| ap.id() == id)
    }

    /// Rings that pass through the given vertex.
    pub fn rings_involving(&self, vertex: &Vertex) -> Vec<Ring> {
        self.rings()
            .into_iter()
            .filter(|r| r.contains(vertex))
            .collect()
    }

    /// The symmetry class the vertex belongs to, as the full member list
    /// (including the vertex itself), or empty when it is in no class.
    pub fn sym_vertices_for(&self, vertex: &Vertex) -> Vec<Vertex> {
        let d = self.0.borrow();
        for set in &d.sym_vertices {
            if set.contains(vertex) {
                return set.iter().cloned().collect();
            }
        }
        Vec::new()
    }

    /// The template this graph is the inner graph of, if any.
    pub fn template_jacket(&self) -> Option<Vertex> {
        self.0.borrow().jacket.upgrade().map(Vertex)
    }

    /// Wires (or clears) the back-reference to the template that owns this
    /// graph. Called when the graph becomes some template's inner graph.
    pub fn set_template_jacket(&self, template: Option<&Vertex>) {
        self.0.borrow_mut().jacket = match template {
            Some(t) => Rc::downgrade(&t.0),
            None => Weak::new(),
        };
    }

    /// Total heavy atoms over all vertices, descending into templates.
    pub fn heavy_atoms_count(&self) -> usize {
        self.vertices().iter().map(Vertex::heavy_atoms_count).sum()
    }

    /// Detaches a vertex from this graph: its edges are disconnected, rings
    /// through it are dropped, and its symmetry class forgets it. A silent
    /// no-op when the vertex is not here.
    pub fn remove_vertex(&self, vertex: &Vertex) {
        if !self.contains_vertex(vertex) {
            return;
        }
        let doomed_edges: Vec<Edge> = {
            let d = self.0.borrow();
            d.edges
                .iter()
                .filter(|e| {
                    e.src_vertex().as_ref() == Some(vertex)
                        || e.trg_vertex().as_ref() == Some(vertex)
                })
                .cloned()
                .collect()
        };
        for e in &doomed_edges {
            e.disconnect();
        }
        {
            let mut d = self.0.borrow_mut();
            d.edges.retain(|e| !doomed_edges.contains(e));
            d.rings.retain(|r| !r.contains(vertex));
            for set in &mut d.sym_vertices {
                set.remove(vertex);
            }
            d.sym_vertices.retain(|s| s.len() > 1);
            d.vertices.retain(|v| v != vertex);
        }
        vertex.set_graph_owner(None);
    }

    /// Removes the given vertex and everything reachable from it along
    /// source-to-target edge direction.
    pub fn remove_branch_starting_at(&self, vertex: &Vertex) {
        let vertices = self.vertices();
        let Some(start) = vertices.iter().position(|v| v == vertex) else {
            return;
        };
        let mut dg: DiGraph<usize, ()> = DiGraph::new();
        let nodes: Vec<NodeIndex> = (0..vertices.len()).map(|i| dg.add_node(i)).collect();
        for e in self.edges() {
            let src = e.src_vertex().and_then(|v| vertices.iter().position(|x| *x == v));
            let trg = e.trg_vertex().and_then(|v| vertices.iter().position(|x| *x == v));
            if let (Some(s), Some(t)) = (src, trg) {
                dg.add_edge(nodes[s], nodes[t], ());
            }
        }
        let mut doomed = Vec::new();
        let mut dfs = Dfs::new(&dg, nodes[start]);
        while let Some(n) = dfs.next(&dg) {
            doomed.push(vertices[dg[n]].clone());
        }
        for v in doomed {
            self.remove_vertex(&v);
        }
    }

    /// A deep, independent copy: every vertex is deep-cloned and the edge,
    /// ring, and symmetry structure is rebuilt over the clones by position.
    /// The copy is not embedded in any template.
    pub fn deep_copy(&self) -> Graph {
        let copy = Graph::new();
        let originals = self.vertices();
        for v in &originals {
            copy.add_vertex(&v.clone_vertex());
        }
        let copies = copy.vertices();

        let locate = |ap: &Ap| -> Option<(usize, usize)> {
            let owner = ap.owner()?;
            let vi = originals.iter().position(|v| *v == owner)?;
            Some((vi, owner.index_of_ap(ap)?))
        };
        for e in self.edges() {
            let Some((sv, sa)) = locate(&e.src_ap()) else {
                continue;
            };
            let Some((tv, ta)) = locate(&e.trg_ap()) else {
                continue;
            };
            let src = copies[sv]
                .ap(sa)
                .expect("copied vertices preserve attachment point order");
            let trg = copies[tv]
                .ap(ta)
                .expect("copied vertices preserve attachment point order");
            copy.add_edge(&src, &trg, e.bond_type())
                .expect("copied attachment points start out available");
        }
        for ring in self.rings() {
            let rc = Ring::new();
            rc.set_bond_type(ring.bond_type());
            for v in ring.vertices() {
                if let Some(vi) = originals.iter().position(|x| *x == v) {
                    rc.append_vertex(copies[vi].clone());
                }
            }
            copy.add_ring(rc);
        }
        {
            let d = self.0.borrow();
            for set in &d.sym_vertices {
                let mapped: SymmetricVertexes = set
                    .iter()
                    .filter_map(|v| {
                        originals.iter().position(|x| x == v).map(|i| copies[i].clone())
                    })
                    .collect();
                if !mapped.is_empty() {
                    copy.0.borrow_mut().sym_vertices.push(mapped);
                }
            }
        }
        copy
    }

    /// Structural equality in insertion order: pairwise equal vertices,
    /// edges over the same positions, and rings through the same positions.
    /// Identities and IDs are ignored.
    pub fn same_as(&self, other: &Graph) -> bool {
        let mine = self.vertices();
        let theirs = other.vertices();
        if mine.len() != theirs.len() {
            return false;
        }
        if !mine.iter().zip(theirs.iter()).all(|(a, b)| a.same_as(b)) {
            return false;
        }
        let my_edges = self.edges();
        let their_edges = other.edges();
        if my_edges.len() != their_edges.len() {
            return false;
        }
        let vertex_pos = |vs: &[Vertex], e: &Edge| {
            (
                e.src_vertex().and_then(|v| vs.iter().position(|x| *x == v)),
                e.trg_vertex().and_then(|v| vs.iter().position(|x| *x == v)),
            )
        };
        for (a, b) in my_edges.iter().zip(their_edges.iter()) {
            if vertex_pos(&mine, a) != vertex_pos(&theirs, b) || !a.same_as(b) {
                return false;
            }
        }
        let my_rings = self.rings();
        let their_rings = other.rings();
        if my_rings.len() != their_rings.len() {
            return false;
        }
        for (a, b) in my_rings.iter().zip(their_rings.iter()) {
            if a.bond_type() != b.bond_type() || a.size() != b.size() {
                return false;
            }
            let pos_a: Vec<_> = a
                .vertices()
                .iter()
                .map(|v| mine.iter().position(|x| x == v))
                .collect();
            let pos_b: Vec<_> = b
                .vertices()
                .iter()
                .map(|v| theirs.iter().position(|x| x == v))
                .collect();
            if pos_a != pos_b {
                return false;
            }
        }
        true
    }
}

impl Default for Graph {
    fn default() -> Self {
        Graph::new()
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let d = self.0.borrow();
        write!(
            f,
            "Graph#{}({} vertices, {} edges, {} rings)",
            d.id,
            d.vertices.len(),
            d.edges.len(),
            d.rings.len()
        )
    }
}
