//! Vertices: the building blocks a graph is assembled from.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::ap::Ap;
use crate::apclass::ApClass;
use crate::edge::Edge;
use crate::graph::{Graph, GraphData};
use crate::idgen::{self, VertexId};
use crate::mutation::MutationType;
use crate::symmetry::SymmetricAps;
use crate::template::TemplateData;

/// Provenance of a vertex in the building-block library.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BBType {
    #[default]
    Undefined,
    /// The root building block a structure grows from.
    Scaffold,
    Fragment,
    /// A capping group saturating an otherwise free attachment point.
    Cap,
    None,
}

/// The concrete shape of a vertex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum VertexKind {
    /// A vertex with attachment points but no chemical content.
    Empty,
    /// A vertex backed by a molecular fragment.
    Fragment,
    /// A vertex wrapping an entire nested graph.
    Template,
}

/// An opaque chemical representation produced by an external layer.
///
/// The graph model never interprets the payload; it only caches it on a
/// vertex and drops it when the structure underneath changes.
#[derive(Clone, PartialEq, Eq)]
pub struct Artifact {
    bytes: Vec<u8>,
}

impl Artifact {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Artifact {
        Artifact {
            bytes: bytes.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Artifact({} bytes)", self.bytes.len())
    }
}

pub(crate) enum Payload {
    Empty {
        aps: Vec<Ap>,
        sym_aps: Vec<SymmetricAps>,
    },
    Fragment {
        aps: Vec<Ap>,
        sym_aps: Vec<SymmetricAps>,
        heavy_atoms: usize,
        artifact: Option<Artifact>,
    },
    Template(TemplateData),
}

pub(crate) struct VertexData {
    pub(crate) id: VertexId,
    pub(crate) building_block_id: Option<usize>,
    pub(crate) building_block_type: BBType,
    pub(crate) is_rcv: bool,
    pub(crate) allowed_mutations: Vec<MutationType>,
    pub(crate) graph: Weak<RefCell<GraphData>>,
    pub(crate) payload: Payload,
}

/// A handle to a vertex.
///
/// A vertex owns an ordered list of attachment points; the order is
/// significant and stable, since positions address points in structural
/// comparison and across copies. Handles compare by identity.
#[derive(Clone)]
pub struct Vertex(pub(crate) Rc<RefCell<VertexData>>);

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Vertex {}

impl Vertex {
    pub(crate) fn from_payload(id: VertexId, bbt: BBType, payload: Payload) -> Vertex {
        Vertex(Rc::new(RefCell::new(VertexData {
            id,
            building_block_id: None,
            building_block_type: bbt,
            is_rcv: false,
            allowed_mutations: MutationType::all().to_vec(),
            graph: Weak::new(),
            payload,
        })))
    }

    /// A vertex with no chemical content, to be populated with attachment
    /// points.
    pub fn new_empty() -> Vertex {
        Self::new_empty_with_id(idgen::next_vertex_id())
    }

    /// Like [`Vertex::new_empty`], with a caller-chosen ID. Used when a
    /// library of building blocks instantiates members under stable IDs.
    pub fn new_empty_with_id(id: VertexId) -> Vertex {
        Self::from_payload(
            id,
            BBType::Undefined,
            Payload::Empty {
                aps: Vec::new(),
                sym_aps: Vec::new(),
            },
        )
    }

    /// A vertex backed by a molecular fragment with the given number of
    /// heavy atoms.
    pub fn new_fragment(heavy_atoms: usize) -> Vertex {
        Self::from_payload(
            idgen::next_vertex_id(),
            BBType::Fragment,
            Payload::Fragment {
                aps: Vec::new(),
                sym_aps: Vec::new(),
                heavy_atoms,
                artifact: None,
            },
        )
    }

    pub fn vertex_id(&self) -> VertexId {
        self.0.borrow().id
    }

    pub fn set_vertex_id(&self, id: VertexId) {
        self.0.borrow_mut().id = id;
    }

    /// Index of this building block in its source library, if it came from
    /// one.
    pub fn building_block_id(&self) -> Option<usize> {
        self.0.borrow().building_block_id
    }

    pub fn set_building_block_id(&self, id: Option<usize>) {
        self.0.borrow_mut().building_block_id = id;
    }

    pub fn building_block_type(&self) -> BBType {
        self.0.borrow().building_block_type
    }

    pub fn set_building_block_type(&self, bbt: BBType) {
        self.0.borrow_mut().building_block_type = bbt;
    }

    /// Whether this vertex is a ring-closing vertex.
    pub fn is_rcv(&self) -> bool {
        self.0.borrow().is_rcv
    }

    pub fn set_rcv(&self, is_rcv: bool) {
        self.0.borrow_mut().is_rcv = is_rcv;
    }

    pub fn kind(&self) -> VertexKind {
        match self.0.borrow().payload {
            Payload::Empty { .. } => VertexKind::Empty,
            Payload::Fragment { .. } => VertexKind::Fragment,
            Payload::Template(_) => VertexKind::Template,
        }
    }

    pub fn is_template(&self) -> bool {
        self.kind() == VertexKind::Template
    }

    /// The graph this vertex currently belongs to, if any.
    pub fn graph_owner(&self) -> Option<Graph> {
        self.0.borrow().graph.upgrade().map(Graph)
    }

    pub(crate) fn set_graph_owner(&self, graph: Option<&Graph>) {
        self.0.borrow_mut().graph = match graph {
            Some(g) => Rc::downgrade(&g.0),
            None => Weak::new(),
        };
    }

    // ---- attachment points ----

    /// Adds a plain attachment point with no class, atom, or geometry.
    pub fn add_ap(&self) -> Ap {
        self.add_ap_full(None, None, None)
    }

    pub fn add_ap_with_class(&self, class: ApClass) -> Ap {
        self.add_ap_full(None, None, Some(class))
    }

    /// Adds an attachment point with the given properties.
    ///
    /// A vertex whose only attachment point carries a ring-closing class is
    /// marked as a ring-closing vertex.
    ///
    /// # Panics
    ///
    /// Panics on a template: its points are projections of its inner graph
    /// and cannot be added free-standing. Declare required points instead.
    pub fn add_ap_full(
        &self,
        atom_pos: Option<usize>,
        dir_vec: Option<[f64; 3]>,
        class: Option<ApClass>,
    ) -> Ap {
        let ap = Ap::new_unowned(atom_pos, dir_vec, class);
        ap.set_owner(self);
        let mut d = self.0.borrow_mut();
        match &mut d.payload {
            Payload::Empty { aps, .. } | Payload::Fragment { aps, .. } => aps.push(ap.clone()),
            Payload::Template(_) => panic!(
                "attachment points of a template are projections of its inner \
                 graph and cannot be added directly"
            ),
        }
        let single_ring_closer = match &d.payload {
            Payload::Empty { aps, .. } | Payload::Fragment { aps, .. } => {
                aps.len() == 1
                    && aps[0]
                        .ap_class()
                        .is_some_and(|c| c.is_ring_closing())
            }
            Payload::Template(_) => false,
        };
        if single_ring_closer {
            d.is_rcv = true;
        }
        drop(d);
        ap
    }

    /// The ordered attachment points of this vertex. For a template these
    /// are the outer projections, in projection-map order.
    pub fn aps(&self) -> Vec<Ap> {
        let d = self.0.borrow();
        match &d.payload {
            Payload::Empty { aps, .. } | Payload::Fragment { aps, .. } => aps.clone(),
            Payload::Template(t) => t.inner_to_outer.values().cloned().collect(),
        }
    }

    pub fn ap(&self, index: usize) -> Option<Ap> {
        self.aps().get(index).cloned()
    }

    pub fn ap_count(&self) -> usize {
        let d = self.0.borrow();
        match &d.payload {
            Payload::Empty { aps, .. } | Payload::Fragment { aps, .. } => aps.len(),
            Payload::Template(t) => t.inner_to_outer.len(),
        }
    }

    /// Position of the given point in this vertex's ordered list.
    pub fn index_of_ap(&self, ap: &Ap) -> Option<usize> {
        self.aps().iter().position(|a| a == ap)
    }

    pub fn free_aps(&self) -> Vec<Ap> {
        self.aps().into_iter().filter(Ap::is_available).collect()
    }

    pub fn free_ap_count(&self) -> usize {
        self.aps().iter().filter(|a| a.is_available()).count()
    }

    pub fn has_free_ap(&self) -> bool {
        self.aps().iter().any(|a| a.is_available())
    }

    /// Points free at every level of template embedding.
    pub fn free_aps_throughout(&self) -> Vec<Ap> {
        self.aps()
            .into_iter()
            .filter(Ap::is_available_throughout)
            .collect()
    }

    pub fn free_ap_count_throughout(&self) -> usize {
        self.free_aps_throughout().len()
    }

    /// Points whose user edge, at this level, leads to a capping group.
    pub fn capped_aps(&self) -> Vec<Ap> {
        self.aps()
            .into_iter()
            .filter(|ap| {
                ap.linked_ap()
                    .and_then(|l| l.owner())
                    .is_some_and(|v| v.building_block_type() == BBType::Cap)
            })
            .collect()
    }

    /// Like [`Vertex::capped_aps`], with the using edge possibly living at
    /// an outer embedding level.
    pub fn capped_aps_throughout(&self) -> Vec<Ap> {
        self.aps()
            .into_iter()
            .filter(|ap| {
                !ap.is_available_throughout()
                    && ap
                        .linked_ap_throughout()
                        .and_then(|l| l.owner())
                        .is_some_and(|v| v.building_block_type() == BBType::Cap)
            })
            .collect()
    }

    pub fn capped_ap_count_throughout(&self) -> usize {
        self.capped_aps_throughout().len()
    }

    /// All distinct classes carried by this vertex's points, in point order.
    pub fn all_ap_classes(&self) -> Vec<ApClass> {
        let mut out: Vec<ApClass> = Vec::new();
        for ap in self.aps() {
            if let Some(c) = ap.ap_class() {
                if !out.contains(&c) {
                    out.push(c);
                }
            }
        }
        out
    }

    /// Classes carried by points still free at this level.
    pub fn all_available_ap_classes(&self) -> Vec<ApClass> {
        let mut out: Vec<ApClass> = Vec::new();
        for ap in self.free_aps() {
            if let Some(c) = ap.ap_class() {
                if !out.contains(&c) {
                    out.push(c);
                }
            }
        }
        out
    }

    // ---- symmetry ----

    /// The symmetric-point equivalence classes of this vertex, as positions
    /// in the point list. For a template these are derived from the inner
    /// graph's symmetry information.
    pub fn symmetric_ap_sets(&self) -> Vec<SymmetricAps> {
        if self.is_template() {
            return self.template_symmetric_ap_sets();
        }
        let d = self.0.borrow();
        match &d.payload {
            Payload::Empty { sym_aps, .. } | Payload::Fragment { sym_aps, .. } => {
                sym_aps.iter().map(|s| s.duplicate()).collect()
            }
            Payload::Template(_) => unreachable!(),
        }
    }

    /// Declares the symmetric-point classes of this vertex. Ignored on a
    /// template, whose classes are always derived, never declared.
    pub fn set_symmetric_ap_sets(&self, sets: Vec<SymmetricAps>) {
        let mut d = self.0.borrow_mut();
        match &mut d.payload {
            Payload::Empty { sym_aps, .. } | Payload::Fragment { sym_aps, .. } => *sym_aps = sets,
            Payload::Template(_) => {}
        }
    }

    /// The equivalence class containing the point at the given position.
    pub fn symmetric_aps(&self, ap_index: usize) -> Option<SymmetricAps> {
        self.symmetric_ap_sets()
            .into_iter()
            .find(|s| s.contains(&ap_index))
    }

    // ---- tree traversal ----

    /// The vertex on the source side of the edge that targets this vertex.
    pub fn parent(&self) -> Option<Vertex> {
        self.edge_to_parent()?.src_vertex()
    }

    /// The edge in which this vertex is the target, if any.
    pub fn edge_to_parent(&self) -> Option<Edge> {
        for ap in self.aps() {
            if let Some(e) = ap.edge_user() {
                if e.trg_ap() == ap {
                    return Some(e);
                }
            }
        }
        None
    }

    /// Vertices on the target side of edges sourced at this vertex, at this
    /// graph level.
    pub fn children(&self) -> Vec<Vertex> {
        let mut out = Vec::new();
        for ap in self.aps() {
            if ap.is_src_in_user() {
                if let Some(child) = ap.linked_ap().and_then(|l| l.owner()) {
                    out.push(child);
                }
            }
        }
        out
    }

    /// Like [`Vertex::children`], crossing template boundaries: an edge
    /// using a projection of one of this vertex's points also counts.
    pub fn children_throughout(&self) -> Vec<Vertex> {
        let mut out = Vec::new();
        for ap in self.aps() {
            if ap.is_src_in_user_throughout() {
                if let Some(child) = ap.linked_ap_throughout().and_then(|l| l.owner()) {
                    out.push(child);
                }
            }
        }
        out
    }

    /// Whether an edge at this level connects this vertex to the other.
    pub fn connected_to(&self, other: &Vertex) -> bool {
        self.edge_with(other).is_some()
    }

    /// The edge connecting this vertex to the other at this level, if any.
    pub fn edge_with(&self, other: &Vertex) -> Option<Edge> {
        for ap in self.aps() {
            if let Some(e) = ap.edge_user() {
                let far = if e.src_ap() == ap {
                    e.trg_vertex()
                } else {
                    e.src_vertex()
                };
                if far.as_ref() == Some(other) {
                    return Some(e);
                }
            }
        }
        None
    }

    // ---- mutation bookkeeping ----

    /// The raw allow-list of mutation kinds, before context filtering.
    pub fn allowed_mutation_types(&self) -> Vec<MutationType> {
        self.0.borrow().allowed_mutations.clone()
    }

    pub fn set_allowed_mutation_types(&self, kinds: Vec<MutationType>) {
        self.0.borrow_mut().allowed_mutations = kinds;
    }

    /// Removes a kind from the allow-list. Returns whether it was present.
    pub fn remove_allowed_mutation(&self, kind: MutationType) -> bool {
        let mut d = self.0.borrow_mut();
        match d.allowed_mutations.iter().position(|k| *k == kind) {
            Some(i) => {
                d.allowed_mutations.remove(i);
                true
            }
            None => false,
        }
    }

    /// The mutation kinds currently legal on this vertex, re-evaluated from
    /// the surrounding graph on every call.
    pub fn mutation_types(&self, excluded: &[MutationType]) -> Vec<MutationType> {
        let mut kinds = if self.is_template() && self.building_block_type() == BBType::Scaffold {
            // A scaffold template tolerates only changes that keep it in
            // place as the root of the structure, and none at all when its
            // surface exposes no attachment point.
            if self.ap_count() == 0 {
                Vec::new()
            } else {
                let mut k = vec![MutationType::Extend, MutationType::ChangeLink];
                if !self.children().is_empty() {
                    k.push(MutationType::AddLink);
                }
                k
            }
        } else {
            self.context_filtered_mutations()
        };
        kinds.retain(|k| !excluded.contains(k));
        kinds
    }

    fn context_filtered_mutations(&self) -> Vec<MutationType> {
        let mut kinds = self.allowed_mutation_types();
        if self.children().is_empty() {
            kinds.retain(|k| *k != MutationType::AddLink && *k != MutationType::ChangeLink);
        }
        let free_throughout = self.free_ap_count_throughout();
        let capped_throughout = self.capped_ap_count_throughout();
        if free_throughout + self.capped_aps().len() == 0 {
            kinds.retain(|k| *k != MutationType::Extend);
        }
        if let Some(graph) = self.graph_owner() {
            if graph.vertex_count() == 1 {
                kinds.retain(|k| *k != MutationType::Delete);
            }
        }
        // A branch point: more than two points engaged by something other
        // than a capping group.
        if self.ap_count() - capped_throughout - free_throughout > 2 {
            kinds.retain(|k| *k != MutationType::DeleteChain);
        }
        if self.ap_count() - free_throughout < 2 {
            kinds.retain(|k| *k != MutationType::DeleteLink);
        }
        if self.building_block_type() == BBType::Scaffold {
            kinds.retain(|k| {
                matches!(
                    k,
                    MutationType::Extend | MutationType::ChangeLink | MutationType::AddLink
                )
            });
        }
        kinds
    }

    /// The vertices on which some mutation kind outside the ignore set is
    /// currently legal. Most vertices report themselves or nothing; capping
    /// groups are never mutation sites; templates recurse into their inner
    /// graph according to their contract level.
    pub fn mutation_sites(&self, ignored: &[MutationType]) -> Vec<Vertex> {
        if self.building_block_type() == BBType::Cap {
            return Vec::new();
        }
        if self.is_template() {
            return self.template_mutation_sites(ignored);
        }
        if self.mutation_types(ignored).is_empty() {
            Vec::new()
        } else {
            vec![self.clone()]
        }
    }

    // ---- chemical content ----

    /// Number of heavy atoms this vertex contributes. A template reports
    /// its inner graph's total.
    pub fn heavy_atoms_count(&self) -> usize {
        let inner = {
            let d = self.0.borrow();
            match &d.payload {
                Payload::Empty { .. } => return 0,
                Payload::Fragment { heavy_atoms, .. } => return *heavy_atoms,
                Payload::Template(t) => t.inner_graph.clone(),
            }
        };
        inner.map_or(0, |g| g.heavy_atoms_count())
    }

    pub fn contains_atoms(&self) -> bool {
        self.heavy_atoms_count() > 0
    }

    /// The cached chemical representation, if one was produced and the
    /// structure has not changed since.
    pub fn artifact(&self) -> Option<Artifact> {
        let d = self.0.borrow();
        match &d.payload {
            Payload::Empty { .. } => None,
            Payload::Fragment { artifact, .. } => artifact.clone(),
            Payload::Template(t) => t.artifact.clone(),
        }
    }

    /// Caches a chemical representation. Ignored on an empty vertex, which
    /// has no chemical content to represent.
    pub fn set_artifact(&self, artifact: Artifact) {
        let mut d = self.0.borrow_mut();
        match &mut d.payload {
            Payload::Empty { .. } => {}
            Payload::Fragment { artifact: a, .. } => *a = Some(artifact),
            Payload::Template(t) => t.artifact = Some(artifact),
        }
    }

    pub fn clear_artifact(&self) {
        let mut d = self.0.borrow_mut();
        match &mut d.payload {
            Payload::Empty { .. } => {}
            Payload::Fragment { artifact, .. } => *artifact = None,
            Payload::Template(t) => t.artifact = None,
        }
    }

    // ---- structural equality and cloning ----

    /// Structural equality: same concrete shape, same building-block
    /// provenance, same point counts, and pairwise position-aligned point
    /// equality. Vertex IDs are ignored, so a faithful copy compares equal
    /// to its original.
    pub fn same_as(&self, other: &Vertex) -> bool {
        if self.kind() != other.kind() {
            return false;
        }
        if self.is_template() && !self.same_template_features(other) {
            return false;
        }
        self.same_vertex_features(other)
    }

    pub(crate) fn same_vertex_features(&self, other: &Vertex) -> bool {
        if self.building_block_type() != other.building_block_type()
            || self.building_block_id() != other.building_block_id()
            || self.free_ap_count() != other.free_ap_count()
            || self.ap_count() != other.ap_count()
        {
            return false;
        }
        self.aps()
            .iter()
            .zip(other.aps().iter())
            .all(|(a, b)| a.same_as(b))
    }

    /// A deep, independent copy: same vertex ID and provenance, fresh
    /// attachment point instances, symmetry classes rebuilt over the copy.
    /// The copy belongs to no graph.
    pub fn clone_vertex(&self) -> Vertex {
        if self.is_template() {
            return self.clone_template_vertex();
        }
        let d = self.0.borrow();
        let payload = match &d.payload {
            Payload::Empty { aps, sym_aps } => Payload::Empty {
                aps: aps.iter().map(Ap::clone_ap).collect(),
                sym_aps: sym_aps.iter().map(|s| s.duplicate()).collect(),
            },
            Payload::Fragment {
                aps,
                sym_aps,
                heavy_atoms,
                artifact,
            } => Payload::Fragment {
                aps: aps.iter().map(Ap::clone_ap).collect(),
                sym_aps: sym_aps.iter().map(|s| s.duplicate()).collect(),
                heavy_atoms: *heavy_atoms,
                artifact: artifact.clone(),
            },
            Payload::Template(_) => unreachable!(),
        };
        let copy = Vertex::from_payload(d.id, d.building_block_type, payload);
        {
            let mut cd = copy.0.borrow_mut();
            cd.building_block_id = d.building_block_id;
            cd.is_rcv = d.is_rcv;
            cd.allowed_mutations = d.allowed_mutations.clone();
        }
        for ap in copy.aps() {
            ap.set_owner(&copy);
        }
        copy
    }
}

impl fmt::Debug for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let d = self.0.borrow();
        let kind = match d.payload {
            Payload::Empty { .. } => "Empty",
            Payload::Fragment { .. } => "Fragment",
            Payload::Template(_) => "Template",
        };
        write!(f, "Vertex#{}({kind}, {:?})", d.id, d.building_block_type)
    }
}
