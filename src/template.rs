//! Templates: vertices that encapsulate an entire nested graph.

use std::cmp::Ordering;

use crate::ap::Ap;
use crate::apclass::ApClass;
use crate::apmap::UniqueApMap;
use crate::graph::{Graph, GraphError};
use crate::idgen;
use crate::mutation::MutationType;
use crate::symmetry::SymmetricAps;
use crate::vertex::{Artifact, BBType, Payload, Vertex};

/// How much of a template's inner graph may still change.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ContractLevel {
    /// Anything inside may change; mutation sites recurse fully.
    Free,
    /// Inner vertex identities may change but the topology may not.
    FixedStruct,
    /// The template is an opaque leaf; nothing inside may change.
    #[default]
    Fixed,
}

/// The mutation kinds a structure-preserving contract strips from inner
/// vertices.
const TOPOLOGY_CHANGING: [MutationType; 6] = [
    MutationType::Delete,
    MutationType::DeleteChain,
    MutationType::ChangeBranch,
    MutationType::AddLink,
    MutationType::DeleteLink,
    MutationType::Extend,
];

pub(crate) struct TemplateData {
    pub(crate) inner_graph: Option<Graph>,
    pub(crate) required_aps: Vec<Ap>,
    pub(crate) inner_to_outer: UniqueApMap,
    pub(crate) contract: ContractLevel,
    pub(crate) artifact: Option<Artifact>,
}

impl TemplateData {
    pub(crate) fn new() -> TemplateData {
        TemplateData {
            inner_graph: None,
            required_aps: Vec::new(),
            inner_to_outer: UniqueApMap::new(),
            contract: ContractLevel::default(),
            artifact: None,
        }
    }
}

/// Template-specific operations.
///
/// All of these panic when called on a vertex that is not a template; use
/// [`Vertex::is_template`] to guard when the shape is not known statically.
impl Vertex {
    /// A template with no inner graph yet.
    pub fn new_template(bbt: BBType) -> Vertex {
        Vertex::from_payload(
            idgen::next_vertex_id(),
            bbt,
            Payload::Template(TemplateData::new()),
        )
    }

    fn template<R>(&self, f: impl FnOnce(&TemplateData) -> R) -> R {
        let d = self.0.borrow();
        match &d.payload {
            Payload::Template(t) => f(t),
            _ => panic!("template operation invoked on non-template vertex {}", d.id),
        }
    }

    fn template_mut<R>(&self, f: impl FnOnce(&mut TemplateData) -> R) -> R {
        let mut d = self.0.borrow_mut();
        let id = d.id;
        match &mut d.payload {
            Payload::Template(t) => f(t),
            _ => panic!("template operation invoked on non-template vertex {id}"),
        }
    }

    pub fn inner_graph(&self) -> Option<Graph> {
        self.template(|t| t.inner_graph.clone())
    }

    pub fn contract_level(&self) -> ContractLevel {
        self.template(|t| t.contract)
    }

    /// Sets the contract level. Entering [`ContractLevel::FixedStruct`]
    /// strips every topology-changing mutation kind from the inner
    /// vertices' allow-lists and cascades the level onto nested templates.
    pub fn set_contract_level(&self, level: ContractLevel) {
        if level == ContractLevel::FixedStruct {
            self.apply_fixed_structure_contract();
        }
        self.template_mut(|t| t.contract = level);
    }

    /// Forces the contract to [`ContractLevel::Fixed`]. Returns whether the
    /// template was already frozen.
    pub fn freeze(&self) -> bool {
        self.template_mut(|t| {
            let was_frozen = t.contract == ContractLevel::Fixed;
            t.contract = ContractLevel::Fixed;
            was_frozen
        })
    }

    fn apply_fixed_structure_contract(&self) {
        let Some(graph) = self.inner_graph() else {
            return;
        };
        for v in graph.vertices() {
            for kind in TOPOLOGY_CHANGING {
                v.remove_allowed_mutation(kind);
            }
            if v.is_template() {
                v.set_contract_level(ContractLevel::FixedStruct);
            }
        }
    }

    /// Declares an attachment point the future inner graph must provide a
    /// free counterpart for. Rejected once an inner graph is in place.
    pub fn add_required_ap(
        &self,
        dir_vec: Option<[f64; 3]>,
        class: Option<ApClass>,
    ) -> Result<Ap, GraphError> {
        if self.inner_graph().is_some() {
            return Err(GraphError::RequiredApsLocked);
        }
        let ap = Ap::new_unowned(None, dir_vec, class);
        ap.set_owner(self);
        self.template_mut(|t| t.required_aps.push(ap.clone()));
        Ok(ap)
    }

    pub fn required_aps(&self) -> Vec<Ap> {
        self.template(|t| t.required_aps.clone())
    }

    /// Installs (or replaces) the inner graph.
    ///
    /// Any cached chemical representation is dropped. The graph is rejected
    /// unless its free attachment points can cover every required class
    /// under a greedy class-sorted match; on `Err` the template keeps its
    /// previous inner graph. On success the whole projection map is rebuilt:
    /// one fresh outer point per free inner point.
    pub fn set_inner_graph(&self, graph: Graph) -> Result<(), GraphError> {
        self.clear_artifact();
        self.check_required_ap_contract(&graph)?;
        let previous = self.template_mut(|t| {
            let old = t.inner_graph.replace(graph.clone());
            t.inner_to_outer = UniqueApMap::new();
            old
        });
        if let Some(old) = previous {
            old.set_template_jacket(None);
        }
        graph.set_template_jacket(Some(self));
        for inner in graph.available_aps() {
            self.add_inner_to_outer_mapping(&inner);
        }
        Ok(())
    }

    /// Greedy multiset match: both the required classes and the free inner
    /// classes are sorted, then each required class consumes the first
    /// remaining free point of the same class.
    fn check_required_ap_contract(&self, graph: &Graph) -> Result<(), GraphError> {
        let required = self.required_aps();
        if required.is_empty() {
            return Ok(());
        }
        let mut wanted: Vec<Option<ApClass>> =
            required.iter().map(|ap| ap.ap_class()).collect();
        let mut free: Vec<Option<ApClass>> = graph
            .available_aps()
            .iter()
            .map(|ap| ap.ap_class())
            .collect();
        wanted.sort_by(cmp_opt_class);
        free.sort_by(cmp_opt_class);

        let mut j = 0;
        'wanted: for want in wanted {
            while j < free.len() {
                let candidate = free[j].clone();
                j += 1;
                if candidate == want {
                    continue 'wanted;
                }
            }
            return Err(GraphError::ContractUnsatisfied(want));
        }
        Ok(())
    }

    /// Projects an inner attachment point onto the outer surface. A no-op
    /// when the point is already mapped. The projection propagates outward
    /// through any enclosing template, so multi-level nesting stays
    /// consistent.
    pub fn add_inner_to_outer_mapping(&self, inner: &Ap) {
        if self.template(|t| t.inner_to_outer.contains_key(inner)) {
            return;
        }
        let outer = inner.clone_ap();
        outer.set_owner(self);
        self.template_mut(|t| {
            t.inner_to_outer.insert(inner.clone(), outer.clone());
        });
        if let Some(graph) = self.graph_owner() {
            if let Some(jacket) = graph.template_jacket() {
                jacket.add_inner_to_outer_mapping(&outer);
            }
        }
    }

    /// The outer projection of a mapped inner point.
    pub fn outer_ap_of_inner(&self, inner: &Ap) -> Option<Ap> {
        self.template(|t| t.inner_to_outer.get(inner))
    }

    /// The inner point a given outer point is the projection of.
    pub fn inner_ap_of_outer(&self, outer: &Ap) -> Option<Ap> {
        self.template(|t| t.inner_to_outer.key_of_value(outer))
    }

    /// Re-keys a projection after the inner point's identity was replaced.
    /// The outer point adopts the new point's class. A no-op when the old
    /// point was never mapped.
    pub fn update_inner_ap_id(&self, old_inner: &Ap, new_inner: &Ap) {
        let Some(outer) = self.template_mut(|t| t.inner_to_outer.remove(old_inner)) else {
            return;
        };
        outer.set_ap_class(new_inner.ap_class());
        self.template_mut(|t| {
            t.inner_to_outer.insert(new_inner.clone(), outer);
        });
    }

    /// Withdraws the projection of an inner point from the outer surface.
    ///
    /// If the projection is in use at the outer level, the entire branch
    /// reachable through the using edge is removed first. The withdrawal
    /// recurses outward through enclosing templates before the mapping
    /// entry is dropped.
    pub fn remove_projection_of_inner_ap(&self, inner: &Ap) {
        let Some(outer) = self.outer_ap_of_inner(inner) else {
            return;
        };
        if !outer.is_available() {
            if let Some(branch_root) = outer.linked_ap().and_then(|l| l.owner()) {
                if let Some(graph) = self.graph_owner() {
                    graph.remove_branch_starting_at(&branch_root);
                }
            }
        }
        if let Some(graph) = self.graph_owner() {
            if let Some(jacket) = graph.template_jacket() {
                jacket.remove_projection_of_inner_ap(&outer);
            }
        }
        self.template_mut(|t| {
            t.inner_to_outer.remove(inner);
        });
    }

    pub(crate) fn template_mutation_sites(&self, ignored: &[MutationType]) -> Vec<Vertex> {
        match self.contract_level() {
            ContractLevel::Fixed => {
                if self.mutation_types(ignored).is_empty() {
                    Vec::new()
                } else {
                    vec![self.clone()]
                }
            }
            level @ (ContractLevel::Free | ContractLevel::FixedStruct) => {
                // Vertices may have joined the inner graph since the level
                // was set; the strip must cover them too.
                if level == ContractLevel::FixedStruct {
                    self.apply_fixed_structure_contract();
                }
                match self.inner_graph() {
                    Some(graph) => graph
                        .vertices()
                        .iter()
                        .flat_map(|v| v.mutation_sites(ignored))
                        .collect(),
                    None => Vec::new(),
                }
            }
        }
    }

    /// Derives the symmetric classes of the outer surface from three
    /// sources of inner symmetry: the inner vertex's own symmetric points,
    /// points at the same position on symmetric sibling vertices, and the
    /// siblings' own symmetric-point data when they carry any. Every mapped
    /// point joins at most one class.
    pub(crate) fn template_symmetric_ap_sets(&self) -> Vec<SymmetricAps> {
        let Some(inner_graph) = self.inner_graph() else {
            return Vec::new();
        };
        let keys: Vec<Ap> = self.template(|t| t.inner_to_outer.keys().cloned().collect());
        let index_of = |ap: &Ap| keys.iter().position(|k| k == ap);

        let mut done: Vec<Ap> = Vec::new();
        let mut classes = Vec::new();
        for inner in &keys {
            if done.contains(inner) {
                continue;
            }
            let Some(owner) = inner.owner() else {
                continue;
            };
            let Some(idx) = inner.index_in_owner() else {
                continue;
            };
            let mut class = SymmetricAps::new();
            if let Some(own_set) = owner.symmetric_aps(idx) {
                for &ap_idx in own_set.iter() {
                    let Some(sym) = owner.ap(ap_idx) else {
                        continue;
                    };
                    if done.contains(&sym) {
                        continue;
                    }
                    if let Some(pos) = index_of(&sym) {
                        class.add(pos);
                        done.push(sym);
                    }
                }
            }
            for sibling in inner_graph.sym_vertices_for(&owner) {
                if sibling == owner {
                    continue;
                }
                if let Some(sib_set) = sibling.symmetric_aps(idx) {
                    for &ap_idx in sib_set.iter() {
                        let Some(sym) = sibling.ap(ap_idx) else {
                            continue;
                        };
                        if done.contains(&sym) {
                            continue;
                        }
                        if let Some(pos) = index_of(&sym) {
                            class.add(pos);
                            done.push(sym);
                        }
                    }
                } else if let Some(sym) = sibling.ap(idx) {
                    if !done.contains(&sym) {
                        if let Some(pos) = index_of(&sym) {
                            class.add(pos);
                            done.push(sym);
                        }
                    }
                }
            }
            if !class.is_empty() {
                if let Some(pos) = index_of(inner) {
                    class.add(pos);
                }
                if !done.contains(inner) {
                    done.push(inner.clone());
                }
                if class.len() > 1 {
                    classes.push(class);
                }
            }
        }
        classes
    }

    pub(crate) fn same_template_features(&self, other: &Vertex) -> bool {
        if !other.is_template() {
            return false;
        }
        if self.contract_level() != other.contract_level() {
            return false;
        }
        let mine = self.required_aps();
        let theirs = other.required_aps();
        if mine.len() != theirs.len()
            || !mine.iter().zip(theirs.iter()).all(|(a, b)| a.same_as(b))
        {
            return false;
        }
        match (self.inner_graph(), other.inner_graph()) {
            (None, None) => true,
            (Some(a), Some(b)) => a.same_as(&b),
            _ => false,
        }
    }

    pub(crate) fn clone_template_vertex(&self) -> Vertex {
        let copy = {
            let d = self.0.borrow();
            Vertex::from_payload(
                d.id,
                d.building_block_type,
                Payload::Template(TemplateData::new()),
            )
        };
        {
            let d = self.0.borrow();
            let mut cd = copy.0.borrow_mut();
            cd.building_block_id = d.building_block_id;
            cd.is_rcv = d.is_rcv;
            cd.allowed_mutations = d.allowed_mutations.clone();
        }
        for required in self.required_aps() {
            let rc = required.clone_ap();
            rc.set_owner(&copy);
            copy.template_mut(|t| t.required_aps.push(rc.clone()));
        }
        if let Some(graph) = self.inner_graph() {
            let graph_copy = graph.deep_copy();
            copy.set_inner_graph(graph_copy)
                .expect("a copied inner graph satisfies the contract its original satisfied");
        }
        // Install the contract directly: the strip it implies was already
        // applied to the original's vertices and travelled with the copy.
        let contract = self.contract_level();
        copy.template_mut(|t| {
            t.contract = contract;
            t.artifact = self.template(|t| t.artifact.clone());
        });
        copy
    }
}

fn cmp_opt_class(a: &Option<ApClass>, b: &Option<ApClass>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => x.cmp(y),
    }
}
