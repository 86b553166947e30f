//! Query value objects for filtering vertices and edges.
//!
//! Every field is optional; `None` means "any". A query with no fields set
//! matches everything.

use crate::apclass::ApClass;
use crate::edge::{BondType, Edge};
use crate::idgen::VertexId;
use crate::vertex::{BBType, Vertex, VertexKind};

#[derive(Debug, Clone, Default)]
pub struct EdgeQuery {
    pub src_vertex_id: Option<VertexId>,
    pub trg_vertex_id: Option<VertexId>,
    pub src_ap_index: Option<usize>,
    pub trg_ap_index: Option<usize>,
    pub src_ap_class: Option<ApClass>,
    pub trg_ap_class: Option<ApClass>,
    pub bond_type: Option<BondType>,
}

impl EdgeQuery {
    pub fn matches(&self, edge: &Edge) -> bool {
        let check_id = |want: &Option<VertexId>, got: Option<Vertex>| match want {
            Some(id) => got.is_some_and(|v| v.vertex_id() == *id),
            None => true,
        };
        check_id(&self.src_vertex_id, edge.src_vertex())
            && check_id(&self.trg_vertex_id, edge.trg_vertex())
            && self
                .src_ap_index
                .is_none_or(|i| edge.src_ap().index_in_owner() == Some(i))
            && self
                .trg_ap_index
                .is_none_or(|i| edge.trg_ap().index_in_owner() == Some(i))
            && match &self.src_ap_class {
                Some(c) => edge.src_ap().ap_class().as_ref() == Some(c),
                None => true,
            }
            && match &self.trg_ap_class {
                Some(c) => edge.trg_ap().ap_class().as_ref() == Some(c),
                None => true,
            }
            && self.bond_type.is_none_or(|b| edge.bond_type() == b)
    }
}

#[derive(Debug, Clone, Default)]
pub struct VertexQuery {
    pub vertex_id: Option<VertexId>,
    pub building_block_id: Option<usize>,
    pub building_block_type: Option<BBType>,
    pub kind: Option<VertexKind>,
    /// Constraint on the edge that makes this vertex a child.
    pub incoming_edge: Option<EdgeQuery>,
    /// Constraint satisfied by at least one edge sourced at this vertex.
    pub outgoing_edge: Option<EdgeQuery>,
}

impl VertexQuery {
    pub fn matches(&self, vertex: &Vertex) -> bool {
        if self
            .vertex_id
            .is_some_and(|id| vertex.vertex_id() != id)
        {
            return false;
        }
        if self.building_block_id.is_some()
            && vertex.building_block_id() != self.building_block_id
        {
            return false;
        }
        if self
            .building_block_type
            .is_some_and(|t| vertex.building_block_type() != t)
        {
            return false;
        }
        if self.kind.is_some_and(|k| vertex.kind() != k) {
            return false;
        }
        if let Some(eq) = &self.incoming_edge {
            match vertex.edge_to_parent() {
                Some(e) => {
                    if !eq.matches(&e) {
                        return false;
                    }
                }
                None => return false,
            }
        }
        if let Some(eq) = &self.outgoing_edge {
            let any = vertex.aps().iter().any(|ap| {
                ap.edge_user()
                    .is_some_and(|e| e.src_ap() == *ap && eq.matches(&e))
            });
            if !any {
                return false;
            }
        }
        true
    }
}
