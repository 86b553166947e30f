//! Cross-module scenarios: templates embedded in graphs embedded in
//! templates, and the boundary-crossing views that must stay consistent.

use apgraph::{BBType, BondType, ContractLevel, Graph, MutationType, Vertex};

fn fragment(classes: &[&str]) -> Vertex {
    let v = Vertex::new_fragment(1);
    for c in classes {
        v.add_ap_with_class(c.parse().unwrap());
    }
    v
}

/// A template whose inner graph is a single fragment with the given free
/// classes.
fn simple_template(classes: &[&str]) -> (Vertex, Vertex) {
    let inner = fragment(classes);
    let g = Graph::new();
    g.add_vertex(&inner);
    let t = Vertex::new_template(BBType::Fragment);
    t.set_inner_graph(g).unwrap();
    (t, inner)
}

#[test]
fn two_level_projection_chain_stays_consistent() {
    // Deepest level: a fragment inside a template.
    let (t2, leaf) = simple_template(&["R1:0"]);

    // Middle level: that template inside another template's inner graph.
    let mid = Graph::new();
    mid.add_vertex(&t2);
    let t1 = Vertex::new_template(BBType::Fragment);
    t1.set_inner_graph(mid).unwrap();
    assert_eq!(t1.ap_count(), 1);

    // Outermost level: the outer template used in a regular graph.
    let top = Graph::new();
    top.add_vertex(&t1);
    let partner = fragment(&["R1:0"]);
    top.add_vertex(&partner);
    let surface = t1.aps()[0].clone();
    top.add_edge(&surface, &partner.aps()[0], BondType::Single)
        .unwrap();

    let deepest = leaf.aps()[0].clone();
    // The surface point unwraps through both boundaries.
    assert_eq!(surface.embedded_ap(), deepest);
    // Free where it lives, engaged when the whole embedding is considered.
    assert!(deepest.is_available());
    assert!(!deepest.is_available_throughout());
    assert_eq!(
        deepest.linked_ap_throughout().unwrap().owner(),
        Some(partner.clone())
    );
    assert!(deepest.is_src_in_user_throughout());
    // Seen from outside, the edge source resolves to the deepest point.
    let edge = surface.edge_user().unwrap();
    assert_eq!(edge.src_ap_throughout(), deepest);
    assert_eq!(t1.children_throughout(), vec![partner]);
}

#[test]
fn late_projection_propagates_to_the_enclosing_template() {
    let (t2, leaf) = simple_template(&["R1:0"]);
    let mid = Graph::new();
    mid.add_vertex(&t2);
    let t1 = Vertex::new_template(BBType::Fragment);
    t1.set_inner_graph(mid).unwrap();
    assert_eq!(t1.ap_count(), 1);

    // A point added to the leaf after assembly is projected explicitly;
    // the projection must climb all the way to the outermost surface.
    let extra = leaf.add_ap_with_class("R2:0".parse().unwrap());
    t2.add_inner_to_outer_mapping(&extra);
    assert_eq!(t2.ap_count(), 2);
    assert_eq!(t1.ap_count(), 2);
    let new_outer = t2.outer_ap_of_inner(&extra).unwrap();
    let top_surface = t1.outer_ap_of_inner(&new_outer).unwrap();
    assert_eq!(top_surface.embedded_ap(), extra);

    // Re-projecting an already mapped point changes nothing.
    t2.add_inner_to_outer_mapping(&extra);
    assert_eq!(t2.ap_count(), 2);
    assert_eq!(t1.ap_count(), 2);
}

#[test]
fn removing_a_used_projection_removes_the_outer_branch_first() {
    let (t, inner) = simple_template(&["R1:0", "R2:0"]);

    let outer_graph = Graph::new();
    outer_graph.add_vertex(&t);
    let p1 = fragment(&["R1:0", "link:0"]);
    let p2 = fragment(&["link:0"]);
    outer_graph.add_vertex(&p1);
    outer_graph.add_vertex(&p2);

    let used_inner = inner.aps()[0].clone();
    let surface = t.outer_ap_of_inner(&used_inner).unwrap();
    outer_graph
        .add_edge(&surface, &p1.aps()[0], BondType::Single)
        .unwrap();
    outer_graph
        .add_edge(&p1.aps()[1], &p2.aps()[0], BondType::Single)
        .unwrap();
    assert_eq!(outer_graph.vertex_count(), 3);

    t.remove_projection_of_inner_ap(&used_inner);

    // The whole branch hanging off the projection is gone, and so is the
    // mapping entry.
    assert_eq!(outer_graph.vertex_count(), 1);
    assert!(!outer_graph.contains_vertex(&p1));
    assert!(!outer_graph.contains_vertex(&p2));
    assert_eq!(outer_graph.edge_count(), 0);
    assert!(t.outer_ap_of_inner(&used_inner).is_none());
    assert_eq!(t.ap_count(), 1);
    // The point itself was never touched at its own level.
    assert!(used_inner.is_available());
}

#[test]
fn contract_levels_gate_mutation_site_recursion() {
    // Inner graph: parent with a child, so the parent keeps ChangeLink
    // under a structure-preserving contract.
    let parent = fragment(&["R1:0", "link:0"]);
    let child = fragment(&["link:0"]);
    let g = Graph::new();
    g.add_vertex(&parent);
    g.add_vertex(&child);
    g.add_edge(&parent.aps()[1], &child.aps()[0], BondType::Single)
        .unwrap();

    let t = Vertex::new_template(BBType::Fragment);
    t.set_inner_graph(g).unwrap();

    t.set_contract_level(ContractLevel::Free);
    let free_sites = t.mutation_sites(&[]);
    assert!(free_sites.contains(&parent));
    assert!(!free_sites.contains(&t));

    t.set_contract_level(ContractLevel::FixedStruct);
    let sites = t.mutation_sites(&[]);
    assert_eq!(sites, vec![parent.clone()]);
    assert_eq!(parent.mutation_types(&[]), vec![MutationType::ChangeLink]);

    t.set_contract_level(ContractLevel::Fixed);
    let fixed_sites = t.mutation_sites(&[]);
    assert!(fixed_sites.iter().all(|s| *s == t));
}

#[test]
fn ignore_set_filters_mutation_sites() {
    let v = fragment(&["R1:0", "R2:0"]);
    let g = Graph::new();
    g.add_vertex(&v);
    let legal = v.mutation_types(&[]);
    assert!(!legal.is_empty());
    // Ignoring everything legal leaves no site.
    assert!(v.mutation_sites(&legal).is_empty());
    assert_eq!(v.mutation_sites(&[]), vec![v.clone()]);
}

#[test]
fn template_in_graph_deep_copy_preserves_structure() {
    let (t, _) = simple_template(&["R1:0"]);
    let g = Graph::new();
    g.add_vertex(&t);
    let partner = fragment(&["R1:0"]);
    g.add_vertex(&partner);
    g.add_edge(&t.aps()[0], &partner.aps()[0], BondType::Single)
        .unwrap();

    let copy = g.deep_copy();
    assert!(copy.same_as(&g));
    let t_copy = copy.vertices()[0].clone();
    assert!(t_copy.is_template());
    assert_ne!(t_copy.inner_graph().unwrap(), t.inner_graph().unwrap());
    // The copied surface is wired to the copied inner graph.
    let surface = t_copy.aps()[0].clone();
    let inner = t_copy.inner_ap_of_outer(&surface).unwrap();
    assert_eq!(
        inner.owner().unwrap().graph_owner(),
        t_copy.inner_graph()
    );
    assert!(!surface.is_available());
}

#[test]
fn scaffold_template_offers_addlink_only_with_children() {
    let (t, _) = simple_template(&["R1:0"]);
    t.set_building_block_type(BBType::Scaffold);
    let kinds = t.mutation_types(&[]);
    assert_eq!(kinds, vec![MutationType::Extend, MutationType::ChangeLink]);

    let g = Graph::new();
    g.add_vertex(&t);
    let partner = fragment(&["R1:0"]);
    g.add_vertex(&partner);
    g.add_edge(&t.aps()[0], &partner.aps()[0], BondType::Single)
        .unwrap();
    let kinds = t.mutation_types(&[]);
    assert!(kinds.contains(&MutationType::AddLink));
}
