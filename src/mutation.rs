//! Kinds of graph mutation an evolutionary operator may perform.

/// A kind of structural change a vertex can be subjected to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MutationType {
    /// Append a new branch on a free attachment point.
    Extend,
    /// Remove the vertex and the branch rooted at it.
    Delete,
    /// Replace the branch rooted at the vertex with a new one.
    ChangeBranch,
    /// Replace the vertex while keeping its connections.
    ChangeLink,
    /// Insert a new vertex between this vertex and one of its children.
    AddLink,
    /// Remove the vertex and directly join its two neighbors.
    DeleteLink,
    /// Remove the chain of vertices this vertex belongs to.
    DeleteChain,
}

impl MutationType {
    /// All mutation kinds, in a fixed order.
    pub fn all() -> [MutationType; 7] {
        [
            MutationType::Extend,
            MutationType::Delete,
            MutationType::ChangeBranch,
            MutationType::ChangeLink,
            MutationType::AddLink,
            MutationType::DeleteLink,
            MutationType::DeleteChain,
        ]
    }
}
