//! Process-wide sources of unique identifiers.
//!
//! Attachment points and vertices each draw their IDs from a monotonically
//! increasing atomic counter shared by the whole process. Counters can be
//! pushed forward to stay ahead of IDs observed elsewhere (for example when
//! a map detects a key collision and needs to re-mint an ID), but they can
//! never move backward.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier of an attachment point.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ApId(u64);

/// Unique identifier of a vertex.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct VertexId(u64);

/// Unique identifier of a graph.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct GraphId(u64);

impl ApId {
    pub fn value(self) -> u64 {
        self.0
    }

    pub(crate) fn from_raw(value: u64) -> ApId {
        ApId(value)
    }
}

impl VertexId {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl GraphId {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ApId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

static AP_ID: AtomicU64 = AtomicU64::new(1);
static VERTEX_ID: AtomicU64 = AtomicU64::new(1);
static GRAPH_ID: AtomicU64 = AtomicU64::new(1);

/// Mints the next attachment point ID.
pub fn next_ap_id() -> ApId {
    ApId(AP_ID.fetch_add(1, Ordering::Relaxed))
}

/// Mints the next vertex ID.
pub fn next_vertex_id() -> VertexId {
    VertexId(VERTEX_ID.fetch_add(1, Ordering::Relaxed))
}

/// Mints the next graph ID.
pub fn next_graph_id() -> GraphId {
    GraphId(GRAPH_ID.fetch_add(1, Ordering::Relaxed))
}

/// Ensures every AP ID minted from now on is strictly greater than `seen`.
///
/// Moves the counter forward only; if it is already past `seen` this is a
/// no-op.
pub fn ensure_ap_id_beyond(seen: ApId) {
    AP_ID.fetch_max(seen.0 + 1, Ordering::Relaxed);
}

/// Ensures every vertex ID minted from now on is strictly greater than
/// `seen`.
pub fn ensure_vertex_id_beyond(seen: VertexId) {
    VERTEX_ID.fetch_max(seen.0 + 1, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ap_ids_are_strictly_increasing() {
        let a = next_ap_id();
        let b = next_ap_id();
        let c = next_ap_id();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn ensure_beyond_skips_past_seen_value() {
        let seen = ApId(next_ap_id().value() + 1000);
        ensure_ap_id_beyond(seen);
        assert!(next_ap_id() > seen);
    }

    #[test]
    fn ensure_beyond_never_moves_backward() {
        let current = next_vertex_id();
        ensure_vertex_id_beyond(VertexId(1));
        assert!(next_vertex_id() > current);
    }
}
