//! Edge types for the gameplay graph.

use serde::{Deserialize, Serialize};
use super::index::UniqueIndex;

/// Undirected edge between two vertices.
///
/// Stored canonically with `low <= high`, so `Edge::new(a, b) == Edge::new(b, a)`
/// and the derived `Ord` gives a deterministic edge ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    low: UniqueIndex,
    high: UniqueIndex,
}

impl Edge {
    /// Create a new edge. Endpoint order does not matter.
    pub fn new(a: UniqueIndex, b: UniqueIndex) -> Self {
        let (a, b) = (a.finalized(), b.finalized());
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    /// Endpoints in canonical order.
    pub fn endpoints(&self) -> (UniqueIndex, UniqueIndex) {
        (self.low, self.high)
    }

    /// Whether `vertex` is one of the endpoints.
    pub fn contains(&self, vertex: UniqueIndex) -> bool {
        let vertex = vertex.finalized();
        self.low == vertex || self.high == vertex
    }

    /// The endpoint opposite `vertex`, if `vertex` is an endpoint.
    pub fn other(&self, vertex: UniqueIndex) -> Option<UniqueIndex> {
        let vertex = vertex.finalized();
        if self.low == vertex {
            Some(self.high)
        } else if self.high == vertex {
            Some(self.low)
        } else {
            None
        }
    }

    /// Replace endpoint `from` with `to`, keeping canonical order.
    pub fn renamed(&self, from: UniqueIndex, to: UniqueIndex) -> Self {
        match self.other(from) {
            Some(other) => Self::new(other, to),
            None => *self,
        }
    }
}

impl std::fmt::Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}--{}", self.low, self.high)
    }
}
