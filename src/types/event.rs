//! Structural events fired by the graph.

use crate::config::GraphProperties;
use super::handle::{IslandHandle, VertexHandle};
use super::index::UniqueIndex;

/// How an island's connectivity changed during a split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityChange {
    /// This island kept its handle and gave vertices to `targets`.
    SplitTo(Vec<IslandHandle>),
    /// This island was created from vertices of `source`.
    SplitFrom(IslandHandle),
}

/// A structural change to the graph.
///
/// Events carry handles only. They are dispatched synchronously, inline
/// with the mutation that caused them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphEvent {
    /// A vertex was registered.
    VertexCreated(VertexHandle),
    /// An island was registered.
    IslandCreated(IslandHandle),
    /// A new edge was added.
    EdgeCreated(VertexHandle, VertexHandle),
    /// An edge was removed.
    EdgeRemoved(VertexHandle, VertexHandle),
    /// Graph-level properties changed.
    PropertiesChanged(GraphProperties),
    /// A vertex is being removed. Its edges and island membership are already gone.
    VertexRemoved(VertexHandle),
    /// A vertex's parent island changed.
    ParentIslandSet {
        /// The vertex.
        vertex: VertexHandle,
        /// New parent island, `None` when detached.
        island: Option<IslandHandle>,
    },
    /// A vertex was renamed; `old` no longer resolves.
    VertexHandleChanged {
        /// Previous handle.
        old: VertexHandle,
        /// Handle now naming the vertex.
        new: VertexHandle,
    },
    /// A vertex joined an island.
    IslandVertexAdded {
        /// The island.
        island: IslandHandle,
        /// The vertex.
        vertex: VertexHandle,
    },
    /// A vertex left an island.
    IslandVertexRemoved {
        /// The island.
        island: IslandHandle,
        /// The vertex.
        vertex: VertexHandle,
    },
    /// An island was destroyed.
    IslandDestroyed(IslandHandle),
    /// An island took part in a split.
    IslandConnectivityChanged {
        /// The island.
        island: IslandHandle,
        /// Its role in the split.
        change: ConnectivityChange,
    },
}

/// Which element an event is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventScope {
    /// Graph-level event.
    Graph,
    /// Per-vertex event.
    Vertex(UniqueIndex),
    /// Per-island event.
    Island(UniqueIndex),
}

impl GraphEvent {
    /// Scope the event is delivered under.
    pub fn scope(&self) -> EventScope {
        match self {
            Self::VertexCreated(_)
            | Self::IslandCreated(_)
            | Self::EdgeCreated(..)
            | Self::EdgeRemoved(..)
            | Self::PropertiesChanged(_) => EventScope::Graph,
            Self::VertexRemoved(vertex) | Self::ParentIslandSet { vertex, .. } => {
                EventScope::Vertex(vertex.unique_index())
            }
            Self::VertexHandleChanged { new, .. } => EventScope::Vertex(new.unique_index()),
            Self::IslandVertexAdded { island, .. }
            | Self::IslandVertexRemoved { island, .. }
            | Self::IslandDestroyed(island)
            | Self::IslandConnectivityChanged { island, .. } => {
                EventScope::Island(island.unique_index())
            }
        }
    }
}

/// Selects which events a subscription receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventFilter {
    /// Every event, including per-element events of every live element.
    All,
    /// Graph-level events only.
    Graph,
    /// Events about one vertex.
    Vertex(UniqueIndex),
    /// Events about one island.
    Island(UniqueIndex),
}

impl EventFilter {
    /// Whether an event with `scope` passes this filter.
    pub fn matches(&self, scope: EventScope) -> bool {
        match (self, scope) {
            (Self::All, _) => true,
            (Self::Graph, EventScope::Graph) => true,
            (Self::Vertex(a), EventScope::Vertex(b)) => *a == b,
            (Self::Island(a), EventScope::Island(b)) => *a == b,
            _ => false,
        }
    }
}
