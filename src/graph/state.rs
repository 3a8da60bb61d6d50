//! Read-only view of a graph: element maps, lookups and invariant checks.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;

use uuid::Uuid;

use crate::config::{GraphConfig, GraphProperties};
use crate::types::{
    Edge, GraphIdentity, Handle, Island, IslandHandle, UniqueIndex, Vertex, VertexHandle,
};

/// A violated structural invariant, reported by [`GraphState::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    /// `b` is adjacent to `a` but not the other way round.
    #[error("Asymmetric adjacency: {a} lists {b} but not vice versa")]
    AsymmetricAdjacency {
        /// Vertex listing the neighbor.
        a: UniqueIndex,
        /// Neighbor missing the back edge.
        b: UniqueIndex,
    },
    /// A vertex lists itself as neighbor.
    #[error("Self loop on vertex {0}")]
    SelfLoop(UniqueIndex),
    /// A vertex lists a neighbor that does not exist.
    #[error("Vertex {vertex} lists missing neighbor {neighbor}")]
    DanglingNeighbor {
        /// The vertex.
        vertex: UniqueIndex,
        /// The missing neighbor.
        neighbor: UniqueIndex,
    },
    /// A vertex points at an island that does not exist.
    #[error("Vertex {vertex} points at missing island {island}")]
    DanglingParentIsland {
        /// The vertex.
        vertex: UniqueIndex,
        /// The missing island.
        island: UniqueIndex,
    },
    /// Island member set and vertex parent pointer disagree.
    #[error("Island {island} and vertex {vertex} disagree on membership")]
    MembershipMismatch {
        /// The vertex.
        vertex: UniqueIndex,
        /// The island.
        island: UniqueIndex,
    },
    /// Two islands list the same vertex.
    #[error("Vertex {vertex} is listed by islands {first} and {second}")]
    SharedVertex {
        /// The vertex.
        vertex: UniqueIndex,
        /// First island listing it.
        first: UniqueIndex,
        /// Second island listing it.
        second: UniqueIndex,
    },
    /// Recorded edge count does not match adjacency.
    #[error("Edge count drift: adjacency holds {counted}, graph recorded {recorded}")]
    EdgeCountDrift {
        /// Edges found in adjacency sets.
        counted: usize,
        /// Edges recorded by the graph.
        recorded: usize,
    },
    /// An island's members are not connected.
    #[error("Island {0} is not connected")]
    IslandNotConnected(UniqueIndex),
    /// One connected component of islanded vertices spans several islands.
    #[error("Islands {first} and {second} belong to one connected component")]
    ComponentSpansIslands {
        /// First island.
        first: UniqueIndex,
        /// Second island.
        second: UniqueIndex,
    },
}

/// Vertex and island storage of a graph.
///
/// Elements live in maps keyed by finalized unique index. Every query that
/// takes a handle rejects handles issued by another graph, handles whose
/// graph is gone, and temporary handles of staged elements.
pub struct GraphState {
    pub(crate) identity: Arc<GraphIdentity>,
    pub(crate) config: GraphConfig,
    pub(crate) vertices: BTreeMap<UniqueIndex, Vertex>,
    pub(crate) islands: BTreeMap<UniqueIndex, Island>,
    pub(crate) staged_vertices: BTreeMap<UniqueIndex, Vertex>,
    pub(crate) staged_islands: BTreeMap<UniqueIndex, Island>,
    pub(crate) num_edges: usize,
}

impl GraphState {
    pub(crate) fn new(config: GraphConfig) -> Self {
        Self {
            identity: GraphIdentity::new(),
            config,
            vertices: BTreeMap::new(),
            islands: BTreeMap::new(),
            staged_vertices: BTreeMap::new(),
            staged_islands: BTreeMap::new(),
            num_edges: 0,
        }
    }

    /// Identifier of this graph instance.
    pub fn graph_id(&self) -> Uuid {
        self.identity.graph_id()
    }

    /// Active configuration.
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Graph-level properties.
    pub fn properties(&self) -> GraphProperties {
        self.config.properties
    }

    // ─────────────────────────────────────────────────────────────────────
    // Resolution
    // ─────────────────────────────────────────────────────────────────────

    pub(crate) fn resolve_vertex(&self, handle: &VertexHandle) -> Option<UniqueIndex> {
        let index = handle.unique_index();
        if !handle.belongs_to(&self.identity) || index.is_temporary() {
            return None;
        }
        self.vertices.contains_key(&index).then_some(index)
    }

    pub(crate) fn resolve_island(&self, handle: &IslandHandle) -> Option<UniqueIndex> {
        let index = handle.unique_index();
        if !handle.belongs_to(&self.identity) || index.is_temporary() {
            return None;
        }
        self.islands.contains_key(&index).then_some(index)
    }

    pub(crate) fn bound_vertex_handle(&self, index: UniqueIndex) -> VertexHandle {
        Handle::bound(index, &self.identity)
    }

    pub(crate) fn bound_island_handle(&self, index: UniqueIndex) -> IslandHandle {
        Handle::bound(index, &self.identity)
    }

    /// Whether `index` names any live or staged element.
    pub(crate) fn index_in_use(&self, index: UniqueIndex) -> bool {
        let index = index.finalized();
        self.vertices.contains_key(&index)
            || self.islands.contains_key(&index)
            || self.staged_vertices.contains_key(&index)
            || self.staged_islands.contains_key(&index)
    }

    /// Resolve a vertex handle.
    pub fn vertex(&self, handle: &VertexHandle) -> Option<&Vertex> {
        self.resolve_vertex(handle).and_then(|index| self.vertices.get(&index))
    }

    /// Resolve an island handle.
    pub fn island(&self, handle: &IslandHandle) -> Option<&Island> {
        self.resolve_island(handle).and_then(|index| self.islands.get(&index))
    }

    /// Whether the handle names a live vertex of this graph.
    pub fn has_vertex(&self, handle: &VertexHandle) -> bool {
        self.resolve_vertex(handle).is_some()
    }

    /// Whether the handle names a live island of this graph.
    pub fn has_island(&self, handle: &IslandHandle) -> bool {
        self.resolve_island(handle).is_some()
    }

    /// Live vertex by index.
    pub fn vertex_by_index(&self, index: UniqueIndex) -> Option<&Vertex> {
        self.vertices.get(&index.finalized())
    }

    /// Live island by index.
    pub fn island_by_index(&self, index: UniqueIndex) -> Option<&Island> {
        self.islands.get(&index.finalized())
    }

    /// Live handle for a vertex index.
    pub fn vertex_handle(&self, index: UniqueIndex) -> Option<VertexHandle> {
        self.vertex_by_index(index).map(|v| v.handle().clone())
    }

    /// Live handle for an island index.
    pub fn island_handle(&self, index: UniqueIndex) -> Option<IslandHandle> {
        self.island_by_index(index).map(|i| i.handle().clone())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Counts and iteration
    // ─────────────────────────────────────────────────────────────────────

    /// Number of live vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of edges.
    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    /// Number of live islands.
    pub fn num_islands(&self) -> usize {
        self.islands.len()
    }

    /// Number of staged, uncommitted elements.
    pub fn num_staged(&self) -> usize {
        self.staged_vertices.len() + self.staged_islands.len()
    }

    /// Live vertices in index order.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> + '_ {
        self.vertices.values()
    }

    /// Live islands in index order.
    pub fn islands(&self) -> impl Iterator<Item = &Island> + '_ {
        self.islands.values()
    }

    /// Handles of all live vertices.
    pub fn vertex_handles(&self) -> Vec<VertexHandle> {
        self.vertices.values().map(|v| v.handle().clone()).collect()
    }

    /// Handles of all live islands.
    pub fn island_handles(&self) -> Vec<IslandHandle> {
        self.islands.values().map(|i| i.handle().clone()).collect()
    }

    /// Every edge once, in canonical order.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.vertices.iter().flat_map(|(&index, vertex)| {
            vertex
                .neighbors
                .range(index..)
                .filter(move |&&n| n != index)
                .map(move |&n| Edge::new(index, n))
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Adjacency and membership
    // ─────────────────────────────────────────────────────────────────────

    /// Handles of the vertices adjacent to `vertex`.
    pub fn neighbors(&self, vertex: &VertexHandle) -> Vec<VertexHandle> {
        self.vertex(vertex)
            .map(|v| v.neighbors().map(|n| self.bound_vertex_handle(n)).collect())
            .unwrap_or_default()
    }

    /// Whether an edge joins `a` and `b`.
    pub fn are_adjacent(&self, a: &VertexHandle, b: &VertexHandle) -> bool {
        match (self.vertex(a), self.resolve_vertex(b)) {
            (Some(vertex), Some(other)) => vertex.is_adjacent(other),
            _ => false,
        }
    }

    /// Island the vertex belongs to.
    pub fn vertex_island(&self, vertex: &VertexHandle) -> Option<IslandHandle> {
        self.vertex(vertex)?
            .parent_island()
            .map(|island| self.bound_island_handle(island))
    }

    /// Handles of an island's members.
    pub fn island_members(&self, island: &IslandHandle) -> Vec<VertexHandle> {
        self.island(island)
            .map(|i| i.vertices().map(|v| self.bound_vertex_handle(v)).collect())
            .unwrap_or_default()
    }

    /// Connected components of the subgraph induced by `members`.
    ///
    /// Breadth-first, starting from members in ascending index order, so the
    /// first component always holds the lowest index.
    pub(crate) fn components_within(&self, members: &BTreeSet<UniqueIndex>) -> Vec<BTreeSet<UniqueIndex>> {
        let mut seen: BTreeSet<UniqueIndex> = BTreeSet::new();
        let mut components = Vec::new();
        let mut queue = VecDeque::new();

        for &start in members {
            if !seen.insert(start) {
                continue;
            }
            let mut component = BTreeSet::new();
            queue.push_back(start);

            while let Some(current) = queue.pop_front() {
                component.insert(current);
                let Some(vertex) = self.vertices.get(&current) else {
                    continue;
                };
                for &neighbor in &vertex.neighbors {
                    if members.contains(&neighbor) && seen.insert(neighbor) {
                        queue.push_back(neighbor);
                    }
                }
            }
            components.push(component);
        }

        components
    }

    /// Connected components of the subgraph of vertices that have an island.
    pub fn islanded_components(&self) -> Vec<BTreeSet<UniqueIndex>> {
        let islanded: BTreeSet<UniqueIndex> = self
            .vertices
            .values()
            .filter(|v| v.parent_island.is_some())
            .map(|v| v.unique_index())
            .collect();
        self.components_within(&islanded)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Invariants
    // ─────────────────────────────────────────────────────────────────────

    /// Check the structural invariants that hold after every mutation.
    ///
    /// Connectivity is not checked here since islands may lag it; see
    /// [`validate_connectivity`](Self::validate_connectivity).
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        let mut counted = 0usize;
        for (&index, vertex) in &self.vertices {
            for &neighbor in &vertex.neighbors {
                if neighbor == index {
                    return Err(InvariantViolation::SelfLoop(index));
                }
                let Some(other) = self.vertices.get(&neighbor) else {
                    return Err(InvariantViolation::DanglingNeighbor { vertex: index, neighbor });
                };
                if !other.neighbors.contains(&index) {
                    return Err(InvariantViolation::AsymmetricAdjacency { a: index, b: neighbor });
                }
                counted += 1;
            }

            if let Some(island) = vertex.parent_island {
                match self.islands.get(&island) {
                    None => {
                        return Err(InvariantViolation::DanglingParentIsland { vertex: index, island });
                    }
                    Some(i) if !i.contains(index) => {
                        return Err(InvariantViolation::MembershipMismatch { vertex: index, island });
                    }
                    Some(_) => {}
                }
            }
        }

        if counted / 2 != self.num_edges {
            return Err(InvariantViolation::EdgeCountDrift {
                counted: counted / 2,
                recorded: self.num_edges,
            });
        }

        let mut owner: BTreeMap<UniqueIndex, UniqueIndex> = BTreeMap::new();
        for (&island_index, island) in &self.islands {
            for vertex in island.vertices() {
                if let Some(first) = owner.insert(vertex, island_index) {
                    return Err(InvariantViolation::SharedVertex {
                        vertex,
                        first,
                        second: island_index,
                    });
                }
                let parent = self.vertices.get(&vertex).and_then(|v| v.parent_island);
                if parent != Some(island_index) {
                    return Err(InvariantViolation::MembershipMismatch {
                        vertex,
                        island: island_index,
                    });
                }
            }
        }

        Ok(())
    }

    /// Check that every island is exactly one connected component of the
    /// islanded subgraph. Holds after refreshing every island, unless
    /// operation flags blocked a merge or split, or membership was edited
    /// with `create_island` or `add_vertex_to_island`.
    pub fn validate_connectivity(&self) -> Result<(), InvariantViolation> {
        self.validate()?;

        for (&index, island) in &self.islands {
            if self.components_within(&island.vertices).len() > 1 {
                return Err(InvariantViolation::IslandNotConnected(index));
            }
        }

        for component in self.islanded_components() {
            let mut islands = component
                .iter()
                .filter_map(|v| self.vertices.get(v).and_then(|v| v.parent_island));
            if let Some(first) = islands.next() {
                if let Some(second) = islands.find(|&i| i != first) {
                    return Err(InvariantViolation::ComponentSpansIslands { first, second });
                }
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for GraphState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphState")
            .field("graph_id", &self.graph_id())
            .field("vertices", &self.vertices.len())
            .field("edges", &self.num_edges)
            .field("islands", &self.islands.len())
            .field("staged", &self.num_staged())
            .finish()
    }
}
