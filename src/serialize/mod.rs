//! Serialization contracts, the full serialization pass and the loader.
//!
//! A [`GraphWriter`] receives one full pass over a graph; a [`GraphReader`]
//! feeds a serialized graph back into an empty [`Graph`]. The in-memory
//! [`SerializedGraph`] implements both, and [`IncrementalSerializer`] keeps
//! one current from the graph's event stream.
//!
//! ## Load order
//!
//! 1. Validate everything the reader yields (nothing is mutated on error)
//! 2. Stage vertices and islands, then commit them in one step
//! 3. Insert edges with island generation suppressed
//! 4. Refill islands under their serialized handles
//! 5. Restore the serialized properties and call the reader's hooks

pub mod incremental;
pub mod snapshot;

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use crate::config::GraphProperties;
use crate::graph::{Graph, GraphState};
use crate::types::{Edge, IslandHandle, UniqueIndex, VertexHandle};

pub use incremental::{DeltaAction, IncrementalSerializer};
pub use snapshot::SerializedGraph;

/// Errors from [`load_graph`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// The target graph already holds live or staged elements.
    #[error("Graph must be empty before loading ({vertices} vertices, {islands} islands, {staged} staged)")]
    GraphNotEmpty {
        /// Live vertices.
        vertices: usize,
        /// Live islands.
        islands: usize,
        /// Staged elements.
        staged: usize,
    },
    /// The reader yielded the same index twice.
    #[error("Duplicate vertex index: {0}")]
    DuplicateVertex(UniqueIndex),
    /// An island index repeats or collides with a vertex index.
    #[error("Duplicate island index: {0}")]
    DuplicateIsland(UniqueIndex),
    /// An edge or island names a vertex the reader never yielded.
    #[error("Unknown vertex: {0}")]
    UnknownVertex(UniqueIndex),
    /// An edge joins a vertex to itself.
    #[error("Self loop on vertex {0}")]
    SelfLoop(UniqueIndex),
    /// Two islands claim one vertex.
    #[error("Vertex {vertex} claimed by islands {first} and {second}")]
    VertexInMultipleIslands {
        /// The vertex.
        vertex: UniqueIndex,
        /// First island claiming it.
        first: UniqueIndex,
        /// Second island claiming it.
        second: UniqueIndex,
    },
}

/// Counts of what [`load_graph`] committed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Vertices created.
    pub vertices: usize,
    /// Edges created.
    pub edges: usize,
    /// Islands created.
    pub islands: usize,
}

/// Sink for a full serialization pass.
pub trait GraphWriter {
    /// Called once, first.
    fn write_graph_properties(&mut self, properties: GraphProperties);

    /// Called once per vertex, in ascending index order.
    fn write_graph_vertex(&mut self, vertex: &VertexHandle);

    /// Called once per edge, in canonical order.
    fn write_graph_edge(&mut self, a: &VertexHandle, b: &VertexHandle);

    /// Called once per island with its members, in ascending index order.
    fn write_graph_island(&mut self, island: &IslandHandle, members: &[VertexHandle]);
}

/// Source for [`load_graph`].
///
/// The `for_every_*` methods yield raw indices. Once the loader has
/// committed an item into the live graph it calls the matching
/// `on_*_deserialized` hook with the live handle.
pub trait GraphReader {
    /// Serialized graph-level properties.
    fn graph_properties(&self) -> GraphProperties;

    /// Number of vertices the reader will yield.
    fn num_vertices(&self) -> usize;

    /// Number of edges the reader will yield.
    fn num_edges(&self) -> usize;

    /// Number of islands the reader will yield.
    fn num_islands(&self) -> usize;

    /// Yield every vertex index.
    fn for_every_vertex(&self, visit: &mut dyn FnMut(UniqueIndex));

    /// Yield every edge as a pair of vertex indices.
    fn for_every_edge(&self, visit: &mut dyn FnMut(UniqueIndex, UniqueIndex));

    /// Yield every island index with its member indices.
    fn for_every_island(&self, visit: &mut dyn FnMut(UniqueIndex, &[UniqueIndex]));

    /// A vertex was committed.
    fn on_vertex_deserialized(&mut self, _vertex: &VertexHandle) {}

    /// An edge was committed.
    fn on_edge_deserialized(&mut self, _a: &VertexHandle, _b: &VertexHandle) {}

    /// An island was committed and refilled.
    fn on_island_deserialized(&mut self, _island: &IslandHandle) {}
}

/// Run one full serialization pass over `state`.
pub fn serialize_graph(state: &GraphState, writer: &mut dyn GraphWriter) {
    writer.write_graph_properties(state.properties());

    for vertex in state.vertices() {
        writer.write_graph_vertex(vertex.handle());
    }
    for edge in state.edges() {
        let (a, b) = edge.endpoints();
        writer.write_graph_edge(&state.bound_vertex_handle(a), &state.bound_vertex_handle(b));
    }
    for island in state.islands() {
        let members: Vec<VertexHandle> = island.vertices().map(|v| state.bound_vertex_handle(v)).collect();
        writer.write_graph_island(island.handle(), &members);
    }

    debug!(
        vertices = state.num_vertices(),
        edges = state.num_edges(),
        islands = state.num_islands(),
        "serialized graph"
    );
}

/// Everything a reader yields, validated.
struct LoadPlan {
    vertices: Vec<UniqueIndex>,
    edges: BTreeSet<Edge>,
    islands: BTreeMap<UniqueIndex, Vec<UniqueIndex>>,
}

impl LoadPlan {
    fn read(reader: &dyn GraphReader) -> Result<Self, LoadError> {
        let mut vertices = Vec::with_capacity(reader.num_vertices());
        let mut known = BTreeSet::new();
        let mut duplicate = None;
        reader.for_every_vertex(&mut |vertex| {
            let vertex = vertex.finalized();
            if known.insert(vertex) {
                vertices.push(vertex);
            } else {
                duplicate.get_or_insert(vertex);
            }
        });
        if let Some(vertex) = duplicate {
            return Err(LoadError::DuplicateVertex(vertex));
        }

        let mut edges = BTreeSet::new();
        let mut bad_edge = None;
        reader.for_every_edge(&mut |a, b| {
            if bad_edge.is_some() {
                return;
            }
            let (a, b) = (a.finalized(), b.finalized());
            if let Some(&unknown) = [a, b].iter().find(|v| !known.contains(*v)) {
                bad_edge = Some(LoadError::UnknownVertex(unknown));
            } else if a == b {
                bad_edge = Some(LoadError::SelfLoop(a));
            } else {
                edges.insert(Edge::new(a, b));
            }
        });
        if let Some(error) = bad_edge {
            return Err(error);
        }

        let mut islands = BTreeMap::new();
        let mut owner: BTreeMap<UniqueIndex, UniqueIndex> = BTreeMap::new();
        let mut bad_island = None;
        reader.for_every_island(&mut |island, members| {
            if bad_island.is_some() {
                return;
            }
            let island = island.finalized();
            if known.contains(&island) || islands.contains_key(&island) {
                bad_island = Some(LoadError::DuplicateIsland(island));
                return;
            }
            let mut list = Vec::with_capacity(members.len());
            for member in members.iter().map(|m| m.finalized()) {
                if !known.contains(&member) {
                    bad_island = Some(LoadError::UnknownVertex(member));
                    return;
                }
                match owner.insert(member, island) {
                    Some(first) if first != island => {
                        bad_island = Some(LoadError::VertexInMultipleIslands {
                            vertex: member,
                            first,
                            second: island,
                        });
                        return;
                    }
                    Some(_) => {}
                    None => list.push(member),
                }
            }
            islands.insert(island, list);
        });
        if let Some(error) = bad_island {
            return Err(error);
        }

        Ok(Self { vertices, edges, islands })
    }
}

/// Load a serialized graph into an empty `graph`.
///
/// Island handles and the island partition are restored exactly as
/// serialized; the merge pass does not run during the load. Island
/// operation flags come from the graph's factory and config.
pub fn load_graph(graph: &mut Graph, reader: &mut dyn GraphReader) -> Result<LoadSummary, LoadError> {
    if graph.num_vertices() > 0 || graph.num_islands() > 0 || graph.num_staged() > 0 {
        return Err(LoadError::GraphNotEmpty {
            vertices: graph.num_vertices(),
            islands: graph.num_islands(),
            staged: graph.num_staged(),
        });
    }

    let plan = LoadPlan::read(reader)?;

    for &vertex in &plan.vertices {
        if graph.stage_vertex(Some(vertex)).is_none() {
            graph.discard_staged();
            return Err(LoadError::DuplicateVertex(vertex));
        }
    }
    for &island in plan.islands.keys() {
        if graph.stage_island(Some(island)).is_none() {
            graph.discard_staged();
            return Err(LoadError::DuplicateIsland(island));
        }
    }
    graph.commit_staged();

    let properties = reader.graph_properties();
    graph.restore_properties(GraphProperties {
        generate_islands: false,
        ..properties
    });

    let pairs: Vec<(VertexHandle, VertexHandle)> = plan
        .edges
        .iter()
        .map(|edge| {
            let (a, b) = edge.endpoints();
            (graph.bound_vertex_handle(a), graph.bound_vertex_handle(b))
        })
        .collect();
    let edges = graph.create_bulk_edges(&pairs);

    for (&island, members) in &plan.islands {
        graph.adopt_vertices(island, members);
    }
    graph.restore_properties(properties);

    for &vertex in &plan.vertices {
        reader.on_vertex_deserialized(&graph.bound_vertex_handle(vertex));
    }
    for (a, b) in &pairs {
        reader.on_edge_deserialized(a, b);
    }
    for &island in plan.islands.keys() {
        reader.on_island_deserialized(&graph.bound_island_handle(island));
    }

    let summary = LoadSummary {
        vertices: plan.vertices.len(),
        edges,
        islands: plan.islands.len(),
    };
    info!(
        vertices = summary.vertices,
        edges = summary.edges,
        islands = summary.islands,
        "loaded graph"
    );
    Ok(summary)
}
