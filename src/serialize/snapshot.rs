//! In-memory serialized form of a graph.
//!
//! Equality ignores ordering: vertices compare as sets, edges as sets of
//! unordered pairs, islands as per-island member sets. The fingerprint is
//! computed over the same canonical form, so equal snapshots always share a
//! fingerprint.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::canonical::{canonical_hash_hex, to_canonical_bytes};
use crate::config::GraphProperties;
use crate::graph::GraphState;
use crate::types::{Edge, IslandHandle, UniqueIndex, VertexHandle};
use crate::GRAPH_SCHEMA_VERSION;
use super::{serialize_graph, GraphReader, GraphWriter};

/// Vertices, edges, island partition and properties of a graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SerializedGraph {
    /// Graph-level properties.
    pub properties: GraphProperties,
    /// Vertex indices.
    pub vertices: Vec<UniqueIndex>,
    /// Edges, each once.
    pub edges: Vec<Edge>,
    /// Island index to member indices.
    #[serde(with = "island_records")]
    pub islands: BTreeMap<UniqueIndex, BTreeSet<UniqueIndex>>,
}

/// Canonical form hashed by [`SerializedGraph::fingerprint`].
#[derive(Serialize)]
struct CanonicalSnapshot<'a> {
    schema_version: &'a str,
    properties: GraphProperties,
    vertices: BTreeSet<UniqueIndex>,
    edges: BTreeSet<Edge>,
    islands: Vec<(&'a UniqueIndex, &'a BTreeSet<UniqueIndex>)>,
}

impl SerializedGraph {
    /// Full serialization pass over `state`.
    pub fn from_graph(state: &GraphState) -> Self {
        let mut snapshot = Self {
            vertices: Vec::with_capacity(state.num_vertices()),
            edges: Vec::with_capacity(state.num_edges()),
            ..Self::default()
        };
        serialize_graph(state, &mut snapshot);
        snapshot
    }

    /// Deterministic fingerprint of the content, independent of ordering.
    pub fn fingerprint(&self) -> String {
        canonical_hash_hex(&self.canonical())
    }

    /// Canonical JSON bytes of the content.
    pub fn to_canonical_bytes(&self) -> Vec<u8> {
        to_canonical_bytes(&self.canonical())
    }

    /// Member sets of every non-empty island, without island indices.
    ///
    /// Two graphs with the same partition agree here even when their
    /// islands were created under different handles.
    pub fn partition(&self) -> BTreeSet<BTreeSet<UniqueIndex>> {
        self.islands
            .values()
            .filter(|members| !members.is_empty())
            .cloned()
            .collect()
    }

    fn canonical(&self) -> CanonicalSnapshot<'_> {
        CanonicalSnapshot {
            schema_version: GRAPH_SCHEMA_VERSION,
            properties: self.properties,
            vertices: self.vertices.iter().map(|v| v.finalized()).collect(),
            edges: self.edges.iter().copied().collect(),
            islands: self.islands.iter().collect(),
        }
    }
}

impl PartialEq for SerializedGraph {
    fn eq(&self, other: &Self) -> bool {
        let vertices = |g: &Self| g.vertices.iter().copied().collect::<BTreeSet<_>>();
        let edges = |g: &Self| g.edges.iter().copied().collect::<BTreeSet<_>>();

        self.properties == other.properties
            && self.islands == other.islands
            && vertices(self) == vertices(other)
            && edges(self) == edges(other)
    }
}

impl Eq for SerializedGraph {}

impl GraphWriter for SerializedGraph {
    fn write_graph_properties(&mut self, properties: GraphProperties) {
        self.properties = properties;
    }

    fn write_graph_vertex(&mut self, vertex: &VertexHandle) {
        self.vertices.push(vertex.unique_index());
    }

    fn write_graph_edge(&mut self, a: &VertexHandle, b: &VertexHandle) {
        self.edges.push(Edge::new(a.unique_index(), b.unique_index()));
    }

    fn write_graph_island(&mut self, island: &IslandHandle, members: &[VertexHandle]) {
        self.islands.insert(
            island.unique_index(),
            members.iter().map(|m| m.unique_index()).collect(),
        );
    }
}

impl GraphReader for SerializedGraph {
    fn graph_properties(&self) -> GraphProperties {
        self.properties
    }

    fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    fn num_edges(&self) -> usize {
        self.edges.len()
    }

    fn num_islands(&self) -> usize {
        self.islands.len()
    }

    fn for_every_vertex(&self, visit: &mut dyn FnMut(UniqueIndex)) {
        for &vertex in &self.vertices {
            visit(vertex);
        }
    }

    fn for_every_edge(&self, visit: &mut dyn FnMut(UniqueIndex, UniqueIndex)) {
        for edge in &self.edges {
            let (a, b) = edge.endpoints();
            visit(a, b);
        }
    }

    fn for_every_island(&self, visit: &mut dyn FnMut(UniqueIndex, &[UniqueIndex])) {
        for (&island, members) in &self.islands {
            let members: Vec<UniqueIndex> = members.iter().copied().collect();
            visit(island, &members);
        }
    }
}

/// JSON object keys must be strings, so islands travel as a list of
/// `[island, members]` pairs.
mod island_records {
    use std::collections::{BTreeMap, BTreeSet};

    use serde::{Deserialize, Deserializer, Serializer};

    use crate::types::UniqueIndex;

    pub fn serialize<S: Serializer>(
        islands: &BTreeMap<UniqueIndex, BTreeSet<UniqueIndex>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(islands.iter())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<UniqueIndex, BTreeSet<UniqueIndex>>, D::Error> {
        let records: Vec<(UniqueIndex, BTreeSet<UniqueIndex>)> = Vec::deserialize(deserializer)?;
        Ok(records.into_iter().collect())
    }
}
