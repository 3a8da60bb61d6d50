//! Vertex store and edge mutation.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::types::{GraphEvent, UniqueIndex, VertexHandle};
use super::Graph;

impl Graph {
    /// Create and register a vertex.
    ///
    /// Uses `index` if given, otherwise generates one. Returns `None` if the
    /// index already names a live or staged element.
    pub fn create_vertex(&mut self, index: Option<UniqueIndex>) -> Option<VertexHandle> {
        let index = self.claim_index(index)?;
        let mut vertex = self.factory.create_typed_vertex();
        vertex.register(index, &self.state.identity);
        let handle = vertex.handle().clone();
        self.state.vertices.insert(index, vertex);

        self.emit(GraphEvent::VertexCreated(handle.clone()));
        Some(handle)
    }

    /// Add an edge. Returns `true` if the edge is new.
    pub fn create_edge(&mut self, a: &VertexHandle, b: &VertexHandle) -> bool {
        self.create_bulk_edges(&[(a.clone(), b.clone())]) == 1
    }

    /// Add a batch of edges, then run one island merge pass for the batch.
    ///
    /// Pairs naming unknown vertices and self loops are skipped. Pairs that
    /// are already adjacent are accepted without an event. Returns the
    /// number of edges actually created.
    pub fn create_bulk_edges(&mut self, edges: &[(VertexHandle, VertexHandle)]) -> usize {
        let mut batch = Vec::with_capacity(edges.len());
        let mut created = 0usize;

        for (a, b) in edges {
            let (Some(ia), Some(ib)) = (self.state.resolve_vertex(a), self.state.resolve_vertex(b)) else {
                warn!(a = %a, b = %b, "edge with unknown endpoint ignored");
                continue;
            };
            if ia == ib {
                warn!(vertex = %ia, "self loop ignored");
                continue;
            }
            if self.link(ia, ib) {
                created += 1;
                self.emit(GraphEvent::EdgeCreated(
                    self.state.bound_vertex_handle(ia),
                    self.state.bound_vertex_handle(ib),
                ));
            }
            batch.push((ia, ib));
        }

        if self.state.config.properties.generate_islands {
            self.merge_islands_for_edges(&batch);
        }

        debug!(requested = edges.len(), created, "created edges");
        created
    }

    /// Remove the edge between `a` and `b`.
    ///
    /// If both endpoints share an island, that island gets the
    /// remove-or-split check (when `split_on_removal` is set).
    pub fn remove_edge(&mut self, a: &VertexHandle, b: &VertexHandle) -> bool {
        let (Some(ia), Some(ib)) = (self.state.resolve_vertex(a), self.state.resolve_vertex(b)) else {
            return false;
        };
        if !self.unlink(ia, ib) {
            return false;
        }
        self.emit(GraphEvent::EdgeRemoved(
            self.state.bound_vertex_handle(ia),
            self.state.bound_vertex_handle(ib),
        ));

        let island_a = self.state.vertices.get(&ia).and_then(|v| v.parent_island);
        let island_b = self.state.vertices.get(&ib).and_then(|v| v.parent_island);
        if let Some(island) = island_a.filter(|_| island_a == island_b) {
            if self.state.config.split_on_removal {
                self.remove_or_split(island);
            }
        }
        true
    }

    /// Remove a vertex with all its edges and island membership.
    pub fn remove_vertex(&mut self, vertex: &VertexHandle) -> bool {
        let Some(index) = self.state.resolve_vertex(vertex) else {
            return false;
        };
        if let Some(island) = self.detach_vertex(index) {
            self.after_departure(island);
        }
        true
    }

    /// Remove several vertices, deferring island checks until every removal
    /// is applied. Returns the number of vertices removed.
    pub fn remove_bulk_vertices(&mut self, vertices: &[VertexHandle]) -> usize {
        let indices: BTreeSet<UniqueIndex> = vertices
            .iter()
            .filter_map(|v| self.state.resolve_vertex(v))
            .collect();

        let mut affected = BTreeSet::new();
        for &index in &indices {
            if let Some(island) = self.detach_vertex(index) {
                affected.insert(island);
            }
        }
        for island in affected {
            self.after_departure(island);
        }

        debug!(requested = vertices.len(), removed = indices.len(), "removed vertices");
        indices.len()
    }

    /// Insert adjacency both ways. Returns `true` if the edge is new.
    fn link(&mut self, a: UniqueIndex, b: UniqueIndex) -> bool {
        let inserted = match self.state.vertices.get_mut(&a) {
            Some(vertex) => vertex.neighbors.insert(b),
            None => return false,
        };
        let mirrored = match self.state.vertices.get_mut(&b) {
            Some(vertex) => vertex.neighbors.insert(a),
            None => false,
        };
        debug_assert_eq!(inserted, mirrored, "adjacency out of sync between {a} and {b}");
        if inserted {
            self.state.num_edges += 1;
        }
        inserted
    }

    /// Remove adjacency both ways. Returns `true` if the edge existed.
    fn unlink(&mut self, a: UniqueIndex, b: UniqueIndex) -> bool {
        let removed = self
            .state
            .vertices
            .get_mut(&a)
            .map(|v| v.neighbors.remove(&b))
            .unwrap_or(false);
        let mirrored = self
            .state
            .vertices
            .get_mut(&b)
            .map(|v| v.neighbors.remove(&a))
            .unwrap_or(false);
        debug_assert_eq!(removed, mirrored, "adjacency out of sync between {a} and {b}");
        if removed {
            self.state.num_edges -= 1;
        }
        removed
    }

    /// Detach every edge and the island membership of a vertex, fire
    /// `VertexRemoved` and erase it. Returns the island it left.
    fn detach_vertex(&mut self, index: UniqueIndex) -> Option<UniqueIndex> {
        let neighbors: Vec<UniqueIndex> = self
            .state
            .vertices
            .get(&index)?
            .neighbors()
            .collect();
        for neighbor in neighbors {
            if self.unlink(index, neighbor) {
                self.emit(GraphEvent::EdgeRemoved(
                    self.state.bound_vertex_handle(index),
                    self.state.bound_vertex_handle(neighbor),
                ));
            }
        }

        let former = self.leave_island(index);

        self.emit(GraphEvent::VertexRemoved(self.state.bound_vertex_handle(index)));
        self.state.vertices.remove(&index);
        self.events.drop_vertex_scope(index);
        former
    }
}
