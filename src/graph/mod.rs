//! The graph orchestrator.
//!
//! `Graph` owns every vertex and island, exposes the mutation API and fires
//! structural events. Mutation is split across submodules:
//!
//! - [`vertices`]: vertex creation/removal and edge mutation
//! - [`islands`]: merge-on-insert, split-on-remove and explicit island edits
//!
//! ## Concurrency
//!
//! Single writer. Every mutation takes `&mut self`; event handlers receive
//! `&GraphState` and therefore cannot re-enter a mutation.

pub mod events;
pub mod factory;
pub mod islands;
pub mod state;
pub mod vertices;
mod union_find;

use std::ops::Deref;

use tracing::{debug, warn};

use crate::config::{GraphConfig, GraphProperties};
use crate::types::{EventFilter, GraphEvent, IslandHandle, UniqueIndex, VertexHandle};

pub use events::{EventBus, EventHandler, SubscriptionToken};
pub use factory::{DefaultElementFactory, ElementFactory};
pub use state::{GraphState, InvariantViolation};

/// Undirected graph that maintains islands under mutation.
///
/// Read-only queries are available through `Deref<Target = GraphState>`.
pub struct Graph {
    state: GraphState,
    events: EventBus,
    factory: Box<dyn ElementFactory>,
}

impl Graph {
    /// Create an empty graph with the default config.
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    /// Create an empty graph.
    pub fn with_config(config: GraphConfig) -> Self {
        Self::with_factory(config, Box::new(DefaultElementFactory))
    }

    /// Create an empty graph whose elements come from `factory`.
    pub fn with_factory(config: GraphConfig, factory: Box<dyn ElementFactory>) -> Self {
        let state = GraphState::new(config);
        debug!(
            graph_id = %state.graph_id(),
            config = %state.config.fingerprint(),
            "created graph"
        );
        Self {
            state,
            events: EventBus::new(),
            factory,
        }
    }

    /// Read-only view of the graph.
    pub fn state(&self) -> &GraphState {
        &self.state
    }

    // ─────────────────────────────────────────────────────────────────────
    // Events
    // ─────────────────────────────────────────────────────────────────────

    /// Subscribe to events passing `filter`.
    pub fn subscribe<F>(&mut self, filter: EventFilter, handler: F) -> SubscriptionToken
    where
        F: FnMut(&GraphEvent, &GraphState) + Send + 'static,
    {
        self.events.subscribe(filter, Box::new(handler))
    }

    /// Subscribe to the per-vertex events of one live vertex.
    ///
    /// The subscription follows renames and ends when the vertex is removed.
    pub fn subscribe_vertex<F>(&mut self, vertex: &VertexHandle, handler: F) -> Option<SubscriptionToken>
    where
        F: FnMut(&GraphEvent, &GraphState) + Send + 'static,
    {
        let index = self.state.resolve_vertex(vertex)?;
        Some(self.subscribe(EventFilter::Vertex(index), handler))
    }

    /// Subscribe to the per-island events of one live island.
    ///
    /// The subscription ends when the island is destroyed.
    pub fn subscribe_island<F>(&mut self, island: &IslandHandle, handler: F) -> Option<SubscriptionToken>
    where
        F: FnMut(&GraphEvent, &GraphState) + Send + 'static,
    {
        let index = self.state.resolve_island(island)?;
        Some(self.subscribe(EventFilter::Island(index), handler))
    }

    /// Remove a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        self.events.unsubscribe(token)
    }

    /// Number of live subscriptions.
    pub fn num_subscriptions(&self) -> usize {
        self.events.len()
    }

    pub(crate) fn emit(&mut self, event: GraphEvent) {
        self.events.dispatch(&event, &self.state);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Properties
    // ─────────────────────────────────────────────────────────────────────

    /// Replace the graph-level properties.
    ///
    /// Turning `generate_islands` on runs one merge pass over every existing
    /// edge, so edged vertices without an island get one. Returns `false`
    /// if nothing changed.
    pub fn set_properties(&mut self, properties: GraphProperties) -> bool {
        let previous = self.state.config.properties;
        if previous == properties {
            return false;
        }
        self.restore_properties(properties);

        if properties.generate_islands && !previous.generate_islands {
            let pairs: Vec<(UniqueIndex, UniqueIndex)> =
                self.state.edges().map(|e| e.endpoints()).collect();
            self.merge_islands_for_edges(&pairs);
        }
        true
    }

    /// Set properties without any island side effects.
    pub(crate) fn restore_properties(&mut self, properties: GraphProperties) {
        self.state.config.properties = properties;
        self.emit(GraphEvent::PropertiesChanged(properties));
    }

    // ─────────────────────────────────────────────────────────────────────
    // Identity
    // ─────────────────────────────────────────────────────────────────────

    /// Pick the index for a new element: the requested one if free,
    /// otherwise a fresh one. `None` if the requested index is taken.
    fn claim_index(&self, requested: Option<UniqueIndex>) -> Option<UniqueIndex> {
        match requested {
            Some(index) => {
                let index = index.finalized();
                if self.state.index_in_use(index) {
                    warn!(index = %index, "unique index already in use");
                    return None;
                }
                Some(index)
            }
            None => loop {
                let index = UniqueIndex::generate();
                if !self.state.index_in_use(index) {
                    break Some(index);
                }
            },
        }
    }

    /// Resolve a possibly partial vertex handle to the live handle.
    ///
    /// Partial handles are detached handles, temporary handles of committed
    /// staged elements, or handles carried over from another graph.
    pub fn complete_vertex_handle(&self, partial: &VertexHandle) -> Option<VertexHandle> {
        self.state.vertex_handle(partial.unique_index())
    }

    /// Resolve a possibly partial island handle to the live handle.
    pub fn complete_island_handle(&self, partial: &IslandHandle) -> Option<IslandHandle> {
        self.state.island_handle(partial.unique_index())
    }

    /// Rename a live vertex.
    ///
    /// The vertex map, every neighbor's adjacency set and the owning
    /// island's member set are updated together. Afterwards `old` no longer
    /// resolves and the returned handle resolves to the same adjacency and
    /// island. Returns `None` if `old` is not live or `new_index` is taken.
    pub fn change_vertex_handle(&mut self, old: &VertexHandle, new_index: UniqueIndex) -> Option<VertexHandle> {
        let Some(old_index) = self.state.resolve_vertex(old) else {
            warn!(vertex = %old, "rename of unknown vertex ignored");
            return None;
        };
        let new_index = new_index.finalized();
        if new_index == old_index {
            return self.state.vertex_handle(old_index);
        }
        if self.state.index_in_use(new_index) {
            warn!(vertex = %old_index, target = %new_index, "rename target already in use");
            return None;
        }

        let mut vertex = self.state.vertices.remove(&old_index)?;
        vertex.register(new_index, &self.state.identity);

        for neighbor in &vertex.neighbors {
            if let Some(other) = self.state.vertices.get_mut(neighbor) {
                other.neighbors.remove(&old_index);
                other.neighbors.insert(new_index);
            }
        }
        if let Some(island) = vertex.parent_island.and_then(|i| self.state.islands.get_mut(&i)) {
            island.remove_vertex(old_index);
            island.insert_vertex(new_index);
        }
        self.state.vertices.insert(new_index, vertex);
        self.events.rescope_vertex(old_index, new_index);

        debug!(old = %old_index, new = %new_index, "renamed vertex");
        let new = self.state.bound_vertex_handle(new_index);
        self.emit(GraphEvent::VertexHandleChanged {
            old: self.state.bound_vertex_handle(old_index),
            new: new.clone(),
        });
        Some(new)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Staging (two-phase commit for bulk loads)
    // ─────────────────────────────────────────────────────────────────────

    /// Stage a vertex. The returned handle is temporary: it does not resolve
    /// and no event fires until [`commit_staged`](Self::commit_staged).
    pub fn stage_vertex(&mut self, index: Option<UniqueIndex>) -> Option<VertexHandle> {
        let index = self.claim_index(index)?;
        let mut vertex = self.factory.create_typed_vertex();
        vertex.register(index.as_temporary(), &self.state.identity);
        let handle = vertex.handle().clone();
        self.state.staged_vertices.insert(index, vertex);
        Some(handle)
    }

    /// Stage an empty island.
    pub fn stage_island(&mut self, index: Option<UniqueIndex>) -> Option<IslandHandle> {
        let index = self.claim_index(index)?;
        let mut island = self.factory.create_typed_island();
        let operations = island.operations() & self.state.config.default_island_operations;
        island.set_operations(operations);
        island.register(index.as_temporary(), &self.state.identity);
        let handle = island.handle().clone();
        self.state.staged_islands.insert(index, island);
        Some(handle)
    }

    /// Whether `index` names a staged element.
    pub fn is_staged(&self, index: UniqueIndex) -> bool {
        let index = index.finalized();
        self.state.staged_vertices.contains_key(&index) || self.state.staged_islands.contains_key(&index)
    }

    /// Move every staged element into the live maps, vertices first,
    /// firing `VertexCreated`/`IslandCreated`. Returns the number committed.
    pub fn commit_staged(&mut self) -> usize {
        let vertices = std::mem::take(&mut self.state.staged_vertices);
        let islands = std::mem::take(&mut self.state.staged_islands);
        let committed = vertices.len() + islands.len();

        for (index, mut vertex) in vertices {
            vertex.register(index, &self.state.identity);
            self.state.vertices.insert(index, vertex);
            self.emit(GraphEvent::VertexCreated(self.state.bound_vertex_handle(index)));
        }
        for (index, mut island) in islands {
            island.register(index, &self.state.identity);
            self.state.islands.insert(index, island);
            self.emit(GraphEvent::IslandCreated(self.state.bound_island_handle(index)));
        }

        debug!(committed, "committed staged elements");
        committed
    }

    /// Drop every staged element. Returns the number dropped.
    pub fn discard_staged(&mut self) -> usize {
        let dropped = self.state.num_staged();
        self.state.staged_vertices.clear();
        self.state.staged_islands.clear();
        dropped
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for Graph {
    type Target = GraphState;

    fn deref(&self) -> &GraphState {
        &self.state
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("state", &self.state)
            .field("events", &self.events)
            .finish()
    }
}
