//! Incremental serialization driven by the graph's event stream.
//!
//! The serializer takes one full snapshot when created, then subscribes to
//! every event. Each event appends at most one [`DeltaAction`] to a shared
//! buffer; [`IncrementalSerializer::flush`] drains the buffer into the
//! cached snapshot.
//!
//! Vertex and edge deltas are folded through net add/remove sets
//! before they touch the ordered lists, so an add followed by a remove in
//! one flush window cancels in O(1). Island deltas edit the island map
//! directly. A rename settles the pending vertex and edge sets and then
//! rewrites the lists in one scan.

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::GraphProperties;
use crate::graph::{Graph, SubscriptionToken};
use crate::types::{Edge, EventFilter, GraphEvent, UniqueIndex};
use super::snapshot::SerializedGraph;

/// One structural change, reduced to indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeltaAction {
    /// A vertex was created.
    CreateVertex(UniqueIndex),
    /// A vertex was removed.
    RemoveVertex(UniqueIndex),
    /// An edge was created.
    CreateEdge(Edge),
    /// An edge was removed.
    RemoveEdge(Edge),
    /// An island was created.
    CreateIsland(UniqueIndex),
    /// An island was destroyed.
    RemoveIsland(UniqueIndex),
    /// A vertex joined an island.
    AddIslandVertex {
        /// The island.
        island: UniqueIndex,
        /// The vertex.
        vertex: UniqueIndex,
    },
    /// A vertex left an island.
    RemoveIslandVertex {
        /// The island.
        island: UniqueIndex,
        /// The vertex.
        vertex: UniqueIndex,
    },
    /// A vertex was renamed.
    ChangeVertexHandle {
        /// Previous index.
        old: UniqueIndex,
        /// New index.
        new: UniqueIndex,
    },
    /// Graph-level properties changed.
    SetProperties(GraphProperties),
}

impl DeltaAction {
    /// The delta recorded for `event`, if any.
    ///
    /// Parent-island and connectivity notifications are implied by the
    /// membership events and record nothing.
    pub fn from_event(event: &GraphEvent) -> Option<Self> {
        let action = match event {
            GraphEvent::VertexCreated(v) => Self::CreateVertex(v.unique_index()),
            GraphEvent::VertexRemoved(v) => Self::RemoveVertex(v.unique_index()),
            GraphEvent::EdgeCreated(a, b) => Self::CreateEdge(Edge::new(a.unique_index(), b.unique_index())),
            GraphEvent::EdgeRemoved(a, b) => Self::RemoveEdge(Edge::new(a.unique_index(), b.unique_index())),
            GraphEvent::IslandCreated(i) => Self::CreateIsland(i.unique_index()),
            GraphEvent::IslandDestroyed(i) => Self::RemoveIsland(i.unique_index()),
            GraphEvent::IslandVertexAdded { island, vertex } => Self::AddIslandVertex {
                island: island.unique_index(),
                vertex: vertex.unique_index(),
            },
            GraphEvent::IslandVertexRemoved { island, vertex } => Self::RemoveIslandVertex {
                island: island.unique_index(),
                vertex: vertex.unique_index(),
            },
            GraphEvent::VertexHandleChanged { old, new } => Self::ChangeVertexHandle {
                old: old.unique_index(),
                new: new.unique_index(),
            },
            GraphEvent::PropertiesChanged(properties) => Self::SetProperties(*properties),
            GraphEvent::ParentIslandSet { .. } | GraphEvent::IslandConnectivityChanged { .. } => return None,
        };
        Some(action)
    }
}

/// Net additions and removals against a base list.
#[derive(Debug)]
struct NetDelta<T> {
    added: HashSet<T>,
    removed: HashSet<T>,
}

impl<T: Copy + Eq + Hash + Ord> NetDelta<T> {
    fn new() -> Self {
        Self {
            added: HashSet::new(),
            removed: HashSet::new(),
        }
    }

    fn add(&mut self, item: T) {
        if !self.removed.remove(&item) {
            self.added.insert(item);
        }
    }

    fn remove(&mut self, item: T) {
        if !self.added.remove(&item) {
            self.removed.insert(item);
        }
    }

    fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Apply the net change to `list` and keep it sorted.
    fn settle(&mut self, list: &mut Vec<T>) {
        if self.is_empty() {
            return;
        }
        if !self.removed.is_empty() {
            list.retain(|item| !self.removed.contains(item));
            self.removed.clear();
        }
        list.extend(self.added.drain());
        list.sort_unstable();
    }
}

/// Applies a batch of deltas to a snapshot.
struct SnapshotPatch<'a> {
    snapshot: &'a mut SerializedGraph,
    vertices: NetDelta<UniqueIndex>,
    edges: NetDelta<Edge>,
}

impl<'a> SnapshotPatch<'a> {
    fn new(snapshot: &'a mut SerializedGraph) -> Self {
        Self {
            snapshot,
            vertices: NetDelta::new(),
            edges: NetDelta::new(),
        }
    }

    fn apply(&mut self, action: DeltaAction) {
        match action {
            DeltaAction::CreateVertex(v) => self.vertices.add(v),
            DeltaAction::RemoveVertex(v) => self.vertices.remove(v),
            DeltaAction::CreateEdge(e) => self.edges.add(e),
            DeltaAction::RemoveEdge(e) => self.edges.remove(e),
            DeltaAction::CreateIsland(i) => {
                self.snapshot.islands.entry(i).or_default();
            }
            DeltaAction::RemoveIsland(i) => {
                self.snapshot.islands.remove(&i);
            }
            DeltaAction::AddIslandVertex { island, vertex } => {
                self.snapshot.islands.entry(island).or_default().insert(vertex);
            }
            DeltaAction::RemoveIslandVertex { island, vertex } => {
                if let Some(members) = self.snapshot.islands.get_mut(&island) {
                    members.remove(&vertex);
                }
            }
            DeltaAction::ChangeVertexHandle { old, new } => self.rename(old, new),
            DeltaAction::SetProperties(properties) => self.snapshot.properties = properties,
        }
    }

    fn rename(&mut self, old: UniqueIndex, new: UniqueIndex) {
        self.settle();

        for vertex in self.snapshot.vertices.iter_mut().filter(|v| **v == old) {
            *vertex = new;
        }
        self.snapshot.vertices.sort_unstable();

        for edge in self.snapshot.edges.iter_mut().filter(|e| e.contains(old)) {
            *edge = edge.renamed(old, new);
        }
        self.snapshot.edges.sort_unstable();

        for members in self.snapshot.islands.values_mut() {
            if members.remove(&old) {
                members.insert(new);
            }
        }
    }

    fn settle(&mut self) {
        self.vertices.settle(&mut self.snapshot.vertices);
        self.edges.settle(&mut self.snapshot.edges);
    }
}

/// Keeps a [`SerializedGraph`] current with one graph.
///
/// Deltas are buffered as events fire and folded in by
/// [`flush`](Self::flush). Dropping the serializer stops the buffering;
/// [`detach`](Self::detach) also removes the subscription.
#[derive(Debug)]
pub struct IncrementalSerializer {
    snapshot: SerializedGraph,
    pending: Arc<Mutex<Vec<DeltaAction>>>,
    subscription: Option<SubscriptionToken>,
    flushes: u64,
}

impl IncrementalSerializer {
    /// Take a full snapshot of `graph` and start recording its deltas.
    pub fn new(graph: &mut Graph) -> Self {
        let snapshot = SerializedGraph::from_graph(graph.state());
        let pending = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::downgrade(&pending);
        let subscription = graph.subscribe(EventFilter::All, move |event, _| {
            let Some(buffer) = sink.upgrade() else {
                return;
            };
            if let Some(action) = DeltaAction::from_event(event) {
                buffer.lock().push(action);
            }
        });

        debug!(
            graph_id = %graph.graph_id(),
            fingerprint = %snapshot.fingerprint(),
            "incremental serializer attached"
        );
        Self {
            snapshot,
            pending,
            subscription: Some(subscription),
            flushes: 0,
        }
    }

    /// Apply every buffered delta and return the current snapshot.
    pub fn flush(&mut self) -> &SerializedGraph {
        let actions = std::mem::take(&mut *self.pending.lock());
        self.flushes += 1;
        if actions.is_empty() {
            return &self.snapshot;
        }

        let mut patch = SnapshotPatch::new(&mut self.snapshot);
        for &action in &actions {
            patch.apply(action);
        }
        patch.settle();

        trace!(actions = actions.len(), flush = self.flushes, "flushed deltas");
        &self.snapshot
    }

    /// Snapshot as of the last flush.
    pub fn snapshot(&self) -> &SerializedGraph {
        &self.snapshot
    }

    /// Number of buffered, unflushed deltas.
    pub fn pending_actions(&self) -> usize {
        self.pending.lock().len()
    }

    /// Number of flushes so far.
    pub fn num_flushes(&self) -> u64 {
        self.flushes
    }

    /// Whether the serializer is still subscribed.
    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Stop recording deltas from `graph`. Buffered deltas stay pending.
    pub fn detach(&mut self, graph: &mut Graph) -> bool {
        match self.subscription.take() {
            Some(token) => graph.unsubscribe(token),
            None => false,
        }
    }
}
