//! Vertex type for the gameplay graph.

use std::any::Any;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use super::handle::{GraphIdentity, Handle, VertexHandle};
use super::index::UniqueIndex;

/// A node of the undirected graph.
///
/// Owned by the graph; external code refers to it through a [`VertexHandle`].
/// Adjacency is kept as a set of neighbor indices and is always symmetric.
pub struct Vertex {
    pub(crate) handle: VertexHandle,
    pub(crate) neighbors: BTreeSet<UniqueIndex>,
    pub(crate) parent_island: Option<UniqueIndex>,
    extension: Option<Box<dyn Any + Send>>,
}

impl Vertex {
    /// A fresh vertex not yet registered with any graph.
    ///
    /// This is what an `ElementFactory` returns; the graph assigns the
    /// unique index when registering it.
    pub fn unregistered() -> Self {
        Self {
            handle: Handle::detached(UniqueIndex::new(Uuid::nil())),
            neighbors: BTreeSet::new(),
            parent_island: None,
            extension: None,
        }
    }

    /// Attach host-specific data to this vertex.
    pub fn with_extension<E: Any + Send>(mut self, extension: E) -> Self {
        self.extension = Some(Box::new(extension));
        self
    }

    pub(crate) fn register(&mut self, index: UniqueIndex, identity: &Arc<GraphIdentity>) {
        self.handle = Handle::bound(index, identity);
    }

    /// Handle naming this vertex.
    pub fn handle(&self) -> &VertexHandle {
        &self.handle
    }

    /// Unique index of this vertex.
    pub fn unique_index(&self) -> UniqueIndex {
        self.handle.unique_index()
    }

    /// Indices of adjacent vertices, ascending.
    pub fn neighbors(&self) -> impl Iterator<Item = UniqueIndex> + '_ {
        self.neighbors.iter().copied()
    }

    /// Number of incident edges.
    pub fn degree(&self) -> usize {
        self.neighbors.len()
    }

    /// Whether `other` is adjacent.
    pub fn is_adjacent(&self, other: UniqueIndex) -> bool {
        self.neighbors.contains(&other.finalized())
    }

    /// Index of the island this vertex belongs to.
    pub fn parent_island(&self) -> Option<UniqueIndex> {
        self.parent_island
    }

    /// Host-specific data, if it has type `E`.
    pub fn extension<E: Any>(&self) -> Option<&E> {
        self.extension.as_ref()?.downcast_ref::<E>()
    }

    /// Mutable host-specific data, if it has type `E`.
    pub fn extension_mut<E: Any>(&mut self) -> Option<&mut E> {
        self.extension.as_mut()?.downcast_mut::<E>()
    }
}

impl Default for Vertex {
    fn default() -> Self {
        Self::unregistered()
    }
}

impl fmt::Debug for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vertex")
            .field("index", &self.unique_index())
            .field("neighbors", &self.neighbors)
            .field("parent_island", &self.parent_island)
            .field("has_extension", &self.extension.is_some())
            .finish()
    }
}
