//! Non-owning handles naming graph elements.
//!
//! A handle is a unique index plus a weak back-reference to the identity of
//! the graph that issued it. Handles never own the element they name: every
//! access goes through a lookup on the graph, and a handle whose graph has
//! been dropped (or that was issued by a different graph) resolves to nothing.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::{Arc, Weak};

use uuid::Uuid;

use super::index::UniqueIndex;
use super::island::Island;
use super::vertex::Vertex;

/// Identity token owned by a graph. Handles hold a `Weak` to it.
#[derive(Debug)]
pub struct GraphIdentity {
    graph_id: Uuid,
}

impl GraphIdentity {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self { graph_id: Uuid::new_v4() })
    }

    /// Identifier of the owning graph instance.
    pub fn graph_id(&self) -> Uuid {
        self.graph_id
    }
}

/// Handle to a graph element of kind `T`.
///
/// Equality, ordering and hashing only consider the unique index, so a
/// partial handle (see [`Handle::detached`]) compares equal to the live one.
pub struct Handle<T> {
    index: UniqueIndex,
    graph: Weak<GraphIdentity>,
    _kind: PhantomData<fn() -> T>,
}

/// Handle to a [`Vertex`].
pub type VertexHandle = Handle<Vertex>;

/// Handle to an [`Island`].
pub type IslandHandle = Handle<Island>;

impl<T> Handle<T> {
    pub(crate) fn bound(index: UniqueIndex, graph: &Arc<GraphIdentity>) -> Self {
        Self {
            index,
            graph: Arc::downgrade(graph),
            _kind: PhantomData,
        }
    }

    /// A partial handle carrying only an index.
    ///
    /// It does not resolve until completed through
    /// `Graph::complete_vertex_handle` / `Graph::complete_island_handle`.
    pub fn detached(index: UniqueIndex) -> Self {
        Self {
            index,
            graph: Weak::new(),
            _kind: PhantomData,
        }
    }

    /// The unique index this handle names.
    pub fn unique_index(&self) -> UniqueIndex {
        self.index
    }

    /// Whether the handle was issued for a still-staged element.
    pub fn is_temporary(&self) -> bool {
        self.index.is_temporary()
    }

    /// Whether the issuing graph is still alive.
    pub fn is_graph_alive(&self) -> bool {
        self.graph.strong_count() > 0
    }

    /// Whether this handle was issued by the graph owning `identity`.
    pub fn belongs_to(&self, identity: &Arc<GraphIdentity>) -> bool {
        self.is_graph_alive() && std::ptr::eq(self.graph.as_ptr(), Arc::as_ptr(identity))
    }

    /// Complete handle: bound to a graph and not temporary.
    pub fn is_complete(&self) -> bool {
        self.is_graph_alive() && !self.index.is_temporary()
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self {
            index: self.index,
            graph: self.graph.clone(),
            _kind: PhantomData,
        }
    }
}

/// Compares the finalized index only. Handles from different graphs that
/// share an index are equal and hash alike, so keep one graph per collection.
impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index.finalized() == other.index.finalized()
    }
}

impl<T> Eq for Handle<T> {}

impl<T> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index.finalized().cmp(&other.index.finalized())
    }
}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.finalized().hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("index", &self.index)
            .field("graph_alive", &self.is_graph_alive())
            .finish()
    }
}

impl<T> fmt::Display for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index)
    }
}
