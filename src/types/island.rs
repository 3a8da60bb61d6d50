//! Island type: a maintained grouping of vertices tracking one connected component.

use std::any::Any;
use std::collections::BTreeSet;
use std::fmt;
use std::ops::{BitAnd, BitOr, Not};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::handle::{GraphIdentity, Handle, IslandHandle};
use super::index::UniqueIndex;

/// Bitmask of operations an island permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IslandOperations(u8);

impl IslandOperations {
    /// No operation allowed.
    pub const NONE: Self = Self(0);
    /// Island may gain vertices.
    pub const ADD: Self = Self(1 << 0);
    /// Island may be split by a connectivity refresh.
    pub const SPLIT: Self = Self(1 << 1);
    /// Island may take part in a merge.
    pub const MERGE: Self = Self(1 << 2);
    /// Island may be removed explicitly.
    pub const DESTROY: Self = Self(1 << 3);
    /// Every operation allowed.
    pub const ALL: Self = Self(0b1111);

    /// Raw bits.
    pub fn bits(&self) -> u8 {
        self.0
    }

    /// Whether every operation in `other` is allowed.
    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Copy with `other` added.
    pub fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Copy with `other` removed.
    pub fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0 & Self::ALL.0)
    }
}

impl Default for IslandOperations {
    fn default() -> Self {
        Self::ALL
    }
}

impl BitOr for IslandOperations {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        self.with(rhs)
    }
}

impl BitAnd for IslandOperations {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for IslandOperations {
    type Output = Self;
    fn not(self) -> Self {
        Self(!self.0 & Self::ALL.0)
    }
}

impl fmt::Display for IslandOperations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Self::ADD, "add"),
            (Self::SPLIT, "split"),
            (Self::MERGE, "merge"),
            (Self::DESTROY, "destroy"),
        ];
        let set: Vec<&str> = names
            .iter()
            .filter(|(op, _)| self.contains(*op))
            .map(|(_, name)| *name)
            .collect();
        if set.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", set.join("|"))
        }
    }
}

/// A set of vertices the graph keeps grouped together.
///
/// Member edits are restricted to the owning graph. Between refreshes an
/// island may lag true connectivity.
pub struct Island {
    pub(crate) handle: IslandHandle,
    pub(crate) vertices: BTreeSet<UniqueIndex>,
    operations: IslandOperations,
    destroyed: bool,
    extension: Option<Box<dyn Any + Send>>,
}

impl Island {
    /// A fresh island not yet registered with any graph.
    pub fn unregistered() -> Self {
        Self {
            handle: Handle::detached(UniqueIndex::new(Uuid::nil())),
            vertices: BTreeSet::new(),
            operations: IslandOperations::ALL,
            destroyed: false,
            extension: None,
        }
    }

    /// Restrict the operations this island will allow once registered.
    pub fn with_operations(mut self, operations: IslandOperations) -> Self {
        self.operations = operations;
        self
    }

    /// Attach host-specific data to this island.
    pub fn with_extension<E: Any + Send>(mut self, extension: E) -> Self {
        self.extension = Some(Box::new(extension));
        self
    }

    pub(crate) fn register(&mut self, index: UniqueIndex, identity: &Arc<GraphIdentity>) {
        self.handle = Handle::bound(index, identity);
    }

    /// Handle naming this island.
    pub fn handle(&self) -> &IslandHandle {
        &self.handle
    }

    /// Unique index of this island.
    pub fn unique_index(&self) -> UniqueIndex {
        self.handle.unique_index()
    }

    /// Member vertex indices, ascending.
    pub fn vertices(&self) -> impl Iterator<Item = UniqueIndex> + '_ {
        self.vertices.iter().copied()
    }

    /// Whether `vertex` is a member.
    pub fn contains(&self, vertex: UniqueIndex) -> bool {
        self.vertices.contains(&vertex.finalized())
    }

    /// Number of member vertices.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the island has no members.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Allowed operations.
    pub fn operations(&self) -> IslandOperations {
        self.operations
    }

    /// Whether every operation in `op` is allowed.
    pub fn is_operation_allowed(&self, op: IslandOperations) -> bool {
        !self.destroyed && self.operations.contains(op)
    }

    /// Whether the island has been destroyed.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Host-specific data, if it has type `E`.
    pub fn extension<E: Any>(&self) -> Option<&E> {
        self.extension.as_ref()?.downcast_ref::<E>()
    }

    pub(crate) fn set_operations(&mut self, operations: IslandOperations) {
        self.operations = operations;
    }

    /// Add a member. Operation flags are checked by the graph before it
    /// moves a vertex; structural moves (split, load) skip them.
    pub(crate) fn insert_vertex(&mut self, vertex: UniqueIndex) -> bool {
        self.vertices.insert(vertex.finalized())
    }

    pub(crate) fn remove_vertex(&mut self, vertex: UniqueIndex) -> bool {
        self.vertices.remove(&vertex.finalized())
    }

    /// Mark destroyed. Returns `true` only on the first call.
    pub(crate) fn destroy(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        self.destroyed = true;
        true
    }
}

impl Default for Island {
    fn default() -> Self {
        Self::unregistered()
    }
}

impl fmt::Debug for Island {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Island")
            .field("index", &self.unique_index())
            .field("vertices", &self.vertices)
            .field("operations", &self.operations)
            .field("destroyed", &self.destroyed)
            .finish()
    }
}
