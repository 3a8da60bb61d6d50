//! Unique index for graph elements.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use std::fmt;

/// Unique identifier for a vertex or island in a graph.
///
/// Wraps a UUID and implements `Ord` for deterministic ordering. The
/// `temporary` flag marks indices handed out while an element is staged
/// during a bulk load; it is cleared when the element is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UniqueIndex {
    guid: Uuid,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    temporary: bool,
}

impl UniqueIndex {
    /// Create a new index from a UUID.
    pub fn new(guid: Uuid) -> Self {
        Self { guid, temporary: false }
    }

    /// Generate a fresh random index.
    pub fn generate() -> Self {
        Self::new(Uuid::new_v4())
    }

    /// Create an index from a `u128` (stable ids for tests and tooling).
    pub fn from_u128(value: u128) -> Self {
        Self::new(Uuid::from_u128(value))
    }

    /// Parse an index from a UUID string.
    pub fn from_str(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self::new(Uuid::parse_str(s)?))
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.guid
    }

    /// Whether this index belongs to an element that is still staged.
    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    /// Same index, flagged as temporary.
    pub fn as_temporary(self) -> Self {
        Self { temporary: true, ..self }
    }

    /// Same index with the temporary flag cleared.
    ///
    /// Graph maps are always keyed by finalized indices.
    pub fn finalized(self) -> Self {
        Self { temporary: false, ..self }
    }
}

impl fmt::Display for UniqueIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.temporary {
            write!(f, "{}~", self.guid)
        } else {
            write!(f, "{}", self.guid)
        }
    }
}

impl From<Uuid> for UniqueIndex {
    fn from(uuid: Uuid) -> Self {
        Self::new(uuid)
    }
}
