//! # gameplay-graph
//!
//! Undirected gameplay graph that keeps its connected components
//! ("islands") up to date under mutation.
//!
//! ## Core Contract
//!
//! 1. Vertices and islands are owned by the [`Graph`] and named by
//!    non-owning [`Handle`]s that resolve only against their own graph
//! 2. Edge batches are merged into islands in one union-find pass
//! 3. Removals shrink islands and split them when connectivity breaks
//! 4. Every structural change fires a [`GraphEvent`] synchronously
//! 5. An [`IncrementalSerializer`] keeps a [`SerializedGraph`] current from
//!    those events without re-serializing the graph
//!
//! ## Architecture
//!
//! ```text
//! caller → Graph (vertices / islands) → GraphEvent → IncrementalSerializer
//!                                                        ↓ flush()
//!                                                  SerializedGraph ⇄ load_graph
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Iteration is in ascending unique-index order
//! - Edges are canonical (low, high) pairs
//! - Merge survivors and split survivors are chosen by index, never by
//!   hash order
//! - Snapshot fingerprints ignore list order

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod config;
pub mod canonical;
pub mod graph;
pub mod serialize;

// Re-exports
pub use types::{
    ConnectivityChange, Edge, EventFilter, EventScope, GraphEvent, GraphIdentity, Handle, Island,
    IslandHandle, IslandOperations, UniqueIndex, Vertex, VertexHandle,
};
pub use config::{ConfigError, GraphConfig, GraphProperties, SplitSurvivor};
pub use graph::{
    DefaultElementFactory, ElementFactory, EventBus, EventHandler, Graph, GraphState,
    InvariantViolation, SubscriptionToken,
};
pub use serialize::{
    load_graph, serialize_graph, DeltaAction, GraphReader, GraphWriter, IncrementalSerializer,
    LoadError, LoadSummary, SerializedGraph,
};
pub use canonical::{to_canonical_bytes, canonical_hash, canonical_hash_hex};

/// Schema version of the serialized graph form.
/// Increment on breaking changes to [`SerializedGraph`] or [`DeltaAction`].
pub const GRAPH_SCHEMA_VERSION: &str = "1.0.0";
