//! Core types for the gameplay graph.

pub mod index;
pub mod handle;
pub mod edge;
pub mod vertex;
pub mod island;
pub mod event;

pub use index::UniqueIndex;
pub use handle::{GraphIdentity, Handle, VertexHandle, IslandHandle};
pub use edge::Edge;
pub use vertex::Vertex;
pub use island::{Island, IslandOperations};
pub use event::{GraphEvent, EventScope, EventFilter, ConnectivityChange};
