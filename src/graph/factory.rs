//! Typed-factory hook for host-specific vertices and islands.

use crate::types::{Island, Vertex};

/// Supplies fresh, unregistered elements to a graph.
///
/// The graph assigns the unique index and registers whatever the factory
/// returns. Implementations typically attach an extension payload
/// (`Vertex::with_extension`) or restrict island operations
/// (`Island::with_operations`); the graph intersects those operations
/// with its configured defaults.
pub trait ElementFactory: Send {
    /// Create a vertex for the graph to register.
    fn create_typed_vertex(&mut self) -> Vertex {
        Vertex::unregistered()
    }

    /// Create an island for the graph to register.
    fn create_typed_island(&mut self) -> Island {
        Island::unregistered()
    }
}

/// Factory producing plain elements.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultElementFactory;

impl ElementFactory for DefaultElementFactory {}
