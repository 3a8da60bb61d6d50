//! Property tests over random mutation sequences.
//!
//! Every sequence is replayed against a graph with an attached incremental
//! serializer. After each step the structural invariants must hold, and
//! every flush must equal a full serialization pass.

use proptest::prelude::*;

use gameplay_graph::{Graph, GraphConfig, IncrementalSerializer, SerializedGraph, UniqueIndex, VertexHandle};

const POOL: u8 = 16;

#[derive(Debug, Clone)]
enum Op {
    AddVertex(u8),
    AddEdges(Vec<(u8, u8)>),
    RemoveEdge(u8, u8),
    RemoveVertex(u8),
    RemoveVertices(Vec<u8>),
    Rename(u8, u8),
    RemoveIsland(u8),
    LeaveIsland(u8),
    RefreshAll,
    Flush,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        1 => (0..POOL).prop_map(Op::AddVertex),
        4 => prop::collection::vec((0..POOL, 0..POOL), 1..6).prop_map(Op::AddEdges),
        2 => (0..POOL, 0..POOL).prop_map(|(a, b)| Op::RemoveEdge(a, b)),
        1 => (0..POOL).prop_map(Op::RemoveVertex),
        1 => prop::collection::vec(0..POOL, 1..4).prop_map(Op::RemoveVertices),
        1 => (0..POOL, 0..POOL).prop_map(|(a, b)| Op::Rename(a, b)),
        1 => (0..POOL).prop_map(Op::RemoveIsland),
        1 => (0..POOL).prop_map(Op::LeaveIsland),
        1 => Just(Op::RefreshAll),
        1 => Just(Op::Flush),
    ]
}

fn idx(n: u8) -> UniqueIndex {
    UniqueIndex::from_u128(u128::from(n) + 1)
}

fn handle(graph: &Graph, n: u8) -> Option<VertexHandle> {
    graph.vertex_handle(idx(n))
}

fn seeded_graph(config: GraphConfig) -> Graph {
    let mut graph = Graph::with_config(config);
    for n in 0..POOL / 2 {
        graph.create_vertex(Some(idx(n))).unwrap();
    }
    graph
}

fn apply(graph: &mut Graph, serializer: &mut IncrementalSerializer, op: &Op) -> Result<(), TestCaseError> {
    match op {
        Op::AddVertex(n) => {
            graph.create_vertex(Some(idx(*n)));
        }
        Op::AddEdges(pairs) => {
            let edges: Vec<(VertexHandle, VertexHandle)> = pairs
                .iter()
                .filter_map(|&(a, b)| Some((handle(graph, a)?, handle(graph, b)?)))
                .collect();
            graph.create_bulk_edges(&edges);
        }
        Op::RemoveEdge(a, b) => {
            if let (Some(a), Some(b)) = (handle(graph, *a), handle(graph, *b)) {
                graph.remove_edge(&a, &b);
            }
        }
        Op::RemoveVertex(n) => {
            if let Some(vertex) = handle(graph, *n) {
                prop_assert!(graph.remove_vertex(&vertex));
            }
        }
        Op::RemoveVertices(ns) => {
            let vertices: Vec<VertexHandle> = ns.iter().filter_map(|&n| handle(graph, n)).collect();
            graph.remove_bulk_vertices(&vertices);
        }
        Op::Rename(from, to) => {
            if let Some(vertex) = handle(graph, *from) {
                let neighbors = graph.neighbors(&vertex).len();
                if let Some(renamed) = graph.change_vertex_handle(&vertex, idx(*to)) {
                    prop_assert_eq!(graph.neighbors(&renamed).len(), neighbors);
                    prop_assert!(from == to || !graph.has_vertex(&vertex));
                }
            }
        }
        Op::RemoveIsland(n) => {
            if let Some(island) = handle(graph, *n).and_then(|v| graph.vertex_island(&v)) {
                prop_assert!(graph.remove_island(&island));
                prop_assert!(!graph.has_island(&island));
            }
        }
        Op::LeaveIsland(n) => {
            if let Some(vertex) = handle(graph, *n) {
                if let Some(island) = graph.vertex_island(&vertex) {
                    prop_assert!(graph.remove_vertex_from_island(&island, &vertex));
                    prop_assert!(graph.vertex_island(&vertex).is_none());
                }
            }
        }
        Op::RefreshAll => {
            graph.refresh_all_islands();
        }
        Op::Flush => {
            let expected = SerializedGraph::from_graph(graph.state());
            prop_assert_eq!(serializer.flush(), &expected);
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(96))]

    #[test]
    fn prop_islands_track_components(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut graph = seeded_graph(GraphConfig::default());
        let mut serializer = IncrementalSerializer::new(&mut graph);

        for op in &ops {
            apply(&mut graph, &mut serializer, op)?;
            prop_assert!(graph.validate().is_ok(), "{:?}", graph.validate());
            prop_assert!(graph.validate_connectivity().is_ok(), "{:?}", graph.validate_connectivity());
        }

        let expected = SerializedGraph::from_graph(graph.state());
        prop_assert_eq!(serializer.flush(), &expected);
    }

    #[test]
    fn prop_lazy_islands_converge_after_refresh(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let config = GraphConfig {
            split_on_removal: false,
            ..GraphConfig::default()
        };
        let mut graph = seeded_graph(config);
        let mut serializer = IncrementalSerializer::new(&mut graph);

        for op in &ops {
            apply(&mut graph, &mut serializer, op)?;
            prop_assert!(graph.validate().is_ok(), "{:?}", graph.validate());
        }

        graph.refresh_all_islands();
        prop_assert!(graph.validate_connectivity().is_ok(), "{:?}", graph.validate_connectivity());
        let expected = SerializedGraph::from_graph(graph.state());
        prop_assert_eq!(serializer.flush(), &expected);
    }

    #[test]
    fn prop_round_trip(ops in prop::collection::vec(op_strategy(), 1..30)) {
        let mut graph = seeded_graph(GraphConfig::default());
        let mut serializer = IncrementalSerializer::new(&mut graph);
        for op in &ops {
            apply(&mut graph, &mut serializer, op)?;
        }

        let mut serialized = SerializedGraph::from_graph(graph.state());
        let mut restored = Graph::new();
        gameplay_graph::load_graph(&mut restored, &mut serialized).unwrap();

        prop_assert_eq!(SerializedGraph::from_graph(restored.state()), serialized);
        prop_assert!(restored.validate_connectivity().is_ok());
    }
}
