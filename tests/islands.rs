//! Island maintenance scenarios.
//!
//! These tests pin down merge and split outcomes on small, hand-built graphs.

use std::collections::BTreeSet;
use std::sync::Arc;

use gameplay_graph::{
    EventFilter, Graph, GraphConfig, GraphEvent, Handle, IslandOperations, UniqueIndex, VertexHandle,
};
use parking_lot::Mutex;

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn idx(n: u128) -> UniqueIndex {
    UniqueIndex::from_u128(n)
}

/// Vertices named A, B, C, ... with indices 1, 2, 3, ...
fn build_vertices(graph: &mut Graph, n: u128) -> Vec<VertexHandle> {
    (1..=n).map(|i| graph.create_vertex(Some(idx(i))).unwrap()).collect()
}

fn partition(graph: &Graph) -> BTreeSet<BTreeSet<UniqueIndex>> {
    graph
        .islands()
        .map(|island| island.vertices().collect())
        .collect()
}

fn set(indices: &[u128]) -> BTreeSet<UniqueIndex> {
    indices.iter().map(|&i| idx(i)).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Merge
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_bulk_edges_form_two_islands() {
    init_tracing();
    let mut graph = Graph::new();
    let v = build_vertices(&mut graph, 5);
    let (a, b, c, d, e) = (&v[0], &v[1], &v[2], &v[3], &v[4]);

    let created = graph.create_bulk_edges(&[
        (a.clone(), b.clone()),
        (b.clone(), c.clone()),
        (d.clone(), e.clone()),
    ]);

    assert_eq!(created, 3);
    assert_eq!(graph.num_islands(), 2);
    assert_eq!(partition(&graph), [set(&[1, 2, 3]), set(&[4, 5])].into_iter().collect());
    graph.validate_connectivity().unwrap();
}

#[test]
fn test_bridge_edge_merges_islands() {
    init_tracing();
    let mut graph = Graph::new();
    let v = build_vertices(&mut graph, 4);
    graph.create_edge(&v[0], &v[1]);
    graph.create_edge(&v[2], &v[3]);
    let first = graph.vertex_island(&v[0]).unwrap();
    let second = graph.vertex_island(&v[2]).unwrap();
    let survivor = std::cmp::min(first.clone(), second.clone());
    let absorbed = std::cmp::max(first, second);

    graph.create_edge(&v[1], &v[2]);

    assert_eq!(graph.num_islands(), 1);
    assert!(graph.has_island(&survivor));
    assert!(!graph.has_island(&absorbed));
    assert_eq!(graph.island_members(&survivor), v);
    graph.validate_connectivity().unwrap();
}

#[test]
fn test_edges_inside_one_island_do_not_create_islands() {
    let mut graph = Graph::new();
    let v = build_vertices(&mut graph, 3);
    graph.create_bulk_edges(&[(v[0].clone(), v[1].clone()), (v[1].clone(), v[2].clone())]);
    let island = graph.vertex_island(&v[0]).unwrap();
    let created = Arc::new(Mutex::new(0usize));
    let sink = created.clone();
    graph.subscribe(EventFilter::Graph, move |event, _| {
        if matches!(event, GraphEvent::IslandCreated(_)) {
            *sink.lock() += 1;
        }
    });

    graph.create_edge(&v[2], &v[0]);

    assert_eq!(*created.lock(), 0);
    assert_eq!(graph.island_handles(), vec![island]);
}

#[test]
fn test_no_islands_when_generation_disabled() {
    let mut graph = Graph::with_config(GraphConfig::without_islands());
    let v = build_vertices(&mut graph, 3);
    graph.create_bulk_edges(&[(v[0].clone(), v[1].clone()), (v[1].clone(), v[2].clone())]);

    assert_eq!(graph.num_edges(), 2);
    assert_eq!(graph.num_islands(), 0);
    graph.validate().unwrap();
}

// ─────────────────────────────────────────────────────────────────────────────
// Split
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_cycle_stays_one_island_after_edge_removal() {
    init_tracing();
    let mut graph = Graph::new();
    let v = build_vertices(&mut graph, 3);
    let (a, b, c) = (&v[0], &v[1], &v[2]);
    graph.create_bulk_edges(&[(a.clone(), b.clone()), (b.clone(), c.clone()), (c.clone(), a.clone())]);
    let island = graph.vertex_island(a).unwrap();

    assert!(graph.remove_edge(b, c));

    assert_eq!(graph.island_handles(), vec![island]);
    assert_eq!(partition(&graph), [set(&[1, 2, 3])].into_iter().collect());
}

#[test]
fn test_path_splits_into_singleton_and_pair() {
    init_tracing();
    let mut graph = Graph::new();
    let v = build_vertices(&mut graph, 3);
    let (a, b, c) = (&v[0], &v[1], &v[2]);
    graph.create_bulk_edges(&[(a.clone(), b.clone()), (b.clone(), c.clone())]);
    let island = graph.vertex_island(a).unwrap();

    assert!(graph.remove_edge(a, b));

    // The larger component keeps the handle; A keeps a singleton island.
    assert_eq!(partition(&graph), [set(&[1]), set(&[2, 3])].into_iter().collect());
    assert_eq!(graph.vertex_island(b), Some(island.clone()));
    assert_ne!(graph.vertex_island(a), Some(island));
    graph.validate_connectivity().unwrap();
}

#[test]
fn test_removing_last_member_destroys_island() {
    let mut graph = Graph::new();
    let v = build_vertices(&mut graph, 2);
    graph.create_edge(&v[0], &v[1]);
    let island = graph.vertex_island(&v[0]).unwrap();
    let destroyed = Arc::new(Mutex::new(Vec::new()));
    let sink = destroyed.clone();
    graph
        .subscribe_island(&island, move |event, _| {
            if let GraphEvent::IslandDestroyed(island) = event {
                sink.lock().push(island.clone());
            }
        })
        .unwrap();

    assert_eq!(graph.remove_bulk_vertices(&v), 2);

    assert_eq!(graph.num_islands(), 0);
    assert_eq!(*destroyed.lock(), vec![island]);
    assert_eq!(graph.num_subscriptions(), 0);
}

#[test]
fn test_bulk_removal_splits_once() {
    let mut graph = Graph::new();
    let v = build_vertices(&mut graph, 7);
    // Two triangles joined through v[3].
    graph.create_bulk_edges(&[
        (v[0].clone(), v[1].clone()),
        (v[1].clone(), v[2].clone()),
        (v[2].clone(), v[0].clone()),
        (v[2].clone(), v[3].clone()),
        (v[3].clone(), v[4].clone()),
        (v[4].clone(), v[5].clone()),
        (v[5].clone(), v[6].clone()),
        (v[6].clone(), v[4].clone()),
    ]);
    let splits = Arc::new(Mutex::new(0usize));
    let sink = splits.clone();
    graph.subscribe(EventFilter::All, move |event, _| {
        if matches!(event, GraphEvent::IslandConnectivityChanged { .. }) {
            *sink.lock() += 1;
        }
    });

    graph.remove_bulk_vertices(&[v[3].clone()]);

    // One SplitTo on the original plus one SplitFrom on the new island.
    assert_eq!(*splits.lock(), 2);
    assert_eq!(partition(&graph), [set(&[1, 2, 3]), set(&[5, 6, 7])].into_iter().collect());
    graph.validate_connectivity().unwrap();
}

#[test]
fn test_split_inherits_operation_flags() {
    let mut graph = Graph::new();
    let v = build_vertices(&mut graph, 3);
    graph.create_bulk_edges(&[(v[0].clone(), v[1].clone()), (v[1].clone(), v[2].clone())]);
    let island = graph.vertex_island(&v[0]).unwrap();
    let flags = IslandOperations::ALL.without(IslandOperations::DESTROY);
    graph.set_island_operations(&island, flags);

    graph.remove_edge(&v[1], &v[2]);

    let split_off = graph.vertex_island(&v[2]).unwrap();
    assert_ne!(split_off, island);
    assert_eq!(graph.island(&split_off).unwrap().operations(), flags);
}

#[test]
fn test_vertices_left_without_island_rejoin_through_their_edges() {
    init_tracing();
    let mut graph = Graph::new();
    let v = build_vertices(&mut graph, 5);
    graph.create_bulk_edges(&[(v[0].clone(), v[1].clone()), (v[1].clone(), v[2].clone())]);
    let island = graph.vertex_island(&v[0]).unwrap();
    assert!(graph.remove_island(&island));
    assert_eq!(graph.num_islands(), 0);

    // v1 and v3 are not adjacent, so they land in separate islands.
    graph.create_bulk_edges(&[(v[0].clone(), v[3].clone()), (v[2].clone(), v[4].clone())]);
    assert_eq!(partition(&graph), [set(&[1, 4]), set(&[3, 5])].into_iter().collect());
    graph.validate_connectivity().unwrap();

    // Islanding v2 again must follow its old edges to v1 and v3.
    graph.create_edge(&v[1], &v[3]);

    assert_eq!(graph.refresh_all_islands(), 0);
    assert_eq!(partition(&graph), [set(&[1, 2, 3, 4, 5])].into_iter().collect());
    graph.validate_connectivity().unwrap();
}

#[test]
fn test_removed_vertex_reports_losing_its_island() {
    let mut graph = Graph::new();
    let v = build_vertices(&mut graph, 2);
    graph.create_edge(&v[0], &v[1]);
    let parents = Arc::new(Mutex::new(Vec::new()));
    let sink = parents.clone();
    graph
        .subscribe_vertex(&v[0], move |event, _| {
            if let GraphEvent::ParentIslandSet { island, .. } = event {
                sink.lock().push(island.clone());
            }
        })
        .unwrap();

    assert!(graph.remove_vertex(&v[0]));

    assert_eq!(*parents.lock(), vec![None]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Invalid handles
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_missing_handles_leave_graph_unchanged() {
    let mut graph = Graph::new();
    let v = build_vertices(&mut graph, 3);
    graph.create_bulk_edges(&[(v[0].clone(), v[1].clone()), (v[1].clone(), v[2].clone())]);
    let island = graph.vertex_island(&v[0]).unwrap();
    let before = partition(&graph);
    let ghost_vertex: VertexHandle = Handle::detached(idx(77));
    let ghost_island = Handle::detached(idx(78));

    assert!(!graph.remove_vertex(&ghost_vertex));
    assert!(!graph.remove_edge(&v[0], &v[2]));
    assert!(!graph.remove_island(&ghost_island));
    assert!(!graph.refresh_island_connectivity(&ghost_island));
    assert!(!graph.add_vertex_to_island(&ghost_island, &v[0]));
    assert!(!graph.add_vertex_to_island(&island, &ghost_vertex));
    assert!(!graph.create_edge(&v[0], &ghost_vertex));

    assert_eq!(graph.num_vertices(), 3);
    assert_eq!(graph.num_edges(), 2);
    assert_eq!(graph.num_islands(), 1);
    assert_eq!(partition(&graph), before);
    graph.validate().unwrap();
}

#[test]
fn test_handle_from_dropped_graph_does_not_resolve() {
    let mut first = Graph::new();
    let stale = first.create_vertex(Some(idx(1))).unwrap();
    drop(first);

    let mut second = Graph::new();
    second.create_vertex(Some(idx(1))).unwrap();

    assert!(!stale.is_graph_alive());
    assert!(!second.has_vertex(&stale));
    assert!(second.complete_vertex_handle(&stale).is_some());
}
