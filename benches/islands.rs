//! Performance benchmarks for island maintenance and incremental flushes.
//!
//! Run with: `cargo bench --bench islands`
//!
//! | Operation | Notes |
//! |-----------|-------|
//! | Bulk edge insert | One merge pass per batch |
//! | Per-edge insert | One merge pass per edge, for comparison |
//! | Split | Cutting a long path in the middle |
//! | Incremental flush | Delta fold vs. full re-serialization |

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};

use gameplay_graph::{Graph, IncrementalSerializer, SerializedGraph, UniqueIndex, VertexHandle};

fn make_vertices(graph: &mut Graph, n: usize) -> Vec<VertexHandle> {
    (1..=n as u128)
        .map(|i| graph.create_vertex(Some(UniqueIndex::from_u128(i))).unwrap())
        .collect()
}

/// Pairs forming `n / size` disjoint paths of `size` vertices.
fn clustered_edges(vertices: &[VertexHandle], size: usize) -> Vec<(VertexHandle, VertexHandle)> {
    vertices
        .chunks(size)
        .flat_map(|chunk| chunk.windows(2).map(|w| (w[0].clone(), w[1].clone())))
        .collect()
}

fn bench_edge_insertion(c: &mut Criterion) {
    let mut group = c.benchmark_group("edge_insertion");

    for n in [100usize, 1_000, 10_000] {
        group.throughput(Throughput::Elements(n as u64));

        group.bench_with_input(BenchmarkId::new("bulk", n), &n, |b, &n| {
            b.iter_batched(
                || {
                    let mut graph = Graph::new();
                    let vertices = make_vertices(&mut graph, n);
                    let edges = clustered_edges(&vertices, 16);
                    (graph, edges)
                },
                |(mut graph, edges)| {
                    black_box(graph.create_bulk_edges(&edges));
                    graph
                },
                BatchSize::LargeInput,
            );
        });

        group.bench_with_input(BenchmarkId::new("per_edge", n), &n, |b, &n| {
            b.iter_batched(
                || {
                    let mut graph = Graph::new();
                    let vertices = make_vertices(&mut graph, n);
                    let edges = clustered_edges(&vertices, 16);
                    (graph, edges)
                },
                |(mut graph, edges)| {
                    for (a, b) in &edges {
                        black_box(graph.create_edge(a, b));
                    }
                    graph
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn bench_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("split");

    for n in [100usize, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::new("path_cut", n), &n, |b, &n| {
            b.iter_batched(
                || {
                    let mut graph = Graph::new();
                    let vertices = make_vertices(&mut graph, n);
                    graph.create_bulk_edges(&clustered_edges(&vertices, n));
                    let cut = (vertices[n / 2 - 1].clone(), vertices[n / 2].clone());
                    (graph, cut)
                },
                |(mut graph, (a, b))| {
                    black_box(graph.remove_edge(&a, &b));
                    graph
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn bench_flush(c: &mut Criterion) {
    let mut group = c.benchmark_group("flush");
    let n = 10_000usize;

    group.bench_function("incremental", |b| {
        b.iter_batched(
            || {
                let mut graph = Graph::new();
                let vertices = make_vertices(&mut graph, n);
                graph.create_bulk_edges(&clustered_edges(&vertices, 16));
                let serializer = IncrementalSerializer::new(&mut graph);
                let extra = make_extra(&mut graph, &vertices);
                (graph, serializer, extra)
            },
            |(graph, mut serializer, extra)| {
                black_box(serializer.flush().vertices.len());
                (graph, serializer, extra)
            },
            BatchSize::LargeInput,
        );
    });

    group.bench_function("full", |b| {
        let mut graph = Graph::new();
        let vertices = make_vertices(&mut graph, n);
        graph.create_bulk_edges(&clustered_edges(&vertices, 16));
        make_extra(&mut graph, &vertices);
        b.iter(|| black_box(SerializedGraph::from_graph(graph.state())));
    });

    group.finish();
}

/// A handful of mutations for the flush to fold in.
fn make_extra(graph: &mut Graph, vertices: &[VertexHandle]) -> VertexHandle {
    let extra = graph.create_vertex(None).unwrap();
    graph.create_bulk_edges(&[(extra.clone(), vertices[0].clone()), (extra.clone(), vertices[16].clone())]);
    graph.remove_edge(&vertices[1], &vertices[2]);
    extra
}

criterion_group!(benches, bench_edge_insertion, bench_split, bench_flush);
criterion_main!(benches);
