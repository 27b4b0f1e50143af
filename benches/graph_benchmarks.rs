use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use graphweave::algo::{
    biconnected_components, edmonds_karp, page_rank, weak_components, BetweennessCentrality, RankingConfig,
};
use graphweave::GraphStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Ring with random chords, edge ids 0..n+chords
fn random_graph(n: u32, chords: u32) -> GraphStore<u32, u32> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut graph = GraphStore::new();
    for v in 0..n {
        graph.add_vertex(v);
    }
    for v in 0..n {
        graph.add_directed_edge(v, v, (v + 1) % n).unwrap();
    }
    for edge in n..n + chords {
        graph.add_directed_edge(edge, rng.gen_range(0..n), rng.gen_range(0..n)).unwrap();
    }
    graph
}

/// Benchmark edge insertion throughput
fn bench_edge_insertion(c: &mut Criterion) {
    let mut group = c.benchmark_group("edge_insertion");

    for size in [100u32, 1000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| criterion::black_box(random_graph(size, size * 4)));
        });
    }
    group.finish();
}

/// Benchmark incidence queries
fn bench_neighbors(c: &mut Criterion) {
    let mut group = c.benchmark_group("neighbors");

    for size in [100u32, 1000, 10_000].iter() {
        let graph = random_graph(*size, size * 4);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let mut total = 0;
                for v in graph.vertices() {
                    total += graph.neighbors(v).map(|n| n.len()).unwrap_or(0);
                }
                criterion::black_box(total);
            });
        });
    }
    group.finish();
}

fn bench_pagerank(c: &mut Criterion) {
    let mut group = c.benchmark_group("pagerank");

    for size in [100u32, 1000, 10_000].iter() {
        let graph = random_graph(*size, size * 4);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| criterion::black_box(page_rank(&graph, RankingConfig::default()).unwrap()));
        });
    }
    group.finish();
}

fn bench_max_flow(c: &mut Criterion) {
    let mut group = c.benchmark_group("max_flow");

    for size in [100u32, 1000].iter() {
        let graph = random_graph(*size, size * 4);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let result = edmonds_karp(&graph, 0, size / 2, |e| Some((e % 7 + 1) as i64)).unwrap();
                criterion::black_box(result.max_flow);
            });
        });
    }
    group.finish();
}

fn bench_components(c: &mut Criterion) {
    let mut group = c.benchmark_group("components");

    for size in [1000u32, 10_000].iter() {
        let graph = random_graph(*size, *size);
        group.bench_with_input(BenchmarkId::new("weak", size), size, |b, _| {
            b.iter(|| criterion::black_box(weak_components(&graph).component_count()));
        });
        group.bench_with_input(BenchmarkId::new("biconnected", size), size, |b, _| {
            b.iter(|| criterion::black_box(biconnected_components(&graph).component_count()));
        });
    }
    group.finish();
}

fn bench_betweenness(c: &mut Criterion) {
    let mut group = c.benchmark_group("betweenness");
    group.sample_size(10);

    for size in [100u32, 500].iter() {
        let graph = random_graph(*size, size * 2);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| criterion::black_box(BetweennessCentrality::new(&graph).max_edge().map(|(_, s)| s)));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_edge_insertion,
    bench_neighbors,
    bench_pagerank,
    bench_max_flow,
    bench_components,
    bench_betweenness,
);
criterion_main!(benches);
