use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use net_insight::{analyze_with, AnalysisConfig, Brandes, CentralityConfig, Graph, Louvain, RawLink, RawNode};

/// `clusters` rings of `size` nodes with chords, chained by single bridges.
fn clustered(clusters: usize, size: usize) -> (Vec<RawNode>, Vec<RawLink>) {
    let id = |c: usize, i: usize| format!("c{}n{}", c, i);
    let mut nodes = Vec::new();
    let mut links = Vec::new();
    for c in 0..clusters {
        for i in 0..size {
            nodes.push(RawNode::new(id(c, i)));
            links.push(RawLink::new(id(c, i), id(c, (i + 1) % size)));
            links.push(RawLink::new(id(c, i), id(c, (i + 3) % size)));
        }
        if c > 0 {
            links.push(RawLink::new(id(c - 1, 0), id(c, size / 2)));
        }
    }
    (nodes, links)
}

fn bench_components(c: &mut Criterion) {
    let mut group = c.benchmark_group("components");
    for clusters in [4usize, 16, 32] {
        let (nodes, links) = clustered(clusters, 25);
        let graph = Graph::build(&nodes, &links);
        group.bench_with_input(BenchmarkId::new("louvain", clusters), &graph, |b, graph| {
            b.iter(|| Louvain::default().detect(black_box(graph)))
        });
        group.bench_with_input(BenchmarkId::new("brandes", clusters), &graph, |b, graph| {
            b.iter(|| Brandes::default().compute(black_box(graph)))
        });
        let parallel = Brandes::new(CentralityConfig { parallel: true, ..CentralityConfig::default() });
        group.bench_with_input(BenchmarkId::new("brandes_parallel", clusters), &graph, |b, graph| {
            b.iter(|| parallel.compute(black_box(graph)))
        });
    }
    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let (nodes, links) = clustered(16, 25);
    let mut config = AnalysisConfig::default();
    config.parallel = true;
    c.bench_function("analyze_400", |b| {
        b.iter(|| analyze_with(black_box(&nodes), black_box(&links), &config))
    });
}

criterion_group!(benches, bench_components, bench_pipeline);
criterion_main!(benches);
