//! Benchmarks for index construction, queries and incremental repair.

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rand::prelude::*;
use std::hint::black_box;

use stackppr::{
    seeded, AdjacencyList, Fora, PprConfig, PprIndex, StackIndex, StaticStackIndex, WalkIndex,
};

/// Preferential attachment graph (Barabási–Albert) with `m` edges per new node.
///
/// Heavy-tailed degrees make the trees far less uniform than on a ring.
fn barabasi_albert(n: usize, m: usize, seed: u64) -> AdjacencyList {
    assert!(n > m && m >= 1);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut edges = Vec::new();
    // node ids repeated by degree
    let mut targets: Vec<usize> = Vec::new();

    for i in 0..=m {
        for j in (i + 1)..=m {
            edges.push((i, j));
            targets.extend([i, j]);
        }
    }
    for v in (m + 1)..n {
        let mut chosen: Vec<usize> = Vec::with_capacity(m);
        while chosen.len() < m {
            let u = targets[rng.random_range(0..targets.len())];
            if !chosen.contains(&u) {
                chosen.push(u);
            }
        }
        for &u in &chosen {
            edges.push((v, u));
            targets.extend([u, v]);
        }
    }
    AdjacencyList::from_edges(n, &edges, false)
}

fn config() -> PprConfig {
    PprConfig::new(false, 0.2, 0.3, 0.1, 0.01, 0.01)
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    group.sample_size(20);
    let cfg = config();
    for n in [1_000usize, 10_000] {
        let g = barabasi_albert(n, 3, 1);
        group.bench_with_input(BenchmarkId::new("stack", n), &n, |b, _| {
            b.iter(|| black_box(StackIndex::build(black_box(&g), &cfg, &mut seeded(7)).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("static", n), &n, |b, _| {
            b.iter(|| {
                black_box(StaticStackIndex::build(black_box(&g), &cfg, &mut seeded(7)).unwrap())
            })
        });
        group.bench_with_input(BenchmarkId::new("walks", n), &n, |b, _| {
            b.iter(|| black_box(WalkIndex::build(black_box(&g), &cfg, &mut seeded(7)).unwrap()))
        });
    }
    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");
    let cfg = config();
    let g = barabasi_albert(10_000, 3, 2);
    let mut rng = seeded(3);
    let stack = StackIndex::build(&g, &cfg, &mut rng).unwrap();
    let walks = WalkIndex::build(&g, &cfg, &mut rng).unwrap();
    let mut fora = Fora::new();

    group.bench_function("stack", |b| {
        b.iter(|| black_box(fora.estimate(&g, &cfg, &stack, black_box(17), &mut rng).unwrap()))
    });
    group.bench_function("walks", |b| {
        b.iter(|| black_box(fora.estimate(&g, &cfg, &walks, black_box(17), &mut rng).unwrap()))
    });
    group.finish();
}

fn bench_repair(c: &mut Criterion) {
    let mut group = c.benchmark_group("repair");
    group.sample_size(20);
    let cfg = config();
    let g = barabasi_albert(5_000, 3, 4);
    let mut rng = seeded(5);
    let index = StackIndex::build(&g, &cfg, &mut rng).unwrap();

    group.bench_function("insert_delete", |b| {
        b.iter_batched(
            || (g.clone(), index.clone()),
            |(mut g, mut idx)| {
                Fora::insert_edge(&mut g, &cfg, &mut idx, 11, 4_000, &mut rng).unwrap();
                Fora::delete_edge(&mut g, &cfg, &mut idx, 11, 4_000, &mut rng).unwrap();
                black_box(idx)
            },
            BatchSize::LargeInput,
        )
    });

    let high = cfg.with_alpha(0.4);
    let static_index = StaticStackIndex::build(&g, &high, &mut rng).unwrap();
    group.bench_function("lower_alpha", |b| {
        b.iter_batched(
            || (static_index.clone(), high),
            |(mut idx, mut cfg)| {
                idx.update_alpha(&g, &mut cfg, 0.2, &mut rng).unwrap();
                black_box(idx)
            },
            BatchSize::LargeInput,
        )
    });
    group.finish();
}

criterion_group!(benches, bench_build, bench_query, bench_repair);
criterion_main!(benches);
