// Benchmarks for chunk generation and streaming.
//
// Run with: cargo bench -p scarcely_sim
//
// `generate` measures a single chunk derivation. `stream_walk` measures a
// sim walking east at full speed for a few hundred steps, which covers
// generation, re-materialization, and culling together.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use scarcely_sim::chunk_gen::generate_chunk;
use scarcely_sim::command::InputFrame;
use scarcely_sim::config::GameConfig;
use scarcely_sim::sim::SimState;
use scarcely_sim::types::{ChunkCoord, WorldSeed};

fn bench_generate(c: &mut Criterion) {
    let config = GameConfig::default();
    let seed = WorldSeed::new("abc");
    let mut group = c.benchmark_group("chunk_gen");

    group.bench_function("generate", |b| {
        b.iter(|| generate_chunk(black_box(&seed), black_box(ChunkCoord::new(17, -4)), &config));
    });

    group.bench_function("generate_view_square", |b| {
        b.iter(|| {
            for cx in -2..=2 {
                for cy in -2..=2 {
                    black_box(generate_chunk(&seed, ChunkCoord::new(cx, cy), &config));
                }
            }
        });
    });

    group.finish();
}

fn bench_stream_walk(c: &mut Criterion) {
    let right = InputFrame::from_keys(["d"], []);
    c.bench_function("stream_walk", |b| {
        b.iter(|| {
            let mut sim = SimState::new("abc");
            for _ in 0..300 {
                black_box(sim.step(&right, 0.25));
            }
            sim
        });
    });
}

criterion_group!(benches, bench_generate, bench_stream_walk);
criterion_main!(benches);
