//! Benchmark for the per-frame engine body.
//!
//! TARGET: a full frame (update + prune + spawn + render) for 500 glyphs
//! well under 1 ms, leaving the rest of the 16.6 ms budget to the host.
//!
//! Run with: cargo bench --package glyphfall_particles --bench engine_benchmark

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use glyphfall_particles::particle::{blur_at, opacity_at, scale_at};
use glyphfall_particles::{ConfigPatch, HostEnvironment, ParticleEngine, RecordingSurface};

fn full_engine(max_particles: usize) -> ParticleEngine<RecordingSurface> {
    let patch = ConfigPatch::new()
        .max_particles(max_particles)
        .spawn_rate(1_000.0)
        .seed(42);
    let mut engine = ParticleEngine::new(
        RecordingSurface::new(1920.0, 1080.0),
        &patch,
        HostEnvironment::new(2.0, false),
    )
    .unwrap();
    // Fill to the cap
    engine.update(1_000.0);
    engine
}

fn bench_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_frame");

    for count in [30usize, 150, 500] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut engine = full_engine(count);
            engine.start();
            let mut now = 0.0f64;
            b.iter(|| {
                now += 16.0;
                black_box(engine.frame(black_box(now)))
            });
        });
    }

    group.finish();
}

fn bench_update_only(c: &mut Criterion) {
    let mut engine = full_engine(500);
    c.bench_function("engine_update_500", |b| {
        b.iter(|| engine.update(black_box(16.0)));
    });
}

fn bench_render_only(c: &mut Criterion) {
    let mut engine = full_engine(500);
    c.bench_function("engine_render_500", |b| {
        b.iter(|| black_box(engine.render()));
    });

    let mut sorted = full_engine(500);
    sorted.update_config(&ConfigPatch::new().sort_by_depth(true));
    c.bench_function("engine_render_500_sorted", |b| {
        b.iter(|| black_box(sorted.render()));
    });
}

fn bench_depth_curves(c: &mut Criterion) {
    c.bench_function("depth_curves_1000", |b| {
        b.iter(|| {
            let mut acc = 0.0f32;
            for i in 0..1_000u16 {
                let depth = f32::from(i) / 1_000.0;
                acc += scale_at(depth) + opacity_at(depth) + blur_at(depth);
            }
            black_box(acc)
        });
    });
}

criterion_group!(
    benches,
    bench_frame,
    bench_update_only,
    bench_render_only,
    bench_depth_curves,
);
criterion_main!(benches);
