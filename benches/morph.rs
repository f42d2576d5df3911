//! Benchmarks for the per-frame and per-request CPU work.
//!
//! Run with: `cargo bench`

use cosmorph::idle::IdleMotion;
use cosmorph::morph::interpolate_into;
use cosmorph::prelude::*;
use cosmorph::PositionBuffer;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::SmallRng;
use rand::SeedableRng;

const COUNTS: [usize; 3] = [10_000, 50_000, 200_000];

fn sphere(count: usize, radius: f32, seed: u64) -> PositionBuffer {
    ShapeSampler::default()
        .sample(
            &ShapeRequest::Sphere { radius },
            count,
            &mut SmallRng::seed_from_u64(seed),
        )
        .unwrap()
}

fn bench_interpolate(c: &mut Criterion) {
    let mut group = c.benchmark_group("interpolate");
    for count in COUNTS {
        let a = sphere(count, 8.0, 1);
        let b = sphere(count, 4.0, 2);
        let mut out = PositionBuffer::zeroed(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |bench, _| {
            bench.iter(|| interpolate_into(&a, &b, black_box(0.37), &mut out))
        });
    }
    group.finish();
}

fn bench_idle(c: &mut Criterion) {
    let mut group = c.benchmark_group("idle_apply");
    let idle = IdleMotion::default();
    for count in COUNTS {
        let resting = sphere(count, 8.0, 3);
        let mut out = PositionBuffer::zeroed(count);
        let mut t = 0.0;
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |bench, _| {
            bench.iter(|| {
                t += 1.0 / 60.0;
                idle.apply(&resting, black_box(t), 10.0, &mut out)
            })
        });
    }
    group.finish();
}

fn bench_sample(c: &mut Criterion) {
    let mut group = c.benchmark_group("sample_50k");
    let sampler = ShapeSampler::default();
    let requests = [
        ("sphere", ShapeRequest::Sphere { radius: 8.0 }),
        ("torus", ShapeRequest::Solid(Solid::TORUS)),
        ("crystal", ShapeRequest::Solid(Solid::Octahedron { radius: 4.0 })),
        ("stars", ShapeRequest::Solid(Solid::STARS)),
    ];
    for (name, request) in requests {
        let mut out = PositionBuffer::zeroed(50_000);
        let mut rng = SmallRng::seed_from_u64(5);
        group.bench_function(name, |b| {
            b.iter(|| sampler.sample_into(&request, &mut out, &mut rng).unwrap())
        });
    }
    group.finish();
}

fn bench_tick(c: &mut Criterion) {
    let mut driver = AnimationDriver::new(FieldConfig {
        particle_count: 50_000,
        seed: Some(9),
        ..FieldConfig::default()
    })
    .unwrap();
    let mut now = 0.0;
    c.bench_function("driver_tick_50k", |b| {
        b.iter(|| {
            now += 1.0 / 60.0;
            if !driver.morph().is_morphing() {
                driver.request_shape(ShapeRequest::Solid(Solid::TORUS), now);
            }
            black_box(driver.tick(now))
        })
    });
}

criterion_group!(benches, bench_interpolate, bench_idle, bench_sample, bench_tick);
criterion_main!(benches);
