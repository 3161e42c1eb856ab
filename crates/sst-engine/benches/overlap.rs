//! Overlap Detection Benchmarks
//!
//! Compares the exhaustive pairwise scan with sweep-and-prune.
//!
//! # Running Benchmarks
//! ```bash
//! cargo bench --package sst-engine --bench overlap
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

use sst_engine::{OverlapDetector, PairwiseOverlap, SweepOverlap};
use sst_models::{BoundingBox, TrackId};

/// Scatter `n` boxes over a 1920x1080 frame with a fixed seed.
fn scatter(n: usize, seed: u64, max_size: i32) -> Vec<(TrackId, BoundingBox)> {
    let mut state = seed;
    let mut next = move |m: i32| {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((state >> 33) % m as u64) as i32
    };

    (0..n)
        .map(|i| {
            let x = next(1920);
            let y = next(1080);
            let w = next(max_size) + 1;
            let h = next(max_size) + 1;
            (i as TrackId, BoundingBox::new(x, y, x + w, y + h))
        })
        .collect()
}

fn bench_overlap(c: &mut Criterion) {
    let mut group = c.benchmark_group("overlap");
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(3));

    let detectors: [&dyn OverlapDetector; 2] = [&PairwiseOverlap, &SweepOverlap];

    for size in [8usize, 32, 128, 512] {
        let persons = scatter(size, 1, 200);
        let phones = scatter(size, 2, 40);
        group.throughput(Throughput::Elements((size * size) as u64));

        for detector in detectors {
            group.bench_with_input(BenchmarkId::new(detector.name(), size), &size, |b, _| {
                b.iter(|| detector.find_overlaps(black_box(&persons), black_box(&phones)))
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_overlap);
criterion_main!(benches);
