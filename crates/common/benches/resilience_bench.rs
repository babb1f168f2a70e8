//! Resilience primitive benchmarks
//!
//! Reservoir sampling, percentile extraction and backoff calculation.
//!
//! Run with: `cargo bench --bench resilience_bench -p datacollector-common
//! --features runtime`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use datacollector_common::resilience::{percentile, BackoffStrategy, Reservoir};
use rand::rngs::StdRng;
use rand::SeedableRng;

// ============================================================================
// Reservoir Benchmarks
// ============================================================================

fn bench_reservoir_offer(c: &mut Criterion) {
    let mut group = c.benchmark_group("reservoir_offer");

    for capacity in [100_usize, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(capacity), &capacity, |b, &capacity| {
            let mut rng = StdRng::seed_from_u64(42);
            let mut reservoir = Reservoir::new(capacity);
            let mut value = 0.0;
            b.iter(|| {
                value += 1.0;
                reservoir.offer(black_box(value), &mut rng);
            });
        });
    }

    group.finish();
}

fn bench_percentile(c: &mut Criterion) {
    let mut group = c.benchmark_group("percentile");

    for size in [100_usize, 1_000, 10_000] {
        let samples: Vec<f64> = (0..size).map(|i| ((i * 7919) % size) as f64).collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &samples, |b, samples| {
            b.iter(|| black_box(percentile(samples, 0.95)));
        });
    }

    group.finish();
}

// ============================================================================
// Backoff Benchmarks
// ============================================================================

fn bench_backoff(c: &mut Criterion) {
    let strategy = BackoffStrategy::exponential_seconds(2);
    c.bench_function("exponential_delay_schedule", |b| {
        b.iter(|| {
            for attempt in 0..20 {
                black_box(strategy.calculate_delay(black_box(attempt)));
            }
        });
    });
}

criterion_group!(resilience, bench_reservoir_offer, bench_percentile, bench_backoff);
criterion_main!(resilience);
