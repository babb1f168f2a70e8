use std::sync::Arc;
use std::thread;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use datacollector_common::resilience::RecordingSleeper;
use datacollector_core::request::{Client, RequestMetrics, RequestOptions};
use datacollector_core::testing::ScriptedTransport;
use datacollector_core::HttpResponse;
use datacollector_domain::{ClientConfig, ErrorKind, MetricsConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn seeded_metrics() -> Arc<RequestMetrics> {
    Arc::new(RequestMetrics::with_rng(MetricsConfig::default(), StdRng::seed_from_u64(7)))
}

fn record_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("request_metrics");
    group.sample_size(20).measurement_time(std::time::Duration::from_secs(10));

    group.bench_function("record_success", |b| {
        let metrics = seeded_metrics();
        let mut latency = 0.0;
        b.iter(|| {
            latency = (latency + 1.0) % 500.0;
            metrics.record_success(black_box("bench.example"), "direct", 200, latency);
        });
    });

    group.bench_function("record_contended_4_threads", |b| {
        let metrics = seeded_metrics();
        b.iter(|| {
            let handles: Vec<_> = (0..4)
                .map(|worker| {
                    let metrics = Arc::clone(&metrics);
                    thread::spawn(move || {
                        let proxy = format!("p{worker}:8080");
                        for i in 0..250 {
                            if i % 10 == 0 {
                                metrics.record_failure("bench.example", &proxy, ErrorKind::Timeout);
                            } else {
                                metrics.record_success("bench.example", &proxy, 200, f64::from(i));
                            }
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().expect("worker thread");
            }
        });
    });

    group.bench_function("snapshot_full_reservoirs", |b| {
        let metrics = seeded_metrics();
        for domain in 0..20 {
            for i in 0..2_000 {
                metrics.record_success(&format!("d{domain}.example"), "direct", 200, f64::from(i % 700));
            }
        }
        b.iter(|| black_box(metrics.snapshot()));
    });

    group.finish();
}

fn client_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("request_client");
    group.sample_size(20).measurement_time(std::time::Duration::from_secs(10));

    group.bench_function("get_with_one_retry", |b| {
        let metrics = seeded_metrics();
        let config = ClientConfig::builder().retries(1).build().expect("config");
        b.iter(|| {
            let transport = ScriptedTransport::new([
                Ok(HttpResponse::new(503)),
                Ok(HttpResponse::new(200)),
            ]);
            let mut client = Client::new(transport, config.clone())
                .with_metrics(Arc::clone(&metrics))
                .with_sleeper(Arc::new(RecordingSleeper::new()));
            black_box(client.get("https://bench.example/page", RequestOptions::new()));
        });
    });

    group.finish();
}

criterion_group!(core_benchmarks, record_benchmark, client_benchmark);
criterion_main!(core_benchmarks);
