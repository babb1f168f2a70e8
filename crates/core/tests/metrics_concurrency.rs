//! Concurrency tests for the shared metrics collector and the async client

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use datacollector_common::resilience::{MockClock, RecordingSleeper};
use datacollector_core::request::{Client, RequestMetrics, RequestOptions};
use datacollector_core::testing::ScriptedTransport;
use datacollector_core::{HttpResponse, TransportError, TransportFailure};
use datacollector_domain::{ClientConfig, ErrorKind, MetricsConfig};
use futures::future::join_all;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Validates that no records are lost under contention.
///
/// # Test Steps
/// 1. Spawn 10 threads sharing one collector
/// 2. Each records 100 successes for the same domain and proxy
/// 3. Verify the domain and proxy counts are exactly 1000
#[test]
fn test_parallel_records_are_not_lost() {
    let metrics = Arc::new(RequestMetrics::with_rng(MetricsConfig::default(), StdRng::seed_from_u64(3)));

    let handles: Vec<_> = (0..10)
        .map(|worker| {
            let metrics = Arc::clone(&metrics);
            thread::spawn(move || {
                for i in 0..100 {
                    metrics.record_success("shared.example", "direct", 200, f64::from(worker * 100 + i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.total_requests, 1000);
    assert_eq!(snapshot.by_domain.as_ref().unwrap()["shared.example"].count, 1000);
    assert_eq!(snapshot.by_proxy.as_ref().unwrap()["direct"].count, 1000);
    assert_eq!(metrics.domain_sample_count("shared.example"), Some(1000));
}

/// Validates mixed successes and failures from many threads.
///
/// Assertions:
/// - Ensures totals equal the sum of every recorded outcome.
/// - Confirms the error breakdown matches per-kind totals.
#[test]
fn test_parallel_mixed_outcomes_keep_counting_rule() {
    let metrics = Arc::new(RequestMetrics::new(MetricsConfig::default()));

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let metrics = Arc::clone(&metrics);
            thread::spawn(move || {
                let proxy = format!("p{worker}:8080");
                for i in 0..50 {
                    if i % 5 == 0 {
                        metrics.record_failure("mixed.example", &proxy, ErrorKind::Timeout);
                    } else {
                        metrics.record_success("mixed.example", &proxy, 200, 12.0);
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.total_requests, 400);
    assert_eq!(snapshot.total_errors, 80);
    assert_eq!(snapshot.error_rate_percent, 20.0);
    assert_eq!(snapshot.error_breakdown["timeout"], 80);
    assert_eq!(snapshot.by_proxy.unwrap().len(), 8);
}

/// Validates the circuit breaker with failures arriving from many threads.
#[test]
fn test_parallel_failures_trip_breaker() {
    let metrics = Arc::new(RequestMetrics::new(MetricsConfig::default()));

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let metrics = Arc::clone(&metrics);
            thread::spawn(move || {
                metrics.record_failure("down.example", &format!("p{worker}:1"), ErrorKind::Proxy);
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(metrics.is_target_unhealthy("https://down.example/x"));
    let failure = metrics.target_failure("down.example").unwrap();
    assert_eq!(failure.failure_count, 4);
    assert_eq!(failure.distinct_sources.len(), 4);
}

/// Validates the suspendable attempt loop.
///
/// # Test Steps
/// 1. Script a 503 then a 200 with one retry allowed
/// 2. Await `get_async`
/// 3. Verify the 200, one 1s backoff and two attempts
#[tokio::test]
async fn test_get_async_retries_then_succeeds() {
    let transport = Arc::new(ScriptedTransport::new([
        Ok(HttpResponse::new(503)),
        Ok(HttpResponse::new(200).with_body("done")),
    ]));
    let sleeper = RecordingSleeper::new();
    let config = ClientConfig::builder().retries(1).build().unwrap();
    let mut client = Client::new(Arc::clone(&transport), config)
        .with_sleeper(Arc::new(sleeper.clone()))
        .with_clock(Arc::new(MockClock::new()));

    let response = client.get_async("https://async.example/", RequestOptions::new()).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(transport.calls(), 2);
    assert_eq!(sleeper.delays(), vec![Duration::from_secs(1)]);
    assert!(!client.has_errors());
}

#[tokio::test]
async fn test_post_async_terminal_failure_is_journaled() {
    let transport = Arc::new(ScriptedTransport::new([Err(TransportError::new(
        TransportFailure::Proxy,
        "proxy handshake failed",
    ))]));
    let config = ClientConfig::builder().retries(0).build().unwrap();
    let mut client = Client::new(Arc::clone(&transport), config).with_sleeper(Arc::new(RecordingSleeper::new()));

    let response = client
        .post_async("https://async.example/submit", RequestOptions::new().bytes(b"a=1".to_vec()))
        .await;

    assert!(response.is_none());
    assert!(client.is_proxy_error());
    assert_eq!(client.journal().last_error().unwrap().message, "proxy handshake failed");
}

/// Validates many async clients sharing one collector.
///
/// # Test Steps
/// 1. Run 20 clients concurrently, each doing one 200 GET
/// 2. Verify the shared collector counted 20 requests and no errors
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_async_clients_share_collector() {
    let metrics = Arc::new(RequestMetrics::new(MetricsConfig::default()));

    let tasks = (0..20).map(|i| {
        let metrics = Arc::clone(&metrics);
        tokio::spawn(async move {
            let mut client = Client::new(ScriptedTransport::always(200), ClientConfig::default())
                .with_metrics(metrics);
            let url = format!("https://fanout.example/item/{i}");
            let response = client.get_async(&url, RequestOptions::new()).await;
            response
        })
    });

    let results = join_all(tasks).await;
    assert!(results.into_iter().all(|r| r.unwrap().is_some_and(|resp| resp.status == 200)));

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.total_requests, 20);
    assert_eq!(snapshot.total_errors, 0);
    assert_eq!(snapshot.by_domain.unwrap()["fanout.example"].success, 20);
}
