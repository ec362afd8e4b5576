//! Load testing for the relay gateway.

use std::time::Instant;

mod common;
use common::{client, test_config, Origin, Reply, TestGateway};

#[tokio::test]
async fn test_load_performance() {
    // 1. Setup Mock Origin
    let origin = Origin::fixed(Reply::ok("Hello from origin").header("Content-Type", "text/plain")).await;

    // 2. Start Gateway with budgets large enough for one client address
    let mut config = test_config();
    config.admission.client_max = 100_000;
    config.admission.domain_max = 50_000;
    let gateway = TestGateway::start(config).await;

    // 3. Run Load Test against a handful of URLs so most requests are cache hits
    let concurrency = 20;
    let requests_per_task = 50;
    let total_requests = concurrency * requests_per_task;
    let distinct_urls = 5;

    let client = client();
    let start = Instant::now();

    let mut tasks = Vec::new();
    for task in 0..concurrency {
        let client = client.clone();
        let url = gateway.proxy_url(&origin.url(&format!("/{}", task % distinct_urls)));
        tasks.push(tokio::spawn(async move {
            let mut latencies = Vec::new();
            for _ in 0..requests_per_task {
                let req_start = Instant::now();
                if let Ok(res) = client.get(&url).send().await {
                    if res.status().is_success() && res.bytes().await.is_ok() {
                        latencies.push(req_start.elapsed());
                    }
                }
            }
            latencies
        }));
    }

    let mut all_latencies = Vec::new();
    for task in tasks {
        all_latencies.extend(task.await.unwrap());
    }

    let duration = start.elapsed();
    let rps = total_requests as f64 / duration.as_secs_f64();

    if all_latencies.is_empty() {
        panic!("No successful requests recorded");
    }

    all_latencies.sort();
    let p50 = all_latencies[all_latencies.len() / 2];
    let p95 = all_latencies[(all_latencies.len() as f64 * 0.95) as usize];
    let p99 = all_latencies[(all_latencies.len() as f64 * 0.99) as usize];

    println!("\n--- Load Test Results ---");
    println!("Total Requests: {}", total_requests);
    println!("Concurrency:    {}", concurrency);
    println!("Total Duration: {:?}", duration);
    println!("Requests/sec:   {:.2}", rps);
    println!("P50 Latency:    {:?}", p50);
    println!("P95 Latency:    {:?}", p95);
    println!("P99 Latency:    {:?}", p99);
    println!("Origin Hits:    {}", origin.hits());
    println!("Success Rate:   {}/{}", all_latencies.len(), total_requests);
    println!("-------------------------\n");

    assert_eq!(all_latencies.len(), total_requests);
    // Cold-cache races may fetch a URL more than once, but never per request.
    assert!(origin.hits() >= distinct_urls);
    assert!(origin.hits() <= concurrency);
}
