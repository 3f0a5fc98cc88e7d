//! End-to-end dispatch scenarios against a running gateway.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

mod common;

/// Mock analyzer that counts `/analyze` hits and answers 200.
async fn counting_analyzer(hits: Arc<AtomicU32>) -> std::net::SocketAddr {
    common::start_mock_analyzer(move |method, path| {
        let hits = hits.clone();
        async move {
            if method == "POST" && path == "/analyze" {
                hits.fetch_add(1, Ordering::SeqCst);
            }
            (200, "ok".to_string())
        }
    })
    .await
}

fn message(n: usize) -> serde_json::Value {
    json!({
        "level": "INFO",
        "source": "test-agent",
        "message": format!("message {n}")
    })
}

#[tokio::test]
async fn test_happy_path_dispatch() {
    let hits: Vec<Arc<AtomicU32>> = (0..3).map(|_| Arc::new(AtomicU32::new(0))).collect();
    let a1 = counting_analyzer(hits[0].clone()).await;
    let a2 = counting_analyzer(hits[1].clone()).await;
    let a3 = counting_analyzer(hits[2].clone()).await;

    let gateway = common::start_gateway(common::test_config(vec![
        ("a1", a1, 1.0),
        ("a2", a2, 1.0),
        ("a3", a3, 1.0),
    ]))
    .await;
    let client = common::test_client();

    let resp = client
        .post(gateway.url("/logs"))
        .json(&json!({
            "agentId": "agent-1",
            "messages": [message(0), message(1), message(2)]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["messageCount"], 3);
    assert!(body["packetId"].as_str().is_some());

    let stats = common::wait_for_stats(&client, &gateway, |s| s["packetsProcessed"] == 1).await;
    assert_eq!(stats["packetsReceived"], 1);
    assert_eq!(stats["errors"], 0);
    assert_eq!(stats["queueSize"], 0);

    let total: u32 = hits.iter().map(|h| h.load(Ordering::SeqCst)).sum();
    assert_eq!(total, 3, "every message reaches exactly one analyzer");

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn test_backpressure_rejects_when_queue_full() {
    // Analyzer slow enough to pin the single worker for the whole test.
    let analyzer = common::start_mock_analyzer(|_, _| async {
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        (200, "ok".to_string())
    })
    .await;

    let mut config = common::test_config(vec![("a1", analyzer, 1.0)]);
    config.queue.max_queue_size = 2;
    config.queue.batch_size = 1;
    config.dispatch.worker_count = 1;

    let gateway = common::start_gateway(config).await;
    let client = common::test_client();

    let post = |n: usize| {
        let client = client.clone();
        let url = gateway.url("/logs");
        async move {
            client
                .post(url)
                .json(&json!([message(n)]))
                .send()
                .await
                .unwrap()
        }
    };

    // The first packet is drained immediately and stalls the worker.
    assert_eq!(post(0).await.status(), 200);
    tokio::time::sleep(Duration::from_millis(200)).await;

    // These two fill the queue.
    assert_eq!(post(1).await.status(), 200);
    assert_eq!(post(2).await.status(), 200);

    // The very next submission is rejected without growing the queue.
    let rejected = post(3).await;
    assert_eq!(rejected.status(), 429);
    let body: serde_json::Value = rejected.json().await.unwrap();
    assert_eq!(body["error"], "Service temporarily unavailable");
    assert_eq!(body["message"], "Queue full (capacity 2)");

    let stats: serde_json::Value = client
        .get(gateway.url("/stats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["packetsDropped"], 1);
    assert_eq!(stats["queueSize"], 2);
    assert_eq!(stats["packetsReceived"], 4);

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn test_eviction_mid_flight() {
    let slow_hits = Arc::new(AtomicU32::new(0));
    let a1 = {
        let hits = slow_hits.clone();
        common::start_mock_analyzer(move |_, path| {
            let hits = hits.clone();
            async move {
                if path == "/analyze" {
                    hits.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(300)).await;
                }
                (200, "ok".to_string())
            }
        })
        .await
    };
    let fast_hits = Arc::new(AtomicU32::new(0));
    let a2 = counting_analyzer(fast_hits.clone()).await;

    let gateway =
        common::start_gateway(common::test_config(vec![("a1", a1, 1.0), ("a2", a2, 1.0)])).await;
    let client = common::test_client();

    let messages: Vec<_> = (0..10).map(message).collect();
    let resp = client
        .post(gateway.url("/logs"))
        .json(&json!(messages))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Evict a1 while its sends are still in flight.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let resp = client
        .delete(gateway.url("/analyzers/a1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["evicted"], true);

    // Every message still completes; late a1 outcomes are dropped quietly.
    let stats = common::wait_for_stats(&client, &gateway, |s| s["packetsProcessed"] == 1).await;
    assert_eq!(stats["packetsReceived"], 1);
    assert_eq!(stats["packetsDropped"], 0);
    assert_eq!(stats["errors"], 0);

    let ids: Vec<_> = stats["analyzers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["a2"]);

    let delivered = slow_hits.load(Ordering::SeqCst) + fast_hits.load(Ordering::SeqCst);
    assert_eq!(delivered, 10);

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn test_packet_isolation_on_analyzer_rejections() {
    // Alternate 200/400 per request; 4xx must not touch analyzer health.
    let seq = Arc::new(AtomicU32::new(0));
    let analyzer = {
        let seq = seq.clone();
        common::start_mock_analyzer(move |_, path| {
            let seq = seq.clone();
            async move {
                if path != "/analyze" {
                    return (200, "ok".to_string());
                }
                if seq.fetch_add(1, Ordering::SeqCst) % 2 == 1 {
                    (400, "rejected".to_string())
                } else {
                    (200, "ok".to_string())
                }
            }
        })
        .await
    };

    let gateway = common::start_gateway(common::test_config(vec![("a1", analyzer, 1.0)])).await;
    let client = common::test_client();

    let messages: Vec<_> = (0..10).map(message).collect();
    let resp = client
        .post(gateway.url("/logs"))
        .json(&json!(messages))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let stats = common::wait_for_stats(&client, &gateway, |s| s["packetsProcessed"] == 1).await;
    assert_eq!(stats["errors"], 5);

    let analyzer_stats = &stats["analyzers"][0];
    assert_eq!(analyzer_stats["healthy"], true);
    assert_eq!(analyzer_stats["totalChecks"], 10);
    assert_eq!(analyzer_stats["totalFailures"], 0);
    assert_eq!(analyzer_stats["dispatchFailures"], 0);

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn test_invalid_packets_rejected_with_400() {
    let hits = Arc::new(AtomicU32::new(0));
    let analyzer = counting_analyzer(hits.clone()).await;
    let gateway = common::start_gateway(common::test_config(vec![("a1", analyzer, 1.0)])).await;
    let client = common::test_client();

    for body in [
        json!({"foo": "bar"}),
        json!({"agentId": "a", "messages": [{"level": "VERBOSE", "source": "s", "message": "m"}]}),
        json!({"agentId": "a", "messages": [{"level": "INFO", "source": "", "message": "m"}]}),
        json!({"agentId": "a", "messages": []}),
    ] {
        let resp = client
            .post(gateway.url("/logs"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400, "body {body} should be rejected");
        let reply: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(reply["error"], "Invalid log packet");
    }

    // Invalid packets are never counted received.
    let stats: serde_json::Value = client
        .get(gateway.url("/stats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["packetsReceived"], 0);
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn test_graceful_shutdown_stops_ingress() {
    let hits = Arc::new(AtomicU32::new(0));
    let analyzer = counting_analyzer(hits.clone()).await;
    let gateway = common::start_gateway(common::test_config(vec![("a1", analyzer, 1.0)])).await;
    let client = common::test_client();

    let resp = client
        .post(gateway.url("/logs"))
        .json(&json!([message(0)]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    gateway.shutdown.trigger();
    tokio::time::sleep(Duration::from_millis(300)).await;

    // The listener is gone after shutdown.
    assert!(client
        .get(gateway.url("/health"))
        .timeout(Duration::from_millis(500))
        .send()
        .await
        .is_err());
}
