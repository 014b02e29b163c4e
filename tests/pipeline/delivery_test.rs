use storefront_telemetry::FlushOutcome;
use storefront_telemetry::TelemetryClient;

use crate::common::wait_until;
use crate::common::TestEndpoint;
use crate::enable_logger;

#[tokio::test]
async fn test_full_batch_is_posted_at_once() {
    enable_logger();
    let endpoint = TestEndpoint::start();
    let client = TelemetryClient::builder(endpoint.config()).build().unwrap();

    for id in 1..=5 {
        client.track_click(id);
    }

    assert!(wait_until(|| !endpoint.accepted().is_empty()).await);
    assert_eq!(endpoint.accepted(), vec![vec![1, 2, 3, 4, 5]]);
    assert_eq!(client.queued(), 0);
}

#[tokio::test]
async fn test_partial_batch_is_posted_after_idle_interval() {
    let endpoint = TestEndpoint::start();
    let mut config = endpoint.config();
    config.batching.flush_interval_ms = 100;
    let client = TelemetryClient::builder(config).build().unwrap();

    client.track_cart_add(4);
    client.track_purchase(4, Some("order-1"));

    assert!(wait_until(|| !endpoint.accepted().is_empty()).await);
    let events = endpoint.accepted_events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["eventType"], "cart_add");
    assert_eq!(events[1]["eventType"], "purchase");
    assert_eq!(events[1]["orderRef"], "order-1");
}

#[tokio::test]
async fn test_batch_survives_endpoint_outage() {
    enable_logger();
    let endpoint = TestEndpoint::start();
    endpoint.set_status(503);
    let client = TelemetryClient::builder(endpoint.config()).build().unwrap();

    for id in 1..=5 {
        client.track_click(id);
    }
    // back in the queue once the rejection comes in
    assert!(wait_until(|| client.queued() == 5).await);
    assert!(endpoint.accepted().is_empty());

    endpoint.set_status(200);
    client.track_click(6);

    assert!(wait_until(|| !endpoint.accepted().is_empty()).await);
    assert_eq!(endpoint.accepted(), vec![vec![1, 2, 3, 4, 5, 6]]);
}

#[tokio::test]
async fn test_explicit_flush_reports_outcome() {
    let endpoint = TestEndpoint::start();
    let client = TelemetryClient::builder(endpoint.config()).build().unwrap();

    assert_eq!(client.flush().await, FlushOutcome::Empty);

    client.track_click(1);
    endpoint.set_status(500);
    assert_eq!(
        client.flush().await,
        FlushOutcome::Requeued {
            attempted: 1,
            dropped: 0
        }
    );

    endpoint.set_status(200);
    assert_eq!(client.flush().await, FlushOutcome::Delivered(1));
}

#[tokio::test]
async fn test_quick_leave_is_posted_as_bounce() {
    let endpoint = TestEndpoint::start();
    let client = TelemetryClient::builder(endpoint.config()).build().unwrap();

    client.track_view(11);
    client.track_time_on_page(11);
    client.flush().await;

    let events = endpoint.accepted_events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["eventType"], "view");
    assert!(events[0].get("timeOnPageMs").is_none());
    assert_eq!(events[1]["eventType"], "bounce");
    assert!(events[1]["timeOnPageMs"].as_u64().is_some());
}
