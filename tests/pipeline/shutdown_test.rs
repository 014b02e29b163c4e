use storefront_telemetry::TelemetryClient;
use tokio::sync::watch;

use crate::common::wait_until;
use crate::common::TestEndpoint;
use crate::enable_logger;

#[tokio::test]
async fn test_shutdown_delivers_queue_twice() {
    enable_logger();
    let endpoint = TestEndpoint::start();
    let client = TelemetryClient::builder(endpoint.config()).build().unwrap();

    client.track_click(1);
    client.track_click(2);
    client.shutdown().await;

    // beacon and backup flush carry the same events
    assert!(wait_until(|| endpoint.accepted().len() == 2).await);
    assert_eq!(endpoint.accepted(), vec![vec![1, 2], vec![1, 2]]);
    assert_eq!(client.queued(), 0);
}

#[tokio::test]
async fn test_shutdown_signal_flushes_queue() {
    let endpoint = TestEndpoint::start();
    let mut config = endpoint.config();
    config.shutdown.beacon = false;
    let client = TelemetryClient::builder(config).build().unwrap();

    let (graceful_tx, graceful_rx) = watch::channel(());
    let listener = client.listen_for_shutdown(graceful_rx).unwrap();

    client.track_click(3);
    graceful_tx.send(()).unwrap();
    listener.await.unwrap();

    assert_eq!(endpoint.accepted(), vec![vec![3]]);
    assert!(client.is_shut_down());
}

#[tokio::test]
async fn test_shutdown_with_endpoint_down_keeps_events() {
    let endpoint = TestEndpoint::start();
    endpoint.set_status(503);
    let mut config = endpoint.config();
    config.shutdown.beacon = false;
    let client = TelemetryClient::builder(config).build().unwrap();

    client.track_click(1);
    client.track_click(2);
    client.shutdown().await;

    assert!(endpoint.accepted().is_empty());
    assert_eq!(client.queued(), 2);
}
