use storefront_telemetry::TelemetryClient;
use tempfile::tempdir;

use crate::common::TestEndpoint;

#[tokio::test]
async fn test_session_id_survives_client_restart() {
    let endpoint = TestEndpoint::start();
    let dir = tempdir().unwrap();
    let mut config = endpoint.config();
    config.session.store_dir = Some(dir.path().to_path_buf());

    let first = TelemetryClient::builder(config.clone()).build().unwrap();
    let session_id = first.session_id().to_string();
    first.track_click(1);
    first.shutdown().await;
    drop(first);

    let second = TelemetryClient::builder(config).build().unwrap();
    assert_eq!(second.session_id(), session_id);
    second.track_click(2);
    second.flush().await;

    let events = endpoint.accepted_events();
    assert!(!events.is_empty());
    assert!(events.iter().all(|e| e["sessionId"] == session_id.as_str()));
}

#[tokio::test]
async fn test_separate_stores_get_separate_sessions() {
    let endpoint = TestEndpoint::start();
    let first = TelemetryClient::builder(endpoint.config()).build().unwrap();
    let second = TelemetryClient::builder(endpoint.config()).build().unwrap();

    assert_ne!(first.session_id(), second.session_id());
}
