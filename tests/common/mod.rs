use std::net::SocketAddr;
use std::sync::atomic::AtomicU16;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use storefront_telemetry::TelemetryConfig;
use tokio::sync::oneshot;
use warp::http::StatusCode;
use warp::Filter;

pub const API_KEY: &str = "integration-key";

// real clock; every wait is bounded by this
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Ingestion endpoint whose answer can be switched while it runs
pub struct TestEndpoint {
    addr: SocketAddr,
    status: Arc<AtomicU16>,
    batches: Arc<Mutex<Vec<serde_json::Value>>>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestEndpoint {
    pub fn start() -> Self {
        let status = Arc::new(AtomicU16::new(200));
        let batches: Arc<Mutex<Vec<serde_json::Value>>> = Arc::default();

        let answer = status.clone();
        let sink = batches.clone();
        let route = warp::post()
            .and(warp::path!("api" / "analytics" / "events"))
            .and(warp::header::exact("authorization", "Bearer integration-key"))
            .and(warp::body::json())
            .map(move |body: serde_json::Value| {
                let status = StatusCode::from_u16(answer.load(Ordering::SeqCst)).unwrap();
                if status.is_success() {
                    sink.lock().push(body);
                }
                warp::reply::with_status("", status)
            });

        let (tx, rx) = oneshot::channel::<()>();
        let (addr, server) = warp::serve(route).bind_with_graceful_shutdown(([127, 0, 0, 1], 0), async {
            rx.await.ok();
        });
        tokio::spawn(server);

        Self {
            addr,
            status,
            batches,
            shutdown: Some(tx),
        }
    }

    pub fn set_status(
        &self,
        status: u16,
    ) {
        self.status.store(status, Ordering::SeqCst);
    }

    /// Accepted batches, each as its list of entity ids
    pub fn accepted(&self) -> Vec<Vec<u64>> {
        self.batches
            .lock()
            .iter()
            .map(|body| {
                body["events"]
                    .as_array()
                    .map(|events| events.iter().filter_map(|e| e["entityId"].as_u64()).collect())
                    .unwrap_or_default()
            })
            .collect()
    }

    pub fn accepted_events(&self) -> Vec<serde_json::Value> {
        self.batches
            .lock()
            .iter()
            .filter_map(|body| body["events"].as_array().cloned())
            .flatten()
            .collect()
    }

    pub fn config(&self) -> TelemetryConfig {
        let mut config = TelemetryConfig::default();
        config.endpoint.url = format!("http://{}/api/analytics/events", self.addr);
        config.endpoint.api_key = Some(API_KEY.to_string());
        config
    }
}

impl Drop for TestEndpoint {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

pub async fn wait_until<F>(condition: F) -> bool
where
    F: Fn() -> bool,
{
    let deadline = tokio::time::Instant::now() + WAIT_TIMEOUT;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
