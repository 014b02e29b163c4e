use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use warp::http::StatusCode;
use warp::Filter;

/// One request as seen by the fake ingestion endpoint
#[derive(Debug, Clone)]
pub struct ReceivedBatch {
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: serde_json::Value,
}

pub struct IngestionServer {
    pub addr: SocketAddr,
    pub received: Arc<Mutex<Vec<ReceivedBatch>>>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl IngestionServer {
    /// Serves `POST /api/analytics/events` on an ephemeral port and answers
    /// every request with `status`
    pub fn spawn(status: u16) -> Self {
        let received: Arc<Mutex<Vec<ReceivedBatch>>> = Arc::default();
        let sink = received.clone();
        let status = StatusCode::from_u16(status).unwrap();

        let route = warp::post()
            .and(warp::path!("api" / "analytics" / "events"))
            .and(warp::header::optional::<String>("authorization"))
            .and(warp::header::optional::<String>("content-type"))
            .and(warp::body::json())
            .map(
                move |authorization: Option<String>, content_type: Option<String>, body: serde_json::Value| {
                    sink.lock().push(ReceivedBatch {
                        authorization,
                        content_type,
                        body,
                    });
                    warp::reply::with_status("", status)
                },
            );

        let (tx, rx) = oneshot::channel::<()>();
        let (addr, server) = warp::serve(route).bind_with_graceful_shutdown(([127, 0, 0, 1], 0), async {
            rx.await.ok();
        });
        tokio::spawn(server);

        Self {
            addr,
            received,
            shutdown: Some(tx),
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}/api/analytics/events", self.addr)
    }

    pub fn received(&self) -> Vec<ReceivedBatch> {
        self.received.lock().clone()
    }
}

impl Drop for IngestionServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}
