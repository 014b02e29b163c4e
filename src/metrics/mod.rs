//! Pipeline metrics exported in Prometheus text format.


use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::exponential_buckets;
use prometheus::Histogram;
use prometheus::HistogramOpts;
use prometheus::IntCounter;
use prometheus::IntCounterVec;
use prometheus::IntGaugeVec;
use prometheus::Opts;
use prometheus::Registry;
use tokio::sync::watch;
use tracing::error;
use tracing::info;
use warp::Filter;
use warp::Rejection;
use warp::Reply;

lazy_static! {
    pub static ref EVENTS_ENQUEUED: IntCounterVec = IntCounterVec::new(
        Opts::new("telemetry_events_enqueued_total", "Events accepted by the tracking API"),
        &["event_type"]
    )
    .expect("metric can not be created");

    pub static ref BATCHES_DELIVERED: IntCounter = IntCounter::new(
        "telemetry_batches_delivered_total",
        "Batches acknowledged by the ingestion endpoint"
    )
    .expect("metric can not be created");

    pub static ref BATCHES_FAILED: IntCounter = IntCounter::new(
        "telemetry_batches_failed_total",
        "Batches rejected or lost in transit and re-queued"
    )
    .expect("metric can not be created");

    pub static ref EVENTS_DROPPED: IntCounter = IntCounter::new(
        "telemetry_events_dropped_total",
        "Events discarded because the re-queue would exceed the queue cap"
    )
    .expect("metric can not be created");

    pub static ref BEACONS_SENT: IntCounter = IntCounter::new(
        "telemetry_beacons_sent_total",
        "Fire-and-forget deliveries issued on shutdown"
    )
    .expect("metric can not be created");

    /// One series per client, keyed by its session id
    pub static ref QUEUE_DEPTH: IntGaugeVec = IntGaugeVec::new(
        Opts::new("telemetry_queue_depth", "Events waiting for delivery"),
        &["session_id"]
    )
    .expect("metric can not be created");

    pub static ref BATCH_SIZE: Histogram = Histogram::with_opts(
        HistogramOpts::new("telemetry_batch_size", "Events per delivery attempt")
            .buckets(exponential_buckets(1.0, 2.0, 8).expect("valid buckets"))
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();
}

static REGISTER: Once = Once::new();

pub(crate) fn register_custom_metrics(registry: &Registry) {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(EVENTS_ENQUEUED.clone()),
        Box::new(BATCHES_DELIVERED.clone()),
        Box::new(BATCHES_FAILED.clone()),
        Box::new(EVENTS_DROPPED.clone()),
        Box::new(BEACONS_SENT.clone()),
        Box::new(QUEUE_DEPTH.clone()),
        Box::new(BATCH_SIZE.clone()),
    ];
    for collector in collectors {
        if let Err(e) = registry.register(collector) {
            error!("collector can not be registered: {:?}", e);
        }
    }
}

/// Registers the pipeline collectors with the crate [`REGISTRY`] once
pub fn init_metrics() {
    REGISTER.call_once(|| register_custom_metrics(&REGISTRY));
}

/// Renders [`REGISTRY`] in the Prometheus text exposition format
pub fn gather_text() -> String {
    use prometheus::Encoder;

    init_metrics();
    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        error!("could not encode custom metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_else(|e| {
        error!("custom metrics could not be from_utf8'd: {}", e);
        String::default()
    })
}

/// Serves `/metrics` on `port` until `shutdown_signal` fires
pub async fn start_server(
    port: u16,
    mut shutdown_signal: watch::Receiver<()>,
) {
    init_metrics();

    let metrics_route = warp::path!("metrics").and_then(metrics_handler);

    let (addr, server) = warp::serve(metrics_route).bind_with_graceful_shutdown(([0, 0, 0, 0], port), async move {
        let _ = shutdown_signal.changed().await;
    });
    info!("metrics server listening on {}", addr);
    server.await;
}

async fn metrics_handler() -> Result<impl Reply, Rejection> {
    Ok(gather_text())
}
