//! Public tracking API of the telemetry pipeline.
//!
//! [`TelemetryClient`] owns the event queue, the idle-flush timer, the dwell
//! registry and the session identity. It is a cheap handle: clone it and
//! hand it to every producer.
//!
//! # Basic Usage
//! ```no_run
//! use storefront_telemetry::TelemetryClient;
//! use storefront_telemetry::TelemetryConfig;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = TelemetryConfig::new().unwrap();
//!     let client = TelemetryClient::builder(config).build().unwrap();
//!
//!     client.track_view(7);
//!     client.track_cart_add(7);
//!     client.track_time_on_page(7);
//!
//!     client.shutdown().await;
//! }
//! ```

mod builder;
pub use builder::*;


use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::RwLock;
use prometheus::IntGauge;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::info;
use tracing::trace;
use tracing::warn;

use crate::metrics::BATCHES_DELIVERED;
use crate::metrics::BATCHES_FAILED;
use crate::metrics::BATCH_SIZE;
use crate::metrics::BEACONS_SENT;
use crate::metrics::EVENTS_DROPPED;
use crate::metrics::EVENTS_ENQUEUED;
use crate::metrics::QUEUE_DEPTH;
use crate::AnalyticsEvent;
use crate::ClientContext;
use crate::DwellTimerRegistry;
use crate::EngagementPolicy;
use crate::EntityId;
use crate::EventQueue;
use crate::EventType;
use crate::FlushScheduler;
use crate::SessionIdentityProvider;
use crate::TelemetryConfig;
use crate::Transport;

/// Result of one drain of the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing was queued; no request was made
    Empty,
    /// The endpoint accepted this many events
    Delivered(usize),
    /// Delivery failed; the batch went back to the front of the queue
    /// minus `dropped` events that did not fit under the cap
    Requeued { attempted: usize, dropped: usize },
}

#[derive(Clone)]
pub struct TelemetryClient {
    inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    config: TelemetryConfig,
    queue: EventQueue,
    scheduler: FlushScheduler,
    dwell: DwellTimerRegistry,
    engagement: EngagementPolicy,
    session: SessionIdentityProvider,
    transport: Arc<dyn Transport>,
    context: RwLock<Option<ClientContext>>,
    runtime: Handle,
    /// This client's series of the queue depth gauge
    queue_depth: IntGauge,
    shut_down: AtomicBool,
    listening: AtomicBool,
}

impl TelemetryClient {
    pub fn builder(config: TelemetryConfig) -> TelemetryClientBuilder {
        TelemetryClientBuilder::new(config)
    }

    // ---------------------------------------------------------------
    // Tracking API. Fire-and-forget: never blocks on I/O, never fails.

    /// Starts the dwell timer for `entity_id` and records a `view`.
    pub fn track_view(
        &self,
        entity_id: EntityId,
    ) {
        self.inner.dwell.start_view(entity_id);
        self.emit(|session, ctx| AnalyticsEvent::interaction(entity_id, EventType::View, session, ctx));
    }

    pub fn track_click(
        &self,
        entity_id: EntityId,
    ) {
        self.emit(|session, ctx| AnalyticsEvent::interaction(entity_id, EventType::Click, session, ctx));
    }

    pub fn track_cart_add(
        &self,
        entity_id: EntityId,
    ) {
        self.emit(|session, ctx| AnalyticsEvent::interaction(entity_id, EventType::CartAdd, session, ctx));
    }

    pub fn track_purchase(
        &self,
        entity_id: EntityId,
        order_ref: Option<&str>,
    ) {
        self.emit(|session, ctx| AnalyticsEvent::purchase(entity_id, order_ref, session, ctx));
    }

    /// Closes the dwell timer for `entity_id` and records the dwell as a
    /// `view` with its duration, or as a `bounce` when it is shorter than
    /// the engagement threshold.
    ///
    /// Without an open dwell for `entity_id` this is a no-op.
    pub fn track_time_on_page(
        &self,
        entity_id: EntityId,
    ) {
        let Some(dwell) = self.inner.dwell.close_view(entity_id) else {
            trace!(entity_id, "no open dwell timer, ignoring close");
            return;
        };

        let event_type = self.inner.engagement.classify(dwell);
        self.emit(|session, ctx| AnalyticsEvent::dwell(entity_id, event_type, dwell, session, ctx));
    }

    // ---------------------------------------------------------------

    /// Drains the queue now.
    pub async fn flush(&self) -> FlushOutcome {
        self.inner.flush().await
    }

    /// Last-gasp delivery. Runs at most once per client.
    ///
    /// Cancels the idle timer, then, if anything is queued:
    /// 1. hands a copy of the queue to the transport's beacon
    ///    (`shutdown.beacon`), without waiting for an answer;
    /// 2. runs the standard [`flush`](TelemetryClient::flush)
    ///    (`shutdown.backup_flush`).
    ///
    /// With both enabled the same events may be delivered twice.
    pub async fn shutdown(&self) {
        let inner = &self.inner;
        if inner.shut_down.swap(true, Ordering::SeqCst) {
            debug!("telemetry shutdown already ran");
            return;
        }
        inner.scheduler.disarm();

        // Views still open at session end never get a dwell event
        let abandoned = inner.dwell.pending();
        if abandoned > 0 {
            debug!("telemetry shutdown: discarding {} open dwell timers", abandoned);
            inner.dwell.clear();
        }

        if inner.queue.is_empty() {
            info!("telemetry shutdown: queue empty");
            return;
        }
        let pending = inner.queue.snapshot();
        info!("telemetry shutdown: {} events queued", pending.len());

        let shutdown = &inner.config.shutdown;
        if shutdown.beacon {
            BEACONS_SENT.inc();
            inner.transport.send_beacon(pending);
        }
        if shutdown.backup_flush {
            let outcome = inner.flush().await;
            debug!("shutdown backup flush: {:?}", outcome);
        }
    }

    /// Runs [`shutdown`](TelemetryClient::shutdown) when `signal` fires or
    /// its sender is dropped.
    ///
    /// Only the first registration is honoured; later calls return `None`.
    pub fn listen_for_shutdown(
        &self,
        mut signal: watch::Receiver<()>,
    ) -> Option<JoinHandle<()>> {
        if self.inner.listening.swap(true, Ordering::SeqCst) {
            warn!("shutdown listener already registered");
            return None;
        }

        let client = self.clone();
        Some(self.inner.runtime.spawn(async move {
            let _ = signal.changed().await;
            client.shutdown().await;
        }))
    }

    /// Replaces the context attached to subsequently emitted events
    pub fn set_client_context(
        &self,
        context: Option<ClientContext>,
    ) {
        *self.inner.context.write() = context;
    }

    pub fn session_id(&self) -> &str {
        self.inner.session.session_id()
    }

    /// Events waiting for delivery
    pub fn queued(&self) -> usize {
        self.inner.queue.len()
    }

    /// Views started and not yet closed
    pub fn open_dwells(&self) -> usize {
        self.inner.dwell.pending()
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.inner.config
    }

    fn emit<F>(
        &self,
        build: F,
    ) where
        F: FnOnce(&str, Option<&ClientContext>) -> AnalyticsEvent,
    {
        let event = {
            let context = self.inner.context.read();
            build(self.inner.session.session_id(), context.as_ref())
        };
        ClientInner::enqueue(&self.inner, event);
    }
}

impl ClientInner {
    /// Queues `event` and applies the scheduling policy:
    /// reaching `batch_size` drains immediately, otherwise the idle timer
    /// is armed if it is not already pending.
    fn enqueue(
        this: &Arc<Self>,
        event: AnalyticsEvent,
    ) {
        EVENTS_ENQUEUED.with_label_values(&[event.event_type().as_str()]).inc();

        let len = this.queue.push(event);
        this.queue_depth.set(len as i64);

        if len >= this.config.batching.batch_size {
            trace!("size trigger: {} events queued", len);
            this.scheduler.disarm();
            Self::spawn_flush(this);
        } else {
            Self::arm_idle_flush(this);
        }
    }

    /// Takes the snapshot on the calling thread, delivers it in the
    /// background.
    fn spawn_flush(this: &Arc<Self>) {
        let batch = this.queue.take();
        if batch.is_empty() {
            return;
        }

        let inner = this.clone();
        this.runtime.spawn(async move {
            inner.deliver(batch).await;
        });
    }

    fn arm_idle_flush(this: &Arc<Self>) {
        // The timer must not keep a dropped client alive
        let weak = Arc::downgrade(this);
        this.scheduler.arm(async move {
            if let Some(inner) = weak.upgrade() {
                inner.on_idle_timer().await;
            }
        });
    }

    async fn on_idle_timer(self: Arc<Self>) {
        let outcome = self.flush().await;
        trace!("idle flush: {:?}", outcome);

        // Bursty producers may have refilled a whole batch meanwhile
        if !matches!(outcome, FlushOutcome::Requeued { .. })
            && self.queue.len() >= self.config.batching.batch_size
        {
            self.scheduler.disarm();
            let outcome = self.flush().await;
            trace!("follow-up flush after idle timer: {:?}", outcome);
        }
    }

    async fn flush(&self) -> FlushOutcome {
        let batch = self.queue.take();
        if batch.is_empty() {
            return FlushOutcome::Empty;
        }
        self.deliver(batch).await
    }

    async fn deliver(
        &self,
        batch: Vec<AnalyticsEvent>,
    ) -> FlushOutcome {
        let size = batch.len();
        BATCH_SIZE.observe(size as f64);
        self.queue_depth.set(self.queue.len() as i64);

        match self.transport.send_batch(&batch).await {
            Ok(()) => {
                BATCHES_DELIVERED.inc();
                debug!("delivered {} events", size);
                FlushOutcome::Delivered(size)
            }
            Err(e) => {
                BATCHES_FAILED.inc();
                warn!("failed to deliver {} events, re-queueing: {:?}", size, e);

                let cap = self.config.batching.max_queue;
                let dropped = self.queue.requeue_front(batch, cap);
                if dropped > 0 {
                    EVENTS_DROPPED.inc_by(dropped as u64);
                    debug!("queue cap {} reached, dropped {} events", cap, dropped);
                }
                self.queue_depth.set(self.queue.len() as i64);

                FlushOutcome::Requeued {
                    attempted: size,
                    dropped,
                }
            }
        }
    }
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        let _ = QUEUE_DEPTH.remove_label_values(&[self.session.session_id()]);
    }
}
