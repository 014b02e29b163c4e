use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::AnalyticsEvent;
use crate::DeliveryError;
use crate::Result;
use crate::Transport;

/// Records every delivery attempt.
///
/// Outcomes are scripted per call with [`push_outcome`]; once the script is
/// exhausted the transport answers with the default outcome (`fail_all`).
///
/// [`push_outcome`]: RecordingTransport::push_outcome
#[derive(Default)]
pub struct RecordingTransport {
    attempts: Mutex<Vec<Vec<AnalyticsEvent>>>,
    delivered: Mutex<Vec<Vec<AnalyticsEvent>>>,
    beacons: Mutex<Vec<Vec<AnalyticsEvent>>>,
    script: Mutex<VecDeque<(bool, Duration)>>,
    fail_all: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let transport = Self::default();
        transport.fail_all.store(true, Ordering::SeqCst);
        transport
    }

    pub fn set_fail_all(
        &self,
        fail: bool,
    ) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    /// `true` = accept the next batch, `false` = reject it
    pub fn push_outcome(
        &self,
        success: bool,
    ) {
        self.push_slow_outcome(success, Duration::ZERO);
    }

    /// Like [`push_outcome`](RecordingTransport::push_outcome), but the
    /// answer only arrives after `latency` (tokio clock)
    pub fn push_slow_outcome(
        &self,
        success: bool,
        latency: Duration,
    ) {
        self.script.lock().push_back((success, latency));
    }

    pub fn attempts(&self) -> Vec<Vec<AnalyticsEvent>> {
        self.attempts.lock().clone()
    }

    pub fn delivered(&self) -> Vec<Vec<AnalyticsEvent>> {
        self.delivered.lock().clone()
    }

    pub fn beacons(&self) -> Vec<Vec<AnalyticsEvent>> {
        self.beacons.lock().clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_batch(
        &self,
        events: &[AnalyticsEvent],
    ) -> Result<()> {
        self.attempts.lock().push(events.to_vec());

        let (success, latency) = self
            .script
            .lock()
            .pop_front()
            .unwrap_or((!self.fail_all.load(Ordering::SeqCst), Duration::ZERO));

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if success {
            self.delivered.lock().push(events.to_vec());
            Ok(())
        } else {
            Err(DeliveryError::Status {
                status: 503,
                body: "unavailable".to_string(),
            }
            .into())
        }
    }

    fn send_beacon(
        &self,
        events: Vec<AnalyticsEvent>,
    ) {
        self.beacons.lock().push(events);
    }
}
