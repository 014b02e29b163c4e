//! Ordered buffer of events awaiting delivery.
//!
//! Every operation runs under a single lock, so `take` is an atomic
//! snapshot-and-clear: two competing drains can never both observe the
//! same events.


use std::collections::VecDeque;

use parking_lot::Mutex;
use tracing::trace;

use crate::AnalyticsEvent;

#[derive(Debug, Default)]
pub struct EventQueue {
    buffer: Mutex<VecDeque<AnalyticsEvent>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one event. Never fails and never evicts; capacity is only
    /// enforced when a failed batch is re-queued.
    ///
    /// Returns the queue length after the push.
    pub fn push(
        &self,
        event: AnalyticsEvent,
    ) -> usize {
        let mut buffer = self.buffer.lock();
        buffer.push_back(event);
        trace!("EventQueue::push, buffer.len()={}", buffer.len());
        buffer.len()
    }

    /// Snapshots and clears the queue in one step.
    pub fn take(&self) -> Vec<AnalyticsEvent> {
        let mut buffer = self.buffer.lock();
        std::mem::take(&mut *buffer).into()
    }

    /// Copies the queue without draining it
    pub fn snapshot(&self) -> Vec<AnalyticsEvent> {
        self.buffer.lock().iter().cloned().collect()
    }

    /// Puts a failed batch back in front of anything enqueued since it was
    /// taken, keeping its relative order, so it is delivered first.
    ///
    /// At most `cap - len` events are restored. When the batch does not
    /// fit, its oldest events are dropped; events already queued are never
    /// evicted.
    ///
    /// Returns the number of dropped events.
    pub fn requeue_front(
        &self,
        batch: Vec<AnalyticsEvent>,
        cap: usize,
    ) -> usize {
        let mut buffer = self.buffer.lock();
        let room = cap.saturating_sub(buffer.len());
        let dropped = batch.len().saturating_sub(room);

        for event in batch.into_iter().skip(dropped).rev() {
            buffer.push_front(event);
        }

        trace!(
            "EventQueue::requeue_front, cap={}, dropped={}, buffer.len()={}",
            cap,
            dropped,
            buffer.len()
        );
        dropped
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.lock().is_empty()
    }
}
