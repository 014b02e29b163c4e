//! Idle-flush timer.
//!
//! Holds at most one pending timer. Arming while a timer is pending is a
//! no-op (debounce); disarming cancels the sleeping timer. Once a timer
//! fires it releases its slot before running its task, so a delivery
//! started by the timer is never cancelled by a later `disarm`.


use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::sleep_until;
use tokio::time::Instant;
use tracing::trace;

#[derive(Default)]
struct TimerSlot {
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

pub struct FlushScheduler {
    interval: Duration,
    runtime: Handle,
    slot: Arc<Mutex<TimerSlot>>,
}

impl FlushScheduler {
    pub fn new(
        interval: Duration,
        runtime: Handle,
    ) -> Self {
        Self {
            interval,
            runtime,
            slot: Default::default(),
        }
    }

    /// Starts the idle timer unless one is already pending.
    ///
    /// Returns `true` if a new timer was started.
    pub fn arm<F>(
        &self,
        task: F,
    ) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut slot = self.slot.lock();
        if slot.pending.is_some() {
            return false;
        }

        slot.generation += 1;
        let generation = slot.generation;
        let interval = self.interval;
        let deadline = Instant::now() + interval;
        let shared = self.slot.clone();

        slot.pending = Some(self.runtime.spawn(async move {
            sleep_until(deadline).await;
            {
                let mut slot = shared.lock();
                if slot.generation != generation {
                    // disarmed between wake-up and here
                    return;
                }
                slot.pending = None;
            }
            trace!("idle timer fired after {:?}", interval);
            task.await;
        }));
        trace!("idle timer armed, generation={}", generation);
        true
    }

    /// Cancels the pending timer, if any.
    ///
    /// Returns `true` if a timer was cancelled.
    pub fn disarm(&self) -> bool {
        let mut slot = self.slot.lock();
        match slot.pending.take() {
            Some(handle) => {
                slot.generation += 1;
                handle.abort();
                trace!("idle timer disarmed");
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.slot.lock().pending.is_some()
    }
}

impl Drop for FlushScheduler {
    fn drop(&mut self) {
        self.disarm();
    }
}
