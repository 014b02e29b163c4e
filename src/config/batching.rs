use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::constants::DEFAULT_BATCH_SIZE;
use crate::constants::DEFAULT_FLUSH_INTERVAL_MS;
use crate::constants::DEFAULT_MAX_QUEUE;
use crate::Error;
use crate::Result;

/// Controls when the event queue is drained and how much it may hold
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BatchingConfig {
    /// Queue length that triggers an immediate, same-call flush
    /// Default: 5
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Idle time (ms) after which a partial batch is flushed
    /// Default: 5000
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,

    /// Maximum number of queued events once a failed batch is re-queued.
    /// Overflow is dropped.
    /// Default: 50
    #[serde(default = "default_max_queue")]
    pub max_queue: usize,
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            flush_interval_ms: default_flush_interval_ms(),
            max_queue: default_max_queue(),
        }
    }
}

impl BatchingConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batching.batch_size must be greater than 0".into()));
        }

        if self.flush_interval_ms == 0 {
            return Err(Error::InvalidConfig(
                "batching.flush_interval_ms must be at least 1ms".into(),
            ));
        }

        // A cap below one batch would evict part of every failed batch
        if self.max_queue < self.batch_size {
            return Err(Error::InvalidConfig(format!(
                "batching.max_queue ({}) must not be smaller than batching.batch_size ({})",
                self.max_queue, self.batch_size
            )));
        }

        Ok(())
    }
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}
fn default_flush_interval_ms() -> u64 {
    DEFAULT_FLUSH_INTERVAL_MS
}
fn default_max_queue() -> usize {
    DEFAULT_MAX_QUEUE
}
