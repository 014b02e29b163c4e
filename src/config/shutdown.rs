use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

use crate::Result;

/// Last-gasp delivery on termination
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ShutdownConfig {
    /// Fire-and-forget delivery of the queue contents
    #[serde(default = "default_true")]
    pub beacon: bool,

    /// Standard flush issued after the beacon.
    /// Both paths together may deliver the same batch twice; disable this
    /// flag if downstream should only see the beacon.
    #[serde(default = "default_true")]
    pub backup_flush: bool,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            beacon: default_true(),
            backup_flush: default_true(),
        }
    }
}

impl ShutdownConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.beacon && !self.backup_flush {
            warn!("shutdown.beacon and shutdown.backup_flush are both disabled: queued events are lost on shutdown");
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}
