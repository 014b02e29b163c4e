use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::constants::DEFAULT_BOUNCE_THRESHOLD_MS;
use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EngagementConfig {
    /// Dwell time (ms) under which a closed view is reported as a `bounce`
    /// Default: 3000
    #[serde(default = "default_bounce_threshold_ms")]
    pub bounce_threshold_ms: u64,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            bounce_threshold_ms: default_bounce_threshold_ms(),
        }
    }
}

impl EngagementConfig {
    pub fn bounce_threshold(&self) -> Duration {
        Duration::from_millis(self.bounce_threshold_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bounce_threshold_ms == 0 {
            return Err(Error::InvalidConfig(
                "engagement.bounce_threshold_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

fn default_bounce_threshold_ms() -> u64 {
    DEFAULT_BOUNCE_THRESHOLD_MS
}
