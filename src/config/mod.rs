//! Configuration management for the telemetry pipeline.
//!
//! Values are merged from multiple sources with priority:
//! 1. Type defaults (hardcoded)
//! 2. Config file named by the `CONFIG_PATH` environment variable
//! 3. Environment variables with the `TELEMETRY__` prefix (highest priority)
//!
//! Example override: `TELEMETRY__BATCHING__BATCH_SIZE=10`.

mod batching;
mod endpoint;
mod engagement;
mod monitoring;
mod session;
mod shutdown;
pub use batching::*;
pub use endpoint::*;
pub use engagement::*;
pub use monitoring::*;
pub use session::*;
pub use shutdown::*;


//---
use std::env;
use std::fmt::Debug;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::CONFIG_ENV_PREFIX;
use crate::Result;

#[derive(Serialize, Deserialize, Clone, Default)]
pub struct TelemetryConfig {
    /// Queue sizing and flush triggers
    #[serde(default)]
    pub batching: BatchingConfig,
    /// Dwell-time classification
    #[serde(default)]
    pub engagement: EngagementConfig,
    /// Ingestion endpoint and HTTP client parameters
    #[serde(default)]
    pub endpoint: EndpointConfig,
    /// Session identity persistence
    #[serde(default)]
    pub session: SessionConfig,
    /// Last-gasp delivery behaviour
    #[serde(default)]
    pub shutdown: ShutdownConfig,
    /// Prometheus exporter
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

impl Debug for TelemetryConfig {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("TelemetryConfig")
            .field("batching", &self.batching)
            .field("engagement", &self.engagement)
            .field("endpoint", &self.endpoint)
            .field("session", &self.session)
            .field("shutdown", &self.shutdown)
            .field("monitoring", &self.monitoring)
            .finish()
    }
}

impl TelemetryConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// # Note
    /// Validation is deferred so that further overrides can be layered with
    /// [`with_override_config`](TelemetryConfig::with_override_config).
    /// Callers MUST call [`validate`](TelemetryConfig::validate) before use.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("CONFIG_PATH", "config/telemetry.toml");
    /// std::env::set_var("TELEMETRY__BATCHING__BATCH_SIZE", "10");
    /// let cfg = TelemetryConfig::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(env_source());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies additional configuration overrides from file without validation.
    ///
    /// Merging order (later sources override earlier):
    /// 1. Current configuration values
    /// 2. New configuration file
    /// 3. Latest environment variables (highest priority)
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validates every section and returns the validated instance.
    pub fn validate(self) -> Result<Self> {
        self.batching.validate()?;
        self.engagement.validate()?;
        self.endpoint.validate()?;
        self.session.validate()?;
        self.shutdown.validate()?;
        self.monitoring.validate()?;
        Ok(self)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(CONFIG_ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}
