// -
// Batching defaults

/// Queue length that triggers an immediate flush
pub(crate) const DEFAULT_BATCH_SIZE: usize = 5;
/// Idle time before a partial batch is flushed
pub(crate) const DEFAULT_FLUSH_INTERVAL_MS: u64 = 5_000;
/// Upper bound on queued events after a failed delivery is re-queued
pub(crate) const DEFAULT_MAX_QUEUE: usize = 50;

// -
// Engagement

/// Dwell time below which a closed view is reported as a bounce
pub(crate) const DEFAULT_BOUNCE_THRESHOLD_MS: u64 = 3_000;

// -
// Session identity

pub(crate) const DEFAULT_SESSION_STORAGE_KEY: &str = "analytics_session_id";
/// Length of the random part of a generated session id
pub(crate) const SESSION_ID_SUFFIX_LEN: usize = 9;

// -
// Ingestion endpoint

pub(crate) const DEFAULT_ENDPOINT_URL: &str = "http://127.0.0.1:8080/api/analytics/events";
pub(crate) const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 1_000;
pub(crate) const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 3_000;

// -
// Monitoring

pub(crate) const DEFAULT_PROMETHEUS_PORT: u16 = 9100;

/// Environment variable prefix for configuration overrides
pub(crate) const CONFIG_ENV_PREFIX: &str = "TELEMETRY";
