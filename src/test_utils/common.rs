use std::time::Duration;

use crate::AnalyticsEvent;
use crate::EntityId;
use crate::EventType;
use crate::TelemetryConfig;

pub const TEST_SESSION_ID: &str = "1700000000000-testsessn";

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
    println!("setup logger for unit test.");
}

pub fn click(entity_id: EntityId) -> AnalyticsEvent {
    AnalyticsEvent::interaction(entity_id, EventType::Click, TEST_SESSION_ID, None)
}

pub fn entity_ids(events: &[AnalyticsEvent]) -> Vec<EntityId> {
    events.iter().map(|e| e.entity_id()).collect()
}

/// Default config with the shipped thresholds made explicit
pub fn test_config() -> TelemetryConfig {
    let mut config = TelemetryConfig::default();
    config.batching.batch_size = 5;
    config.batching.flush_interval_ms = 5_000;
    config.batching.max_queue = 50;
    config.engagement.bounce_threshold_ms = 3_000;
    config
}

/// Gives spawned tasks a chance to run without moving the paused clock
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

/// Moves the paused clock and lets woken tasks run
pub async fn advance_and_settle(duration: Duration) {
    tokio::time::advance(duration).await;
    settle().await;
}

/// Polls `condition` on the real clock until it holds or `timeout` elapses
pub async fn wait_until<F>(
    condition: F,
    timeout: Duration,
) -> bool
where
    F: Fn() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
