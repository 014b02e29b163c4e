//! Per-entity dwell timers and the bounce rule.


use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::trace;

use crate::EntityId;
use crate::EventType;

/// Start-of-view instants keyed by entity.
///
/// An entry lives for exactly one view/close cycle: `start_view` creates
/// it (replacing any unfinished one), `close_view` consumes it.
#[derive(Debug, Default)]
pub struct DwellTimerRegistry {
    started: DashMap<EntityId, Instant>,
}

impl DwellTimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last start wins; views do not stack.
    pub fn start_view(
        &self,
        entity_id: EntityId,
    ) {
        if self.started.insert(entity_id, Instant::now()).is_some() {
            trace!(entity_id, "restarted unfinished dwell timer");
        }
    }

    /// Removes the timer and returns the elapsed dwell.
    /// `None` when no view is open, so a repeated close is a no-op.
    pub fn close_view(
        &self,
        entity_id: EntityId,
    ) -> Option<Duration> {
        self.started
            .remove(&entity_id)
            .map(|(_, started_at)| started_at.elapsed())
    }

    /// Number of views started and not yet closed
    pub fn pending(&self) -> usize {
        self.started.len()
    }

    pub fn clear(&self) {
        self.started.clear();
    }
}

/// Classifies a closed dwell as engaged (`view`) or not (`bounce`)
#[derive(Debug, Clone, Copy)]
pub struct EngagementPolicy {
    bounce_threshold: Duration,
}

impl EngagementPolicy {
    pub fn new(bounce_threshold: Duration) -> Self {
        Self { bounce_threshold }
    }

    pub fn bounce_threshold(&self) -> Duration {
        self.bounce_threshold
    }

    pub fn classify(
        &self,
        dwell: Duration,
    ) -> EventType {
        if dwell < self.bounce_threshold {
            EventType::Bounce
        } else {
            EventType::View
        }
    }
}
