//! Interaction events emitted by the storefront.
//!
//! An [`AnalyticsEvent`] is immutable once built: fields are private and
//! only exposed through getters. Closing a dwell therefore produces a new
//! `view` event instead of patching the one emitted when the view started,
//! so consumers may see two `view` rows for the same entity and session.


use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::utils::time::timestamp_millis;

/// Opaque identifier of the subject of an interaction (e.g. a catalog item)
pub type EntityId = u64;

/// Closed set of interaction kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    View,
    Click,
    CartAdd,
    Purchase,
    Bounce,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::View => "view",
            EventType::Click => "click",
            EventType::CartAdd => "cart_add",
            EventType::Purchase => "purchase",
            EventType::Bounce => "bounce",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client environment captured when an event is emitted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
}

impl ClientContext {
    pub fn new(
        user_agent: impl Into<String>,
        referrer: Option<String>,
    ) -> Self {
        Self {
            user_agent: Some(user_agent.into()),
            referrer,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.user_agent.is_none() && self.referrer.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    entity_id: EntityId,
    event_type: EventType,
    session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    client_context: Option<ClientContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_on_page_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    order_ref: Option<String>,
    /// Unix epoch milliseconds at construction
    timestamp: u64,
}

impl AnalyticsEvent {
    fn new(
        entity_id: EntityId,
        event_type: EventType,
        session_id: &str,
        client_context: Option<&ClientContext>,
    ) -> Self {
        debug_assert!(!session_id.is_empty(), "session id must be resolved before emitting");
        Self {
            entity_id,
            event_type,
            session_id: session_id.to_string(),
            client_context: client_context.filter(|c| !c.is_empty()).cloned(),
            time_on_page_ms: None,
            order_ref: None,
            timestamp: timestamp_millis(),
        }
    }

    /// Plain interaction without extra payload: `view` (on start), `click`, `cart_add`
    pub fn interaction(
        entity_id: EntityId,
        event_type: EventType,
        session_id: &str,
        client_context: Option<&ClientContext>,
    ) -> Self {
        Self::new(entity_id, event_type, session_id, client_context)
    }

    pub fn purchase(
        entity_id: EntityId,
        order_ref: Option<&str>,
        session_id: &str,
        client_context: Option<&ClientContext>,
    ) -> Self {
        let mut event = Self::new(entity_id, EventType::Purchase, session_id, client_context);
        event.order_ref = order_ref.map(str::to_string);
        event
    }

    /// Event closing a dwell: `view` with a duration, or `bounce`
    pub fn dwell(
        entity_id: EntityId,
        event_type: EventType,
        dwell: Duration,
        session_id: &str,
        client_context: Option<&ClientContext>,
    ) -> Self {
        let mut event = Self::new(entity_id, event_type, session_id, client_context);
        event.time_on_page_ms = Some(u64::try_from(dwell.as_millis()).unwrap_or(u64::MAX));
        event
    }

    pub fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn client_context(&self) -> Option<&ClientContext> {
        self.client_context.as_ref()
    }

    pub fn time_on_page_ms(&self) -> Option<u64> {
        self.time_on_page_ms
    }

    pub fn order_ref(&self) -> Option<&str> {
        self.order_ref.as_deref()
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

/// Wire body accepted by the ingestion endpoint
#[derive(Debug, Serialize)]
pub struct EventBatch<'a> {
    pub events: &'a [AnalyticsEvent],
}
