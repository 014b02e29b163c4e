//! Delivery of event batches to the ingestion endpoint.
//!
//! The endpoint accepts `POST { "events": [...] }` and either accepts the
//! whole batch (2xx) or none of it. There is no partial acceptance.

mod http;
pub use http::*;


#[cfg(test)]
use mockall::automock;

use async_trait::async_trait;

use crate::AnalyticsEvent;
use crate::Result;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Ships one batch and waits for the endpoint's verdict.
    ///
    /// # Errors
    /// - [`DeliveryError::Request`](crate::DeliveryError::Request) on
    ///   connection failures and timeouts
    /// - [`DeliveryError::Status`](crate::DeliveryError::Status) on a
    ///   non-2xx response
    async fn send_batch(
        &self,
        events: &[AnalyticsEvent],
    ) -> Result<()>;

    /// Best-effort delivery that returns immediately.
    ///
    /// The outcome is never observed by the caller and the request may be
    /// cut short if the process exits. Only used on shutdown.
    fn send_beacon(
        &self,
        events: Vec<AnalyticsEvent>,
    );
}
