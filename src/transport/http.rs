use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header;
use reqwest::Client;
use reqwest::Url;
use tokio::runtime::Handle;
use tracing::debug;
use tracing::error;

use super::Transport;
use crate::AnalyticsEvent;
use crate::DeliveryError;
use crate::EndpointConfig;
use crate::EventBatch;
use crate::Result;

/// JSON-over-HTTP transport backed by `reqwest`
#[derive(Clone)]
pub struct HttpTransport {
    inner: Arc<HttpTransportInner>,
}

struct HttpTransportInner {
    client: Client,
    url: Url,
    api_key: Option<String>,
    runtime: Handle,
}

impl HttpTransport {
    /// Builds the HTTP client from endpoint settings.
    ///
    /// Beacons are spawned on `runtime`.
    pub fn new(
        config: &EndpointConfig,
        runtime: Handle,
    ) -> Result<Self> {
        let url = Url::parse(&config.url).map_err(|e| DeliveryError::InvalidEndpoint(format!("{}: {}", config.url, e)))?;

        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()
            .map_err(DeliveryError::ClientBuild)?;

        Ok(Self {
            inner: Arc::new(HttpTransportInner {
                client,
                url,
                api_key: config.api_key.clone(),
                runtime,
            }),
        })
    }

    pub fn url(&self) -> &Url {
        &self.inner.url
    }
}

impl HttpTransportInner {
    async fn post(
        &self,
        events: &[AnalyticsEvent],
    ) -> Result<()> {
        let mut request = self
            .client
            .post(self.url.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .json(&EventBatch { events });

        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(DeliveryError::Request)?;
        let status = response.status();
        if status.is_success() {
            debug!("delivered batch of {} events, status={}", events.len(), status);
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(DeliveryError::Status {
            status: status.as_u16(),
            body,
        }
        .into())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send_batch(
        &self,
        events: &[AnalyticsEvent],
    ) -> Result<()> {
        self.inner.post(events).await
    }

    fn send_beacon(
        &self,
        events: Vec<AnalyticsEvent>,
    ) {
        let inner = self.inner.clone();
        // Detached: the handle is dropped and nobody awaits the outcome
        self.inner.runtime.spawn(async move {
            if let Err(e) = inner.post(&events).await {
                error!("beacon delivery of {} events failed: {:?}", events.len(), e);
            }
        });
    }
}
