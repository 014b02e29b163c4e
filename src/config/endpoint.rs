use std::fmt::Debug;
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::DEFAULT_CONNECT_TIMEOUT_MS;
use crate::constants::DEFAULT_ENDPOINT_URL;
use crate::constants::DEFAULT_REQUEST_TIMEOUT_MS;
use crate::Error;
use crate::Result;

/// Ingestion endpoint and HTTP client parameters
#[derive(Serialize, Deserialize, Clone)]
pub struct EndpointConfig {
    /// Batch collection URL, receives `POST { "events": [...] }`
    #[serde(default = "default_url")]
    pub url: String,

    /// Credential sent as `Authorization: Bearer <api_key>`
    #[serde(default)]
    pub api_key: Option<String>,

    /// Maximum time to wait for establishing a TCP connection
    /// Default: 1 second
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Maximum time to wait for a complete response
    /// Default: 3 seconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Debug for EndpointConfig {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            api_key: None,
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl EndpointConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.url)
            .map_err(|e| Error::InvalidConfig(format!("endpoint.url {:?} is invalid: {}", self.url, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidConfig(format!(
                "endpoint.url must use http or https, got {}",
                url.scheme()
            )));
        }

        if self.connect_timeout_ms == 0 || self.request_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "endpoint timeouts must be at least 1ms".into(),
            ));
        }

        if let Some(key) = &self.api_key {
            if key.trim().is_empty() {
                return Err(Error::InvalidConfig("endpoint.api_key must not be blank".into()));
            }
        }

        Ok(())
    }
}

fn default_url() -> String {
    DEFAULT_ENDPOINT_URL.to_string()
}
fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}
fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}
