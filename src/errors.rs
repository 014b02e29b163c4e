//! Telemetry Pipeline Error Hierarchy
//!
//! Errors are only surfaced at construction time (configuration, client
//! building) and by the agent binary. The tracking API itself is
//! fire-and-forget: delivery and session-store failures are recovered
//! locally and never reach the caller.

use std::path::PathBuf;

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Infrastructure-level failures (network, session storage, local I/O)
    #[error(transparent)]
    System(#[from] SystemError),

    /// Configuration loading failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Configuration values rejected by validation
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Client built outside of a tokio runtime without an explicit handle
    #[error("No tokio runtime available: {0}")]
    Runtime(#[from] tokio::runtime::TryCurrentError),

    #[error("Failed to send shutdown signal: {0}")]
    SignalSenderClosed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    /// Ingestion endpoint communication
    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// Session identity store
    #[error("Session store error: {0}")]
    SessionStore(#[from] SessionStoreError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// Connection refused, DNS failure, timeout...
    #[error("Request to ingestion endpoint failed: {0}")]
    Request(#[source] reqwest::Error),

    /// Endpoint answered with a non-2xx status
    #[error("Ingestion endpoint rejected batch with status {status}: {body}")]
    Status { status: u16, body: String },

    /// HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Invalid ingestion endpoint: {0}")]
    InvalidEndpoint(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("Session store I/O failed at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Session store unavailable: {0}")]
    Unavailable(String),
}

// ============== Conversion Implementations ============== //
impl From<DeliveryError> for Error {
    fn from(e: DeliveryError) -> Self {
        Error::System(SystemError::Delivery(e))
    }
}

impl From<SessionStoreError> for Error {
    fn from(e: SessionStoreError) -> Self {
        Error::System(SystemError::SessionStore(e))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::System(SystemError::Io(e))
    }
}
