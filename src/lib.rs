//! Client-side interaction telemetry for the storefront.
//!
//! Interaction events (views, clicks, cart adds, purchases, dwell time) are
//! buffered in a bounded queue and shipped to the ingestion endpoint in
//! batches: immediately once a batch is full, otherwise after an idle
//! interval. Failed batches are re-queued under a cap. On shutdown the
//! queue gets a last-gasp beacon plus a regular flush.
//!
//! Entry point is [`TelemetryClient`].

mod client;
mod config;
mod constants;
mod dwell;
mod errors;
mod event;
mod metrics;
mod queue;
mod scheduler;
mod session;
mod transport;
mod utils;

pub use client::*;
pub use config::*;
pub use dwell::*;
pub use errors::*;
pub use event::*;
pub use metrics::*;
pub use queue::*;
pub use scheduler::*;
pub use session::*;
pub use transport::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
