//! Fetch-and-cache layer for the resonance telemetry feeds.
//!
//! [`orchestrator::FeedOrchestrator`] refreshes the three feeds
//! concurrently through a [`transport::FeedTransport`], serving fresh
//! cache entries where it can and falling back to stale ones when the
//! network fails. [`feed::TelemetryFeed`] wraps it with the derived
//! values a dashboard renders, and [`poller::RefreshPoller`] drives it on
//! a fixed interval.

pub mod cache;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod feed;
pub mod orchestrator;
pub mod poller;
pub mod retry;
pub mod snapshot;
pub mod transport;

pub use endpoint::Endpoint;
pub use feed::TelemetryFeed;
pub use orchestrator::{FeedOrchestrator, RefreshReport, RefreshStatus};
