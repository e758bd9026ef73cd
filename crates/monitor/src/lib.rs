//! Terminal monitor for the resonance telemetry feeds.
//!
//! The binary wires a [`resonance_feed::TelemetryFeed`] to a
//! [`resonance_feed::poller::RefreshPoller`] and hands every refresh
//! report to [`report::watch`], which logs a one-line summary and
//! optionally exports the heatmap as a PNG.

pub mod config;
pub mod export;
pub mod report;
