//! Periodic background refresh.
//!
//! [`RefreshPoller::run`] refreshes on a fixed interval until its
//! [`CancellationToken`] is cancelled. Each tick awaits its refresh
//! before the next one can fire and missed ticks are skipped, so
//! refreshes from the poller never overlap. Reports are broadcast to any
//! number of subscribers.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::feed::TelemetryFeed;
use crate::orchestrator::RefreshReport;

/// Broadcast channel capacity for refresh reports.
const REPORT_CHANNEL_CAPACITY: usize = 16;

/// Shortest accepted polling interval.
const MIN_INTERVAL: Duration = Duration::from_secs(1);

pub struct RefreshPoller {
    feed: Arc<TelemetryFeed>,
    interval: Duration,
    reports: broadcast::Sender<RefreshReport>,
}

impl RefreshPoller {
    /// Intervals below one second are raised to one second.
    pub fn new(feed: Arc<TelemetryFeed>, interval: Duration) -> Self {
        let (reports, _) = broadcast::channel(REPORT_CHANNEL_CAPACITY);
        Self {
            feed,
            interval: interval.max(MIN_INTERVAL),
            reports,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Subscribe to the report of every refresh the poller runs.
    pub fn subscribe(&self) -> broadcast::Receiver<RefreshReport> {
        self.reports.subscribe()
    }

    /// Run the refresh loop. The first refresh happens immediately.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::info!(interval_secs = self.interval.as_secs(), "Refresh poller started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Refresh poller cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    match self.feed.refresh_if_idle(false).await {
                        Some(report) => {
                            // Ignore the SendError, it only means there are zero receivers.
                            let _ = self.reports.send(report);
                        }
                        None => {
                            tracing::debug!("Refresh already in flight, skipping tick");
                        }
                    }
                }
            }
        }
    }
}
