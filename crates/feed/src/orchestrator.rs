//! Concurrent fetch-or-serve-cached refresh across the three feeds.
//!
//! For each endpoint, independently:
//!
//! 1. unless forced, a fresh cache entry is served with no network call;
//! 2. otherwise the feed is fetched (first attempt plus bounded retries,
//!    each attempt under its own timeout) and written through to the
//!    cache under the endpoint's TTL;
//! 3. when every attempt fails, the stale cache entry is served;
//! 4. only when there is no cache entry at all does the endpoint fail.
//!
//! The three endpoint operations run concurrently and are always joined
//! in full: a failing endpoint never cancels its siblings. The refresh is
//! a hard failure only when no endpoint produced any data.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use resonance_core::payload::{FeedPayload, HeatmapPayload, LatestPayload, SeriesPayload};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::FeedCache;
use crate::endpoint::Endpoint;
use crate::error::{FeedError, TransportError};
use crate::retry::{next_delay, RetryPolicy};
use crate::snapshot::{FeedSnapshot, SnapshotCell};
use crate::transport::FeedTransport;

/// Aggregate outcome of one refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshStatus {
    /// Every endpoint produced data.
    Ok,
    /// Some endpoints produced data; the rest are listed as failed.
    Partial,
    /// No endpoint produced any data, fresh or stale.
    Failed,
}

/// What one call to [`FeedOrchestrator::refresh`] did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshReport {
    /// Ticket this refresh ran under.
    pub generation: u64,
    pub status: RefreshStatus,
    /// Endpoints with neither fresh nor stale data.
    pub failed_endpoints: BTreeSet<Endpoint>,
    /// Endpoints served from an expired cache entry after fetch failure.
    pub stale_endpoints: BTreeSet<Endpoint>,
    /// Endpoints served from a still-fresh cache entry.
    pub cached_endpoints: BTreeSet<Endpoint>,
    /// Whether the result became the published snapshot.
    pub published: bool,
}

impl RefreshReport {
    fn new(generation: u64) -> Self {
        Self {
            generation,
            status: RefreshStatus::Ok,
            failed_endpoints: BTreeSet::new(),
            stale_endpoints: BTreeSet::new(),
            cached_endpoints: BTreeSet::new(),
            published: false,
        }
    }

    /// Note one endpoint's resolution and hand back its value, if any.
    fn record<T>(&mut self, endpoint: Endpoint, resolution: Result<Resolved<T>, FeedError>) -> Option<T> {
        match resolution {
            Ok(resolved) => {
                match resolved.source {
                    Source::Cache => {
                        self.cached_endpoints.insert(endpoint);
                    }
                    Source::Stale => {
                        self.stale_endpoints.insert(endpoint);
                    }
                    Source::Network => {}
                }
                Some(resolved.value)
            }
            Err(e) => {
                tracing::warn!(endpoint = %endpoint, error = %e, "Endpoint has no data");
                self.failed_endpoints.insert(endpoint);
                None
            }
        }
    }

    fn settle_status(&mut self) {
        self.status = match self.failed_endpoints.len() {
            0 => RefreshStatus::Ok,
            n if n == Endpoint::ALL.len() => RefreshStatus::Failed,
            _ => RefreshStatus::Partial,
        };
    }

    /// Names of the failed endpoints, for display.
    pub fn failed_names(&self) -> Vec<&'static str> {
        self.failed_endpoints.iter().map(|e| e.name()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Cache,
    Network,
    Stale,
}

struct Resolved<T> {
    value: T,
    source: Source,
}

/// Refreshes the feeds and publishes the result.
pub struct FeedOrchestrator {
    cache: Arc<FeedCache>,
    transport: Arc<dyn FeedTransport>,
    policy: RetryPolicy,
    /// Last ticket handed out; tickets start at 1.
    tickets: AtomicU64,
    snapshot: SnapshotCell,
}

impl FeedOrchestrator {
    /// The cache is injected so one instance can be shared process-wide.
    pub fn new(cache: Arc<FeedCache>, transport: Arc<dyn FeedTransport>, policy: RetryPolicy) -> Self {
        Self {
            cache,
            transport,
            policy,
            tickets: AtomicU64::new(0),
            snapshot: SnapshotCell::new(),
        }
    }

    pub fn cache(&self) -> &Arc<FeedCache> {
        &self.cache
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// The most recently published snapshot.
    pub async fn snapshot(&self) -> Arc<FeedSnapshot> {
        self.snapshot.current().await
    }

    /// Refresh all three feeds. `force` bypasses fresh cache entries.
    pub async fn refresh(&self, force: bool) -> RefreshReport {
        let generation = self.tickets.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(generation, force, "Refresh started");

        let (latest, series, heatmap) = tokio::join!(
            self.resolve::<LatestPayload>(Endpoint::Latest, force),
            self.resolve::<SeriesPayload>(Endpoint::Series, force),
            self.resolve::<HeatmapPayload>(Endpoint::Heatmap, force),
        );

        let mut report = RefreshReport::new(generation);
        let latest = report.record(Endpoint::Latest, latest);
        let series = report.record(Endpoint::Series, series);
        let heatmap = report.record(Endpoint::Heatmap, heatmap);
        report.settle_status();

        match report.status {
            RefreshStatus::Failed => {
                tracing::error!(generation, "All feeds unavailable, no fresh or cached data");
            }
            status => {
                let snapshot = FeedSnapshot::from_payloads(generation, latest, series, heatmap);
                report.published = self.snapshot.publish(snapshot).await;
                if status == RefreshStatus::Partial {
                    tracing::warn!(
                        generation,
                        failed = ?report.failed_names(),
                        "Refresh partially failed, rendering available feeds",
                    );
                } else {
                    tracing::info!(
                        generation,
                        stale = report.stale_endpoints.len(),
                        cached = report.cached_endpoints.len(),
                        "Feeds refreshed",
                    );
                }
            }
        }

        report
    }

    /// Fresh cache, else network, else stale cache.
    async fn resolve<T>(&self, endpoint: Endpoint, force: bool) -> Result<Resolved<T>, FeedError>
    where
        T: FeedPayload + DeserializeOwned + Serialize,
    {
        if !force {
            if let Some(value) = self.cache.read_valid::<T>(endpoint).await {
                tracing::debug!(endpoint = %endpoint, "Serving fresh cache entry");
                return Ok(Resolved {
                    value,
                    source: Source::Cache,
                });
            }
        }

        let error = match self.fetch_with_retry::<T>(endpoint).await {
            Ok(value) => {
                self.cache.write(endpoint, &value, endpoint.ttl()).await;
                return Ok(Resolved {
                    value,
                    source: Source::Network,
                });
            }
            Err(e) => e,
        };

        match self.cache.read_any::<T>(endpoint).await {
            Some(value) => {
                tracing::warn!(endpoint = %endpoint, error = %error, "Serving stale cache entry");
                Ok(Resolved {
                    value,
                    source: Source::Stale,
                })
            }
            None => Err(error),
        }
    }

    /// Fetch and decode, retrying network failures within the policy
    /// budget. A body that does not decode is not retried.
    async fn fetch_with_retry<T>(&self, endpoint: Endpoint) -> Result<T, FeedError>
    where
        T: FeedPayload + DeserializeOwned,
    {
        let total = self.policy.total_attempts();
        let mut delay = self.policy.initial_delay;
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let error = match self.attempt(endpoint).await {
                Ok(body) => {
                    let payload: T =
                        serde_json::from_str(&body).map_err(|e| FeedError::Decode {
                            endpoint,
                            message: e.to_string(),
                        })?;
                    if payload.is_ok() {
                        return Ok(payload);
                    }
                    TransportError::NotOk
                }
                Err(e) => e,
            };

            if attempt >= total {
                return Err(FeedError::Network {
                    endpoint,
                    attempts: attempt,
                    source: error,
                });
            }

            tracing::warn!(
                endpoint = %endpoint,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Fetch attempt failed, retrying",
            );
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            delay = next_delay(delay, &self.policy);
        }
    }

    /// One network attempt under the per-attempt timeout.
    async fn attempt(&self, endpoint: Endpoint) -> Result<String, TransportError> {
        let timeout = self.policy.attempt_timeout;
        match tokio::time::timeout(timeout, self.transport.fetch(endpoint)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(timeout)),
        }
    }
}
