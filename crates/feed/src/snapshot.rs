//! The externally visible result of the most recent refresh.
//!
//! Overlapping refreshes may finish out of order. Each refresh carries a
//! generation ticket taken when it started, and [`SnapshotCell::publish`]
//! only accepts a snapshot newer than the one it holds, so a slow earlier
//! refresh can never overwrite a later one.

use std::sync::Arc;

use chrono::Utc;
use resonance_core::gauge::{classify, GaugeReading};
use resonance_core::heatmap::HeatmapGrid;
use resonance_core::payload::{HeatmapPayload, LatestPayload, SeriesPayload};
use resonance_core::sample::{samples_ascending, QualityMap, Sample};
use resonance_core::trend::{trend, Trend};
use resonance_core::types::Timestamp;
use tokio::sync::RwLock;

/// Decoded, derived view of all three feeds at one generation.
#[derive(Debug, Clone, Default)]
pub struct FeedSnapshot {
    /// Ticket of the refresh that produced this snapshot; 0 before the
    /// first publish.
    pub generation: u64,
    pub latest: Option<LatestPayload>,
    /// Ascending by timestamp.
    pub samples: Vec<Sample>,
    pub quality: QualityMap,
    pub heatmap: Option<HeatmapGrid>,
    pub published_at: Option<Timestamp>,
}

impl FeedSnapshot {
    /// Derive a snapshot from whichever payloads the refresh produced.
    pub fn from_payloads(
        generation: u64,
        latest: Option<LatestPayload>,
        series: Option<SeriesPayload>,
        heatmap: Option<HeatmapPayload>,
    ) -> Self {
        let samples = series
            .map(|s| samples_ascending(&s.rows))
            .unwrap_or_default();
        let quality = QualityMap::from_samples(&samples);
        let heatmap = heatmap.and_then(|payload| match HeatmapGrid::from_payload(&payload) {
            Ok(grid) => Some(grid),
            Err(e) => {
                tracing::warn!(error = %e, "Heatmap payload has no renderable grid");
                None
            }
        });

        Self {
            generation,
            latest,
            samples,
            quality,
            heatmap,
            published_at: Some(Utc::now()),
        }
    }

    /// Total amplitude of the latest snapshot.
    pub fn latest_amplitude(&self) -> Option<f64> {
        self.latest.as_ref().and_then(|l| l.amplitude.total)
    }

    pub fn gauge(&self) -> GaugeReading {
        classify(self.latest_amplitude())
    }

    pub fn trend(&self) -> Trend {
        trend(&self.samples)
    }
}

/// Holder of the currently published snapshot.
#[derive(Debug, Default)]
pub struct SnapshotCell {
    current: RwLock<Arc<FeedSnapshot>>,
}

impl SnapshotCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn current(&self) -> Arc<FeedSnapshot> {
        Arc::clone(&*self.current.read().await)
    }

    /// Replace the current snapshot if `snapshot` is newer. Returns
    /// whether it was accepted.
    pub async fn publish(&self, snapshot: FeedSnapshot) -> bool {
        let mut current = self.current.write().await;
        if snapshot.generation <= current.generation {
            tracing::debug!(
                stale_generation = snapshot.generation,
                current_generation = current.generation,
                "Discarding out-of-order refresh result",
            );
            return false;
        }
        *current = Arc::new(snapshot);
        true
    }
}
