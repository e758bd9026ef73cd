//! Per-refresh summaries and the loop that consumes refresh reports.

use std::path::PathBuf;
use std::sync::Arc;

use resonance_core::gauge::GaugeLevel;
use resonance_core::heatmap::ContrastMode;
use resonance_core::trend::Trend;
use resonance_core::types::Timestamp;
use resonance_feed::{RefreshReport, RefreshStatus, TelemetryFeed};
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;

use crate::export::export_png;

/// Dashboard values after one refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshSummary {
    pub generation: u64,
    pub status: RefreshStatus,
    pub published: bool,
    pub latest_amplitude: Option<f64>,
    pub gauge_level: GaugeLevel,
    pub gauge_index: f64,
    pub trend: Trend,
    pub sample_count: usize,
    /// Time points in the heatmap, 0 when there is none.
    pub heatmap_points: usize,
    pub failed: Vec<&'static str>,
    pub stale: Vec<&'static str>,
    pub published_at: Option<Timestamp>,
}

impl RefreshSummary {
    /// Combine a report with the snapshot the feed currently publishes.
    pub async fn collect(feed: &TelemetryFeed, report: &RefreshReport) -> Self {
        let snapshot = feed.snapshot().await;
        let gauge = snapshot.gauge();
        Self {
            generation: report.generation,
            status: report.status,
            published: report.published,
            latest_amplitude: snapshot.latest_amplitude(),
            gauge_level: gauge.level,
            gauge_index: gauge.index,
            trend: snapshot.trend(),
            sample_count: snapshot.samples.len(),
            heatmap_points: snapshot.heatmap.as_ref().map_or(0, |g| g.point_count()),
            failed: report.failed_names(),
            stale: report.stale_endpoints.iter().map(|e| e.name()).collect(),
            published_at: snapshot.published_at,
        }
    }

    pub fn log(&self) {
        match self.status {
            RefreshStatus::Failed => tracing::error!(
                generation = self.generation,
                "No telemetry available, keeping previous display",
            ),
            _ => tracing::info!(
                generation = self.generation,
                level = %self.gauge_level,
                index = self.gauge_index,
                amplitude = ?self.latest_amplitude,
                trend = ?self.trend,
                samples = self.sample_count,
                heatmap_points = self.heatmap_points,
                failed = ?self.failed,
                stale = ?self.stale,
                "Telemetry updated",
            ),
        }
    }
}

/// Where and how to write the heatmap after each published refresh.
#[derive(Debug, Clone)]
pub struct ExportTarget {
    pub path: PathBuf,
    pub contrast: ContrastMode,
}

/// Log a summary for every refresh report and export the heatmap when
/// a new snapshot was published. Returns on cancellation or when the
/// report channel closes.
pub async fn watch(
    feed: Arc<TelemetryFeed>,
    mut reports: broadcast::Receiver<RefreshReport>,
    export: Option<ExportTarget>,
    cancel: CancellationToken,
) {
    loop {
        let report = tokio::select! {
            _ = cancel.cancelled() => break,
            received = reports.recv() => match received {
                Ok(report) => report,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Report watcher lagged behind the poller");
                    continue;
                }
                Err(RecvError::Closed) => break,
            },
        };

        RefreshSummary::collect(&feed, &report).await.log();

        if let (Some(target), true) = (export.as_ref(), report.published) {
            export_heatmap(&feed, target).await;
        }
    }
    tracing::debug!("Report watcher stopped");
}

async fn export_heatmap(feed: &TelemetryFeed, target: &ExportTarget) {
    let Some(bitmap) = feed.heatmap_bitmap(target.contrast).await else {
        tracing::debug!("No heatmap to export");
        return;
    };
    match export_png(&bitmap, &target.path).await {
        Ok(bytes) => tracing::info!(
            path = %target.path.display(),
            bytes,
            width = bitmap.width(),
            height = bitmap.height(),
            "Heatmap exported",
        ),
        Err(e) => tracing::error!(path = %target.path.display(), error = %e, "Heatmap export failed"),
    }
}
