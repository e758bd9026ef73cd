//! Caller-facing facade over the orchestrator.
//!
//! [`TelemetryFeed`] exposes the derived values a dashboard needs (latest
//! amplitude, ordered samples, gauge, trend, heatmap bitmap, hover probe)
//! from the currently published snapshot. The heatmap bitmap is rebuilt
//! only when the published generation or the contrast mode changes;
//! otherwise the previously rendered bitmap is handed back.

use std::sync::Arc;

use resonance_core::coords::{CoordinateMapper, HoverProbe, ReferenceLine};
use resonance_core::gauge::GaugeReading;
use resonance_core::heatmap::{build, ContrastMode};
use resonance_core::raster::Bitmap;
use resonance_core::sample::Sample;
use resonance_core::trend::Trend;
use tokio::sync::Mutex;

use crate::orchestrator::{FeedOrchestrator, RefreshReport};
use crate::snapshot::FeedSnapshot;

/// Most recent render and the inputs it was built from.
struct RenderedHeatmap {
    generation: u64,
    mode: ContrastMode,
    bitmap: Option<Arc<Bitmap>>,
}

pub struct TelemetryFeed {
    orchestrator: FeedOrchestrator,
    /// Held for the duration of a coalesced refresh.
    refresh_gate: Mutex<()>,
    rendered: Mutex<Option<RenderedHeatmap>>,
}

impl TelemetryFeed {
    pub fn new(orchestrator: FeedOrchestrator) -> Self {
        Self {
            orchestrator,
            refresh_gate: Mutex::new(()),
            rendered: Mutex::new(None),
        }
    }

    pub fn orchestrator(&self) -> &FeedOrchestrator {
        &self.orchestrator
    }

    /// Refresh unconditionally. Concurrent calls all run; the newest
    /// generation wins publication.
    pub async fn refresh(&self, force: bool) -> RefreshReport {
        self.orchestrator.refresh(force).await
    }

    /// Refresh unless another coalesced refresh is already running, in
    /// which case `None` is returned immediately.
    pub async fn refresh_if_idle(&self, force: bool) -> Option<RefreshReport> {
        let _gate = self.refresh_gate.try_lock().ok()?;
        Some(self.orchestrator.refresh(force).await)
    }

    pub async fn snapshot(&self) -> Arc<FeedSnapshot> {
        self.orchestrator.snapshot().await
    }

    pub async fn latest_amplitude(&self) -> Option<f64> {
        self.snapshot().await.latest_amplitude()
    }

    pub async fn samples_ascending(&self) -> Vec<Sample> {
        self.snapshot().await.samples.clone()
    }

    pub async fn gauge(&self) -> GaugeReading {
        self.snapshot().await.gauge()
    }

    pub async fn trend(&self) -> Trend {
        self.snapshot().await.trend()
    }

    /// The heatmap rendered in `mode`, or `None` when there is no
    /// renderable grid.
    pub async fn heatmap_bitmap(&self, mode: ContrastMode) -> Option<Arc<Bitmap>> {
        let snapshot = self.snapshot().await;
        let mut rendered = self.rendered.lock().await;

        if let Some(previous) = rendered.as_ref() {
            if previous.generation == snapshot.generation && previous.mode == mode {
                return previous.bitmap.clone();
            }
        }

        let bitmap = snapshot
            .heatmap
            .as_ref()
            .and_then(|grid| build(grid, &snapshot.quality, mode))
            .map(Arc::new);
        if bitmap.is_none() && snapshot.heatmap.is_some() {
            tracing::warn!(generation = snapshot.generation, "Heatmap grid has no finite values");
        }

        *rendered = Some(RenderedHeatmap {
            generation: snapshot.generation,
            mode,
            bitmap: bitmap.clone(),
        });
        bitmap
    }

    /// The grid cell under `(x, y)` on a `width × height` surface.
    pub async fn hover(&self, x: f64, y: f64, width: f64, height: f64) -> Option<HoverProbe> {
        let snapshot = self.snapshot().await;
        let grid = snapshot.heatmap.as_ref()?;
        CoordinateMapper::new(grid, width, height).ok()?.probe(x, y)
    }

    /// Drawable reference lines for `freqs_hz` on a surface of the given
    /// size.
    pub async fn reference_lines(&self, freqs_hz: &[f64], width: f64, height: f64) -> Vec<ReferenceLine> {
        let snapshot = self.snapshot().await;
        let Some(grid) = snapshot.heatmap.as_ref() else {
            return Vec::new();
        };
        match CoordinateMapper::new(grid, width, height) {
            Ok(mapper) => mapper.reference_lines(freqs_hz),
            Err(_) => Vec::new(),
        }
    }
}
