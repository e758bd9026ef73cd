//! End-to-end tests for the decode → grid → bitmap → probe path.
//!
//! Feeds raw JSON payloads through the public API the way the feed crate
//! does and checks the rendered output and hover mapping.

use resonance_core::coords::CoordinateMapper;
use resonance_core::gauge::{classify, GaugeLevel};
use resonance_core::heatmap::{build, ContrastMode, HeatmapGrid, UNUSABLE_ALPHA, USABLE_ALPHA};
use resonance_core::payload::{HeatmapPayload, LatestPayload, SeriesPayload};
use resonance_core::sample::{samples_ascending, QualityMap};
use serde_json::json;

fn heatmap_payload() -> HeatmapPayload {
    serde_json::from_value(json!({
        "ok": true,
        "axis": {"freqStartHz": "4", "freqStepHz": 1, "bins": 4},
        "count": 3,
        "points": [
            {"ts": "2024-05-02T00:00:00Z", "bins": [0.1, 0.2, 0.3, 0.4]},
            {"ts": "2024-05-02T00:15:00Z", "bins": ["0.1", "0.2", "0.3", "0.4"]},
            {"ts": "2024-05-02T00:30:00Z", "bins": [0.5, 0.6, 0.7, 0.8]}
        ]
    }))
    .expect("heatmap payload")
}

fn series_payload() -> SeriesPayload {
    serde_json::from_value(json!({
        "ok": true,
        "count": 3,
        "rows": [
            {"ts": "2024-05-02T00:30:00Z", "amplitude": {"total": 0.05}},
            {"ts": "2024-05-02T00:15:00Z", "amplitude": {"total": "0.04"},
             "quality": {"usable": false, "qualityScore": 0.2}},
            {"ts": "2024-05-02T00:00:00Z", "amplitude": {"total": 0.03}}
        ]
    }))
    .expect("series payload")
}

// ---------------------------------------------------------------------------
// Test: rendering is a pure function of its inputs
// ---------------------------------------------------------------------------

#[test]
fn identical_inputs_render_identical_bytes() {
    let grid = HeatmapGrid::from_payload(&heatmap_payload()).expect("grid");
    let quality = QualityMap::from_samples(&samples_ascending(&series_payload().rows));

    let first = build(&grid, &quality, ContrastMode::HighContrast).expect("bitmap");
    let second = build(&grid, &quality, ContrastMode::HighContrast).expect("bitmap");

    assert_eq!(first.raster().as_bytes(), second.raster().as_bytes());
    assert_eq!(first.min_value(), second.min_value());
    assert_eq!(first.max_value(), second.max_value());
}

// ---------------------------------------------------------------------------
// Test: series quality flags dim the matching heatmap column
// ---------------------------------------------------------------------------

#[test]
fn unusable_series_row_dims_heatmap_column() {
    let grid = HeatmapGrid::from_payload(&heatmap_payload()).expect("grid");
    let samples = samples_ascending(&series_payload().rows);
    let quality = QualityMap::from_samples(&samples);

    let bitmap = build(&grid, &quality, ContrastMode::Standard).expect("bitmap");
    assert_eq!((bitmap.width(), bitmap.height()), (3, 4));

    for y in 0..4 {
        let usable = bitmap.raster().pixel(0, y).expect("pixel");
        let dimmed = bitmap.raster().pixel(1, y).expect("pixel");
        // Columns 0 and 1 carry the same magnitudes.
        assert_eq!(usable[..3], dimmed[..3]);
        assert_eq!(usable[3], USABLE_ALPHA);
        assert_eq!(dimmed[3], UNUSABLE_ALPHA);
    }
}

// ---------------------------------------------------------------------------
// Test: hover resolves through the same grid
// ---------------------------------------------------------------------------

#[test]
fn hover_reports_cell_under_pointer() {
    let grid = HeatmapGrid::from_payload(&heatmap_payload()).expect("grid");
    let mapper = CoordinateMapper::new(&grid, 300.0, 120.0).expect("mapper");

    let probe = mapper.probe(300.0, 0.0).expect("probe");
    assert_eq!(probe.freq_hz, 7.0);
    assert_eq!(probe.intensity, Some(0.8));
    assert_eq!(probe.timestamp, grid.timestamps()[2]);
}

// ---------------------------------------------------------------------------
// Test: gauge reads the latest payload amplitude
// ---------------------------------------------------------------------------

#[test]
fn gauge_classifies_latest_payload_amplitude() {
    let latest: LatestPayload = serde_json::from_value(json!({
        "ok": true,
        "amplitude": {"total": "0.05"}
    }))
    .expect("latest payload");

    let reading = classify(latest.amplitude.total);
    assert_eq!(reading.level, GaugeLevel::Stable);
    assert!((reading.index - 50.0).abs() < 1e-9);
}
