//! Heatmap grid and bitmap synthesis.
//!
//! [`HeatmapGrid`] is the validated N×M magnitude matrix (N time points,
//! M frequency bins). [`build`] turns it into an RGBA [`Bitmap`]:
//!
//! 1. the color range is clipped to the 3rd..97th percentile of all
//!    finite values, so a handful of spikes cannot flatten the scale;
//! 2. each value is normalised into that range and looked up in a
//!    256-entry palette;
//! 3. columns whose timestamp is flagged unusable keep their hue but are
//!    drawn with reduced alpha;
//! 4. bin 0 (lowest frequency) is the bottom row.
//!
//! Rendering is pure: the same inputs always produce the same bytes.

use crate::error::CoreError;
use crate::lenient;
use crate::palette::{Palette, PALETTE_SIZE};
use crate::payload::HeatmapPayload;
use crate::raster::{Bitmap, Raster};
use crate::sample::QualityMap;
use crate::types::Timestamp;

pub use crate::palette::ContrastMode;

/// Lower clipping percentile of the color range.
pub const LOW_PERCENTILE: f64 = 0.03;
/// Upper clipping percentile of the color range.
pub const HIGH_PERCENTILE: f64 = 0.97;
/// Minimum span forced onto a degenerate range.
pub const RANGE_EPSILON: f64 = 1e-6;
/// Alpha of a column with usable data.
pub const USABLE_ALPHA: u8 = 255;
/// Alpha of a column flagged unusable.
pub const UNUSABLE_ALPHA: u8 = 95;

/// Frequency axis of a grid: bin `i` sits at `start_hz + i * step_hz`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyAxis {
    pub start_hz: f64,
    pub step_hz: f64,
    pub bin_count: usize,
}

impl FrequencyAxis {
    pub fn frequency_at(&self, bin: usize) -> f64 {
        self.start_hz + bin as f64 * self.step_hz
    }

    /// Frequency of the last bin.
    pub fn top_hz(&self) -> f64 {
        self.frequency_at(self.bin_count.saturating_sub(1))
    }
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// Validated magnitude matrix. Every row has exactly `bin_count` entries
/// and there is at least one point and one bin.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapGrid {
    timestamps: Vec<Timestamp>,
    /// Row-major, `point_count * bin_count`.
    values: Vec<f64>,
    axis: FrequencyAxis,
}

impl HeatmapGrid {
    /// Build a grid from per-point rows.
    pub fn new(
        timestamps: Vec<Timestamp>,
        rows: Vec<Vec<f64>>,
        start_hz: f64,
        step_hz: f64,
    ) -> Result<Self, CoreError> {
        if timestamps.len() != rows.len() {
            return Err(CoreError::InvalidGrid(format!(
                "{} timestamps for {} rows",
                timestamps.len(),
                rows.len()
            )));
        }
        if rows.is_empty() {
            return Err(CoreError::InvalidGrid("no points".into()));
        }
        let bin_count = rows[0].len();
        if bin_count == 0 {
            return Err(CoreError::InvalidGrid("no frequency bins".into()));
        }
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != bin_count) {
            return Err(CoreError::InvalidGrid(format!(
                "row {i} has {} bins, expected {bin_count}",
                row.len()
            )));
        }
        if !start_hz.is_finite() || !step_hz.is_finite() || step_hz <= 0.0 {
            return Err(CoreError::InvalidGrid(format!(
                "bad frequency axis: start {start_hz}, step {step_hz}"
            )));
        }

        Ok(Self {
            timestamps,
            values: rows.into_iter().flatten().collect(),
            axis: FrequencyAxis {
                start_hz,
                step_hz,
                bin_count,
            },
        })
    }

    /// Normalise a decoded heatmap payload into a grid.
    ///
    /// - points without a readable timestamp are dropped;
    /// - points are ordered ascending by timestamp;
    /// - the bin count is the declared `axis.bins` capped at the longest
    ///   row, or the longest row when none is declared; short rows are
    ///   padded with NaN and long rows truncated;
    /// - a missing axis start reads as 0 Hz and a missing step as 1 Hz.
    pub fn from_payload(payload: &HeatmapPayload) -> Result<Self, CoreError> {
        let mut points: Vec<(Timestamp, &[f64])> = payload
            .points
            .iter()
            .filter_map(|p| {
                let ts = lenient::timestamp(p.ts.as_deref()?)?;
                Some((ts, p.bins.as_slice()))
            })
            .collect();
        points.sort_by_key(|(ts, _)| *ts);

        // The declared count never exceeds the data actually received.
        let longest_row = points.iter().map(|(_, b)| b.len()).max().unwrap_or(0);
        let bin_count = payload
            .axis
            .bins
            .filter(|b| *b > 0)
            .map_or(longest_row, |b| (b as usize).min(longest_row));

        let (timestamps, rows): (Vec<Timestamp>, Vec<Vec<f64>>) = points
            .into_iter()
            .map(|(ts, bins)| {
                let mut row = bins[..bins.len().min(bin_count)].to_vec();
                row.resize(bin_count, f64::NAN);
                (ts, row)
            })
            .unzip();

        Self::new(
            timestamps,
            rows,
            payload.axis.freq_start_hz.unwrap_or(0.0),
            payload.axis.freq_step_hz.unwrap_or(1.0),
        )
    }

    pub fn point_count(&self) -> usize {
        self.timestamps.len()
    }

    pub fn bin_count(&self) -> usize {
        self.axis.bin_count
    }

    pub fn axis(&self) -> &FrequencyAxis {
        &self.axis
    }

    pub fn timestamps(&self) -> &[Timestamp] {
        &self.timestamps
    }

    pub fn timestamp(&self, point: usize) -> Option<Timestamp> {
        self.timestamps.get(point).copied()
    }

    /// The bins of one time point.
    pub fn row(&self, point: usize) -> Option<&[f64]> {
        let m = self.axis.bin_count;
        (point < self.point_count()).then(|| &self.values[point * m..(point + 1) * m])
    }

    pub fn value(&self, point: usize, bin: usize) -> Option<f64> {
        self.row(point)?.get(bin).copied()
    }

    /// All finite values, sorted ascending.
    fn sorted_finite_values(&self) -> Vec<f64> {
        let mut finite: Vec<f64> = self.values.iter().copied().filter(|v| v.is_finite()).collect();
        finite.sort_by(f64::total_cmp);
        finite
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Rank-based percentile of an ascending slice: the element at
/// `round((n - 1) * p)`. `p` is clamped to `0.0..=1.0`.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let rank = (last as f64 * p.clamp(0.0, 1.0)).round() as usize;
    sorted.get(rank.min(last)).copied()
}

/// Robust `(min, max)` color range of a grid, widened so `max > min`.
/// `None` when the grid holds no finite value.
pub fn value_range(grid: &HeatmapGrid) -> Option<(f64, f64)> {
    let sorted = grid.sorted_finite_values();
    let min_value = percentile(&sorted, LOW_PERCENTILE)?;
    let mut max_value = percentile(&sorted, HIGH_PERCENTILE)?;
    if max_value <= min_value {
        // Scale the epsilon for large magnitudes so the sum stays distinct.
        max_value = min_value + RANGE_EPSILON.max(min_value.abs() * f64::EPSILON * 4.0);
    }
    Some((min_value, max_value))
}

/// Palette index of `value` within `[min_value, max_value]`. Non-finite
/// values take index 0.
pub fn palette_index(value: f64, min_value: f64, max_value: f64) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    let t = ((value - min_value) / (max_value - min_value)).clamp(0.0, 1.0);
    (t * (PALETTE_SIZE - 1) as f64).round().clamp(0.0, 255.0) as u8
}

/// Render a grid. Returns `None` when the grid is degenerate or holds no
/// finite value.
pub fn build(grid: &HeatmapGrid, quality: &QualityMap, mode: ContrastMode) -> Option<Bitmap> {
    let (n, m) = (grid.point_count(), grid.bin_count());
    if n == 0 || m == 0 {
        return None;
    }
    let (min_value, max_value) = value_range(grid)?;
    let palette = Palette::for_mode(mode);

    let mut raster = Raster::new(n, m);
    for (x, ts) in grid.timestamps().iter().enumerate() {
        let alpha = if quality.is_usable(ts) {
            USABLE_ALPHA
        } else {
            UNUSABLE_ALPHA
        };
        let row = grid.row(x)?;
        for (bin, value) in row.iter().enumerate() {
            let [r, g, b] = palette.color(palette_index(*value, min_value, max_value));
            let written = raster.set_pixel(x, m - 1 - bin, [r, g, b, alpha]);
            debug_assert!(written, "pixel ({x}, {bin}) outside {n}x{m} raster");
        }
    }

    Some(Bitmap::new(raster, min_value, max_value))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    use super::*;

    fn times(n: usize) -> Vec<Timestamp> {
        let start = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
        (0..n).map(|i| start + Duration::minutes(15 * i as i64)).collect()
    }

    fn grid(rows: Vec<Vec<f64>>) -> HeatmapGrid {
        HeatmapGrid::new(times(rows.len()), rows, 0.0, 1.0).expect("grid")
    }

    #[test]
    fn percentile_endpoints() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&sorted, 0.0), Some(1.0));
        assert_eq!(percentile(&sorted, 1.0), Some(4.0));
        assert_eq!(percentile(&[], 0.5), None);
    }

    #[test]
    fn percentile_is_monotonic() {
        let sorted: Vec<f64> = (0..37).map(|i| (i * i) as f64).collect();
        let mut previous = f64::MIN;
        for step in 0..=100 {
            let value = percentile(&sorted, step as f64 / 100.0).expect("non-empty");
            assert!(value >= previous);
            previous = value;
        }
    }

    #[test]
    fn degenerate_grids_are_rejected() {
        assert_matches!(
            HeatmapGrid::new(vec![], vec![], 0.0, 1.0),
            Err(CoreError::InvalidGrid(_))
        );
        assert_matches!(
            HeatmapGrid::new(times(2), vec![vec![], vec![]], 0.0, 1.0),
            Err(CoreError::InvalidGrid(_))
        );
        assert_matches!(
            HeatmapGrid::new(times(2), vec![vec![1.0], vec![1.0, 2.0]], 0.0, 1.0),
            Err(CoreError::InvalidGrid(_))
        );
        assert_matches!(
            HeatmapGrid::new(times(1), vec![vec![1.0]], 0.0, 0.0),
            Err(CoreError::InvalidGrid(_))
        );
    }

    #[test]
    fn outlier_resistant_range() {
        // Scenario: [[1,1],[1,1],[5,5]].
        let g = grid(vec![vec![1.0, 1.0], vec![1.0, 1.0], vec![5.0, 5.0]]);
        let bitmap = build(&g, &QualityMap::new(), ContrastMode::Standard).expect("bitmap");

        assert!((bitmap.min_value() - 1.0).abs() < 1e-9);
        assert!((bitmap.max_value() - 5.0).abs() < 1e-9);
        assert_eq!(palette_index(1.0, bitmap.min_value(), bitmap.max_value()), 0);
        assert_eq!(palette_index(5.0, bitmap.min_value(), bitmap.max_value()), 255);

        let palette = Palette::for_mode(ContrastMode::Standard);
        let [r, g0, b] = palette.color(0);
        assert_eq!(bitmap.raster().pixel(0, 0), Some([r, g0, b, USABLE_ALPHA]));
        let [r, g1, b] = palette.color(255);
        assert_eq!(bitmap.raster().pixel(2, 1), Some([r, g1, b, USABLE_ALPHA]));
    }

    #[test]
    fn single_spike_does_not_stretch_scale() {
        let mut rows = vec![vec![1.0, 2.0]; 40];
        rows.push(vec![1000.0, 1000.0]);
        let (_, max_value) = value_range(&grid(rows)).expect("range");
        assert_eq!(max_value, 2.0);
    }

    #[test]
    fn constant_grid_is_widened() {
        let g = grid(vec![vec![3.0, 3.0], vec![3.0, 3.0]]);
        let bitmap = build(&g, &QualityMap::new(), ContrastMode::Standard).expect("bitmap");
        assert!(bitmap.max_value() > bitmap.min_value());
        assert!(bitmap.max_value().is_finite());
        assert_eq!(bitmap.raster().as_bytes().len(), 2 * 2 * 4);

        let [r, g0, b] = Palette::for_mode(ContrastMode::Standard).color(0);
        for x in 0..2 {
            for y in 0..2 {
                assert_eq!(bitmap.raster().pixel(x, y), Some([r, g0, b, USABLE_ALPHA]));
            }
        }
    }

    #[test]
    fn all_non_finite_grid_has_no_bitmap() {
        let g = grid(vec![vec![f64::NAN, f64::INFINITY]]);
        assert!(build(&g, &QualityMap::new(), ContrastMode::Standard).is_none());
    }

    #[test]
    fn low_frequency_is_bottom_row() {
        let g = grid(vec![vec![0.0, 10.0, 20.0]]);
        let bitmap = build(&g, &QualityMap::new(), ContrastMode::Standard).expect("bitmap");
        let palette = Palette::for_mode(ContrastMode::Standard);

        let [r, g0, b] = palette.color(0);
        assert_eq!(bitmap.raster().pixel(0, 2), Some([r, g0, b, 255]));
        let [r, g1, b] = palette.color(255);
        assert_eq!(bitmap.raster().pixel(0, 0), Some([r, g1, b, 255]));
    }

    #[test]
    fn unusable_column_is_dimmed_not_recolored() {
        let g = grid(vec![vec![1.0, 4.0], vec![1.0, 4.0]]);
        let mut quality = QualityMap::new();
        quality.insert(g.timestamps()[1], false);

        let bitmap = build(&g, &quality, ContrastMode::Standard).expect("bitmap");
        for y in 0..2 {
            let good = bitmap.raster().pixel(0, y).expect("pixel");
            let bad = bitmap.raster().pixel(1, y).expect("pixel");
            assert_eq!(good[..3], bad[..3]);
            assert!(bad[3] < good[3]);
        }
    }

    #[test]
    fn contrast_modes_share_range_but_not_colors() {
        let g = grid(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        let q = QualityMap::new();
        let standard = build(&g, &q, ContrastMode::Standard).expect("bitmap");
        let high = build(&g, &q, ContrastMode::HighContrast).expect("bitmap");
        assert_eq!(standard.min_value(), high.min_value());
        assert_ne!(standard.raster(), high.raster());
    }

    #[test]
    fn from_payload_normalises_rows() {
        let payload: HeatmapPayload = serde_json::from_value(json!({
            "axis": {"freqStartHz": 2.0, "freqStepHz": "0.5", "bins": 3},
            "points": [
                {"ts": "2024-05-02T00:15:00Z", "bins": [4, 5, 6, 7]},
                {"ts": "not a time", "bins": [9, 9, 9]},
                {"ts": "2024-05-02T00:00:00Z", "bins": [1, 2]}
            ]
        }))
        .expect("payload");

        let g = HeatmapGrid::from_payload(&payload).expect("grid");
        assert_eq!(g.point_count(), 2);
        assert_eq!(g.bin_count(), 3);
        assert_eq!(g.row(0).expect("row")[..2], [1.0, 2.0]);
        assert!(g.value(0, 2).expect("value").is_nan());
        assert_eq!(g.row(1).expect("row"), &[4.0, 5.0, 6.0]);
        assert_eq!(g.axis().frequency_at(2), 3.0);
    }

    #[test]
    fn declared_bin_count_is_capped_by_received_rows() {
        let payload: HeatmapPayload = serde_json::from_value(json!({
            "axis": {"bins": 20_000_000},
            "points": [
                {"ts": "2024-05-02T00:00:00Z", "bins": [1.0, 2.0]},
                {"ts": "2024-05-02T00:15:00Z", "bins": [3.0]}
            ]
        }))
        .expect("payload");

        let g = HeatmapGrid::from_payload(&payload).expect("grid");
        assert_eq!(g.bin_count(), 2);
        assert_eq!(g.row(0).expect("row"), &[1.0, 2.0]);
        assert!(g.value(1, 1).expect("value").is_nan());
    }

    #[test]
    fn from_payload_without_points_is_invalid() {
        let payload: HeatmapPayload =
            serde_json::from_value(json!({"axis": {"bins": 4}, "points": []})).expect("payload");
        assert_matches!(
            HeatmapGrid::from_payload(&payload),
            Err(CoreError::InvalidGrid(_))
        );
    }
}
