//! Pixel ↔ (time, frequency) mapping over a rendered heatmap.
//!
//! The display surface may be any size; it need not match the grid's
//! native N×M. The y axis grows downwards and the lowest frequency bin
//! sits at the bottom edge, matching [`crate::heatmap::build`].

use serde::Serialize;

use crate::error::CoreError;
use crate::heatmap::HeatmapGrid;
use crate::types::Timestamp;

/// Fundamental and first four harmonics of the reference resonance, Hz.
pub const HARMONIC_REFERENCE_HZ: &[f64] = &[7.83, 14.3, 20.8, 27.3, 33.8];

/// Finest tick spacing accepted, as a fraction of the bin step.
pub const MIN_TICK_STEP_FRACTION: f64 = 0.01;

/// What lies under the pointer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoverProbe {
    pub timestamp: Timestamp,
    pub freq_hz: f64,
    /// Grid magnitude, `None` where the cell holds no finite value.
    pub intensity: Option<f64>,
    pub point: usize,
    pub bin: usize,
}

/// A horizontal line at a known frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReferenceLine {
    pub freq_hz: f64,
    pub y: f64,
}

/// Maps between surface pixels and grid coordinates.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateMapper<'a> {
    grid: &'a HeatmapGrid,
    width: f64,
    height: f64,
}

impl<'a> CoordinateMapper<'a> {
    pub fn new(grid: &'a HeatmapGrid, width: f64, height: f64) -> Result<Self, CoreError> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(width) || !valid(height) {
            return Err(CoreError::InvalidSurface { width, height });
        }
        Ok(Self {
            grid,
            width,
            height,
        })
    }

    /// Nearest time-point index under pixel column `x`.
    pub fn point_at(&self, x: f64) -> usize {
        let last = self.grid.point_count().saturating_sub(1);
        nearest_index((x / self.width) * last as f64, last)
    }

    /// Nearest bin index under pixel row `y`.
    pub fn bin_at(&self, y: f64) -> usize {
        let last = self.grid.bin_count().saturating_sub(1);
        nearest_index((1.0 - y / self.height) * last as f64, last)
    }

    /// Resolve the pointer position to a grid cell.
    pub fn probe(&self, x: f64, y: f64) -> Option<HoverProbe> {
        let point = self.point_at(x);
        let bin = self.bin_at(y);
        Some(HoverProbe {
            timestamp: self.grid.timestamp(point)?,
            freq_hz: self.grid.axis().frequency_at(bin),
            intensity: self.grid.value(point, bin).filter(|v| v.is_finite()),
            point,
            bin,
        })
    }

    /// Pixel row of `freq_hz`, or `None` when it falls outside the
    /// surface (or the grid has a single bin and no vertical scale).
    pub fn y_for_frequency(&self, freq_hz: f64) -> Option<f64> {
        let axis = self.grid.axis();
        let span = axis.bin_count.checked_sub(1).filter(|s| *s > 0)? as f64;
        let bin_position = (freq_hz - axis.start_hz) / axis.step_hz;
        let y = self.height - (bin_position / span) * self.height;
        (0.0..=self.height).contains(&y).then_some(y)
    }

    /// Pixel column of a time point. A single-point grid sits at x = 0.
    pub fn x_for_point(&self, point: usize) -> Option<f64> {
        let count = self.grid.point_count();
        if point >= count {
            return None;
        }
        if count == 1 {
            return Some(0.0);
        }
        Some(point as f64 / (count - 1) as f64 * self.width)
    }

    /// Reference lines for the given frequencies, dropping the ones that
    /// cannot be drawn.
    pub fn reference_lines(&self, freqs_hz: &[f64]) -> Vec<ReferenceLine> {
        freqs_hz
            .iter()
            .filter_map(|&freq_hz| {
                self.y_for_frequency(freq_hz)
                    .map(|y| ReferenceLine { freq_hz, y })
            })
            .collect()
    }

    /// Axis tick marks at every multiple of `step_hz` within the grid's
    /// frequency range. Steps finer than [`MIN_TICK_STEP_FRACTION`] of
    /// the bin step yield no ticks.
    pub fn frequency_ticks(&self, step_hz: f64) -> Vec<ReferenceLine> {
        let axis = self.grid.axis();
        if !step_hz.is_finite() || step_hz < axis.step_hz * MIN_TICK_STEP_FRACTION {
            return Vec::new();
        }
        let first = (axis.start_hz / step_hz).ceil() as i64;
        let last = (axis.top_hz() / step_hz).floor() as i64;
        let freqs: Vec<f64> = (first..=last).map(|k| k as f64 * step_hz).collect();
        self.reference_lines(&freqs)
    }
}

fn nearest_index(position: f64, last: usize) -> usize {
    // NaN casts to 0.
    position.round().clamp(0.0, last as f64) as usize
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    /// 5 points × 11 bins, axis 3..=8 Hz in 0.5 Hz steps; value = point*100 + bin.
    fn grid() -> HeatmapGrid {
        let start = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
        let timestamps = (0..5).map(|i| start + Duration::minutes(15 * i)).collect();
        let rows = (0..5)
            .map(|p| (0..11).map(|b| (p * 100 + b) as f64).collect())
            .collect();
        HeatmapGrid::new(timestamps, rows, 3.0, 0.5).expect("grid")
    }

    #[test]
    fn surface_must_have_area() {
        let g = grid();
        assert_matches!(
            CoordinateMapper::new(&g, 0.0, 100.0),
            Err(CoreError::InvalidSurface { .. })
        );
        assert_matches!(
            CoordinateMapper::new(&g, 100.0, f64::NAN),
            Err(CoreError::InvalidSurface { .. })
        );
    }

    #[test]
    fn corners_map_to_grid_extremes() {
        let g = grid();
        let mapper = CoordinateMapper::new(&g, 400.0, 200.0).expect("mapper");

        let top_left = mapper.probe(0.0, 0.0).expect("probe");
        assert_eq!((top_left.point, top_left.bin), (0, 10));
        assert_eq!(top_left.freq_hz, 8.0);

        let bottom_right = mapper.probe(400.0, 200.0).expect("probe");
        assert_eq!((bottom_right.point, bottom_right.bin), (4, 0));
        assert_eq!(bottom_right.freq_hz, 3.0);
        assert_eq!(bottom_right.intensity, Some(400.0));
    }

    #[test]
    fn pointer_outside_surface_is_clamped() {
        let g = grid();
        let mapper = CoordinateMapper::new(&g, 400.0, 200.0).expect("mapper");
        assert_eq!(mapper.point_at(-50.0), 0);
        assert_eq!(mapper.point_at(10_000.0), 4);
        assert_eq!(mapper.bin_at(-10.0), 10);
        assert_eq!(mapper.bin_at(900.0), 0);
    }

    #[test]
    fn nearest_point_rounds() {
        let g = grid();
        let mapper = CoordinateMapper::new(&g, 400.0, 200.0).expect("mapper");
        // 4 intervals of 100px: 149 is nearer point 1, 151 nearer point 2.
        assert_eq!(mapper.point_at(149.0), 1);
        assert_eq!(mapper.point_at(151.0), 2);
    }

    #[test]
    fn frequency_round_trips_through_pixels() {
        let g = grid();
        let mapper = CoordinateMapper::new(&g, 400.0, 200.0).expect("mapper");
        let y = mapper.y_for_frequency(5.5).expect("visible");
        assert!((y - 100.0).abs() < 1e-9);
        assert_eq!(mapper.probe(0.0, y).expect("probe").freq_hz, 5.5);
    }

    #[test]
    fn out_of_range_reference_lines_are_skipped() {
        let g = grid();
        let mapper = CoordinateMapper::new(&g, 400.0, 200.0).expect("mapper");
        let lines = mapper.reference_lines(HARMONIC_REFERENCE_HZ);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].freq_hz, 7.83);
        assert!(mapper.y_for_frequency(2.0).is_none());
    }

    #[test]
    fn ticks_cover_axis() {
        let g = grid();
        let mapper = CoordinateMapper::new(&g, 400.0, 200.0).expect("mapper");
        let ticks: Vec<f64> = mapper.frequency_ticks(1.0).iter().map(|t| t.freq_hz).collect();
        assert_eq!(ticks, vec![3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        assert!(mapper.frequency_ticks(0.0).is_empty());
    }

    #[test]
    fn ticks_finer_than_bin_fraction_are_refused() {
        let g = grid();
        let mapper = CoordinateMapper::new(&g, 400.0, 200.0).expect("mapper");
        // Bin step is 0.5 Hz, so the finest accepted spacing is 0.005 Hz.
        assert!(mapper.frequency_ticks(1e-12).is_empty());
        assert!(mapper.frequency_ticks(0.004).is_empty());

        let finest = mapper.frequency_ticks(0.005);
        assert!(!finest.is_empty());
        assert!(finest.len() <= 1001);
    }

    #[test]
    fn x_for_point_spans_width() {
        let g = grid();
        let mapper = CoordinateMapper::new(&g, 400.0, 200.0).expect("mapper");
        assert_eq!(mapper.x_for_point(0), Some(0.0));
        assert_eq!(mapper.x_for_point(4), Some(400.0));
        assert_eq!(mapper.x_for_point(5), None);
    }
}
