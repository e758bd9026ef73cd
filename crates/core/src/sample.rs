//! Decoded time-series samples and the per-timestamp quality map.

use std::collections::HashMap;

use serde::Serialize;

use crate::lenient;
use crate::payload::SeriesRow;
use crate::types::Timestamp;

/// Amplitude bands carried by a sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AmplitudeBands {
    pub total: Option<f64>,
    pub low: Option<f64>,
    pub mid: Option<f64>,
    pub high: Option<f64>,
}

/// One measurement from the series feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub timestamp: Timestamp,
    pub amplitude: AmplitudeBands,
    /// Fundamental frequency (`f0`) in Hz.
    pub fundamental_hz: Option<f64>,
    pub usable: bool,
    /// Clamped to `0.0..=1.0`.
    pub quality_score: Option<f64>,
}

impl Sample {
    /// Build a sample from a series row. Rows without a readable
    /// timestamp cannot be placed on the time axis and yield `None`.
    pub fn from_row(row: &SeriesRow) -> Option<Self> {
        let timestamp = lenient::timestamp(row.ts.as_deref()?)?;
        Some(Self {
            timestamp,
            amplitude: AmplitudeBands {
                total: row.amplitude.total,
                low: row.amplitude.band_low,
                mid: row.amplitude.band_mid,
                high: row.amplitude.band_high,
            },
            fundamental_hz: row.harmonics.f0,
            usable: row.quality.usable.unwrap_or(true),
            quality_score: row.quality.quality_score.map(|q| q.clamp(0.0, 1.0)),
        })
    }
}

/// Decode rows into samples sorted ascending by timestamp.
///
/// The sort is stable, so rows sharing a timestamp keep feed order.
pub fn samples_ascending(rows: &[SeriesRow]) -> Vec<Sample> {
    let mut samples: Vec<Sample> = rows.iter().filter_map(Sample::from_row).collect();
    samples.sort_by_key(|s| s.timestamp);
    samples
}

/// Timestamp → usable flag. A timestamp with no entry is usable: having
/// no quality data is not the same as having bad data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QualityMap {
    flags: HashMap<Timestamp, bool>,
}

impl QualityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_samples(samples: &[Sample]) -> Self {
        let flags = samples.iter().map(|s| (s.timestamp, s.usable)).collect();
        Self { flags }
    }

    pub fn insert(&mut self, timestamp: Timestamp, usable: bool) {
        self.flags.insert(timestamp, usable);
    }

    pub fn is_usable(&self, timestamp: &Timestamp) -> bool {
        self.flags.get(timestamp).copied().unwrap_or(true)
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}
