//! Wire types for the three telemetry feeds.
//!
//! Scalars are decoded through [`crate::lenient`] so a numeric string or
//! an integer is as good as a float. The types also serialize, which is
//! how the feed cache stores them.

use serde::{Deserialize, Serialize};

use crate::lenient;
use crate::types::Timestamp;

/// Common status check shared by every feed payload.
pub trait FeedPayload {
    /// `false` only when the feed explicitly reported `ok: false`.
    fn is_ok(&self) -> bool;
}

// ---------------------------------------------------------------------------
// Shared blocks
// ---------------------------------------------------------------------------

/// Fundamental and harmonic peak frequencies in Hz.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Harmonics {
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub f0: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub f1: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub f2: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub f3: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub f4: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub f5: Option<f64>,
}

/// Broadband and per-band amplitude.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Amplitude {
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub total: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub band_low: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub band_mid: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub band_high: Option<f64>,
}

/// Data-quality block attached to each measurement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityInfo {
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub primary_source: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub usable: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub quality_score: Option<f64>,
}

// ---------------------------------------------------------------------------
// latest
// ---------------------------------------------------------------------------

/// Most recent snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestPayload {
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub ok: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub generated_at: Option<String>,
    #[serde(default)]
    pub harmonics: Harmonics,
    #[serde(default)]
    pub amplitude: Amplitude,
    #[serde(default)]
    pub quality: QualityInfo,
}

impl LatestPayload {
    /// Parsed `generatedAt`, if present and readable.
    pub fn generated_at(&self) -> Option<Timestamp> {
        self.generated_at.as_deref().and_then(lenient::timestamp)
    }
}

impl FeedPayload for LatestPayload {
    fn is_ok(&self) -> bool {
        self.ok.unwrap_or(true)
    }
}

// ---------------------------------------------------------------------------
// series
// ---------------------------------------------------------------------------

/// One row of the time series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesRow {
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub ts: Option<String>,
    #[serde(default)]
    pub harmonics: Harmonics,
    #[serde(default)]
    pub amplitude: Amplitude,
    #[serde(default)]
    pub quality: QualityInfo,
}

/// Time series, bounded by the requested row limit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesPayload {
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub ok: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub count: Option<u32>,
    #[serde(default)]
    pub rows: Vec<SeriesRow>,
}

impl FeedPayload for SeriesPayload {
    fn is_ok(&self) -> bool {
        self.ok.unwrap_or(true)
    }
}

// ---------------------------------------------------------------------------
// heatmap
// ---------------------------------------------------------------------------

/// Frequency axis description of the heatmap.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeatmapAxis {
    #[serde(rename = "freqStartHz", default, deserialize_with = "lenient::opt_f64")]
    pub freq_start_hz: Option<f64>,
    #[serde(rename = "freqStepHz", default, deserialize_with = "lenient::opt_f64")]
    pub freq_step_hz: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub bins: Option<u32>,
}

/// One time column of the heatmap.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeatmapPoint {
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub ts: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64_seq")]
    pub bins: Vec<f64>,
}

/// Frequency/time magnitude grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeatmapPayload {
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub ok: Option<bool>,
    #[serde(default)]
    pub axis: HeatmapAxis,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub count: Option<u32>,
    #[serde(default)]
    pub points: Vec<HeatmapPoint>,
}

impl FeedPayload for HeatmapPayload {
    fn is_ok(&self) -> bool {
        self.ok.unwrap_or(true)
    }
}
