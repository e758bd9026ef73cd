//! Short-term amplitude trend from the ordered sample series.

use serde::Serialize;

use crate::sample::Sample;

/// Change in total amplitude smaller than this is reported as steady.
pub const TREND_TOLERANCE: f64 = 0.002;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rising,
    Falling,
    Steady,
    /// Fewer than two samples carry a total amplitude.
    Unknown,
}

/// Compare the two most recent samples that carry a total amplitude.
///
/// `samples` must be sorted ascending by timestamp.
pub fn trend(samples: &[Sample]) -> Trend {
    let mut recent = samples
        .iter()
        .rev()
        .filter_map(|s| s.amplitude.total.filter(|a| a.is_finite()));

    let (Some(last), Some(previous)) = (recent.next(), recent.next()) else {
        return Trend::Unknown;
    };

    let delta = last - previous;
    if delta > TREND_TOLERANCE {
        Trend::Rising
    } else if delta < -TREND_TOLERANCE {
        Trend::Falling
    } else {
        Trend::Steady
    }
}
