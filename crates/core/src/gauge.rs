//! Severity ladder for the amplitude gauge.
//!
//! Pure logic, no state: the caller passes the latest total amplitude and
//! gets back a discrete level plus a 0–100 display index.

use serde::Serialize;

/// Upper (exclusive) bound of each level below `Intense`.
const CALM_BELOW: f64 = 0.03;
const STABLE_BELOW: f64 = 0.06;
const ACTIVE_BELOW: f64 = 0.10;
const ELEVATED_BELOW: f64 = 0.16;

/// Amplitude to display-index scale factor.
const INDEX_SCALE: f64 = 1000.0;
const INDEX_MAX: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum GaugeLevel {
    Calm,
    Stable,
    Active,
    Elevated,
    Intense,
}

impl GaugeLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Calm => "Calm",
            Self::Stable => "Stable",
            Self::Active => "Active",
            Self::Elevated => "Elevated",
            Self::Intense => "Intense",
        }
    }

    fn for_amplitude(a: f64) -> Self {
        if a < CALM_BELOW {
            Self::Calm
        } else if a < STABLE_BELOW {
            Self::Stable
        } else if a < ACTIVE_BELOW {
            Self::Active
        } else if a < ELEVATED_BELOW {
            Self::Elevated
        } else {
            Self::Intense
        }
    }
}

impl std::fmt::Display for GaugeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of classifying one amplitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GaugeReading {
    pub level: GaugeLevel,
    /// `amplitude * 1000`, clamped to `0..=100`.
    pub index: f64,
}

/// Classify an amplitude. A missing or non-finite amplitude means no
/// signal and reads as zero.
pub fn classify(amplitude: Option<f64>) -> GaugeReading {
    let a = amplitude.filter(|a| a.is_finite()).unwrap_or(0.0);
    GaugeReading {
        level: GaugeLevel::for_amplitude(a),
        index: (a * INDEX_SCALE).clamp(0.0, INDEX_MAX),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_amplitude() {
        let reading = classify(Some(0.05));
        assert_eq!(reading.level, GaugeLevel::Stable);
        assert!((reading.index - 50.0).abs() < 1e-9);
    }

    #[test]
    fn intense_amplitude_clamps_index() {
        let reading = classify(Some(0.20));
        assert_eq!(reading.level, GaugeLevel::Intense);
        assert_eq!(reading.index, 100.0);
    }

    #[test]
    fn missing_amplitude_reads_as_calm() {
        let reading = classify(None);
        assert_eq!(reading.level, GaugeLevel::Calm);
        assert_eq!(reading.index, 0.0);
        assert_eq!(classify(Some(f64::NAN)).level, GaugeLevel::Calm);
    }

    #[test]
    fn ladder_boundaries_are_lower_inclusive() {
        assert_eq!(classify(Some(0.0299)).level, GaugeLevel::Calm);
        assert_eq!(classify(Some(0.03)).level, GaugeLevel::Stable);
        assert_eq!(classify(Some(0.06)).level, GaugeLevel::Active);
        assert_eq!(classify(Some(0.10)).level, GaugeLevel::Elevated);
        assert_eq!(classify(Some(0.16)).level, GaugeLevel::Intense);
    }

    #[test]
    fn negative_amplitude_index_floors_at_zero() {
        let reading = classify(Some(-0.4));
        assert_eq!(reading.level, GaugeLevel::Calm);
        assert_eq!(reading.index, 0.0);
    }
}
