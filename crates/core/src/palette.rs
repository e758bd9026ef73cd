//! False-color palettes for the heatmap.
//!
//! A palette is 256 RGB entries linearly interpolated between ordered
//! control points. Both contrast modes go through [`Palette::interpolate`].

use serde::{Deserialize, Serialize};

/// Number of entries in every palette.
pub const PALETTE_SIZE: usize = 256;

/// Which control-point set to render with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContrastMode {
    #[default]
    Standard,
    HighContrast,
}

/// A palette control point: `position` in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub position: f64,
    pub rgb: [u8; 3],
}

const fn stop(position: f64, r: u8, g: u8, b: u8) -> ColorStop {
    ColorStop {
        position,
        rgb: [r, g, b],
    }
}

/// Deep blue through teal to warm yellow.
pub const STANDARD_STOPS: &[ColorStop] = &[
    stop(0.00, 8, 12, 38),
    stop(0.25, 32, 58, 140),
    stop(0.50, 28, 160, 160),
    stop(0.75, 240, 200, 60),
    stop(1.00, 250, 250, 240),
];

/// Black through magenta to near-white, for low-contrast displays.
pub const HIGH_CONTRAST_STOPS: &[ColorStop] = &[
    stop(0.00, 0, 0, 0),
    stop(0.20, 48, 0, 96),
    stop(0.45, 200, 0, 80),
    stop(0.70, 255, 140, 0),
    stop(1.00, 255, 255, 200),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: [[u8; 3]; PALETTE_SIZE],
}

impl Palette {
    pub fn for_mode(mode: ContrastMode) -> Self {
        match mode {
            ContrastMode::Standard => Self::interpolate(STANDARD_STOPS),
            ContrastMode::HighContrast => Self::interpolate(HIGH_CONTRAST_STOPS),
        }
    }

    /// Build a palette from control points. Stops need not be sorted;
    /// entries before the first stop or after the last take its color.
    /// No stops gives an all-black palette.
    pub fn interpolate(stops: &[ColorStop]) -> Self {
        let mut sorted = stops.to_vec();
        sorted.sort_by(|a, b| a.position.total_cmp(&b.position));

        let mut colors = [[0u8; 3]; PALETTE_SIZE];
        let (Some(first), Some(last)) = (sorted.first(), sorted.last()) else {
            return Self { colors };
        };

        for (i, color) in colors.iter_mut().enumerate() {
            let t = i as f64 / (PALETTE_SIZE - 1) as f64;
            *color = if t <= first.position {
                first.rgb
            } else if t >= last.position {
                last.rgb
            } else {
                let upper = sorted
                    .iter()
                    .position(|s| s.position >= t)
                    .unwrap_or(sorted.len() - 1);
                let (a, b) = (sorted[upper.saturating_sub(1)], sorted[upper]);
                blend(a, b, t)
            };
        }

        Self { colors }
    }

    pub fn color(&self, index: u8) -> [u8; 3] {
        self.colors[usize::from(index)]
    }
}

fn blend(a: ColorStop, b: ColorStop, t: f64) -> [u8; 3] {
    let span = b.position - a.position;
    let f = if span > 0.0 { (t - a.position) / span } else { 0.0 };
    let mut out = [0u8; 3];
    for (channel, (ca, cb)) in out.iter_mut().zip(a.rgb.iter().zip(b.rgb.iter())) {
        let (ca, cb) = (f64::from(*ca), f64::from(*cb));
        *channel = (ca + (cb - ca) * f).round().clamp(0.0, 255.0) as u8;
    }
    out
}
