use std::path::PathBuf;

use resonance_core::heatmap::ContrastMode;
use resonance_feed::config::FeedConfig;
use resonance_feed::error::ConfigError;

/// Monitor configuration: the feed settings plus export options.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub feed: FeedConfig,
    /// Where to write the heatmap after each published refresh. Export is
    /// disabled when unset.
    pub heatmap_png_path: Option<PathBuf>,
    pub contrast: ContrastMode,
}

impl MonitorConfig {
    /// Load configuration from environment variables.
    ///
    /// Everything [`FeedConfig::from_env`] reads, plus:
    ///
    /// | Env Var            | Default  |
    /// |--------------------|----------|
    /// | `HEATMAP_PNG_PATH` | unset    |
    /// | `HIGH_CONTRAST`    | `false`  |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let feed = FeedConfig::from_lookup(&lookup)?;

        let heatmap_png_path = lookup("HEATMAP_PNG_PATH")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let high_contrast = match lookup("HIGH_CONTRAST") {
            None => false,
            Some(raw) => parse_flag(&raw).ok_or_else(|| ConfigError::Invalid {
                name: "HIGH_CONTRAST",
                expected: "true or false",
                value: raw.clone(),
            })?,
        };

        Ok(Self {
            feed,
            heatmap_png_path,
            contrast: if high_contrast {
                ContrastMode::HighContrast
            } else {
                ContrastMode::Standard
            },
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
