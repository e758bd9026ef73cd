//! The three read-only feeds and their cache lifetimes.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Freshness window of the latest snapshot.
pub const LATEST_TTL: Duration = Duration::from_secs(60);
/// Freshness window of the time series.
pub const SERIES_TTL: Duration = Duration::from_secs(300);
/// Freshness window of the heatmap grid.
pub const HEATMAP_TTL: Duration = Duration::from_secs(300);

/// One feed endpoint. Also the cache key for that feed's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    Latest,
    Series,
    Heatmap,
}

impl Endpoint {
    pub const ALL: [Endpoint; 3] = [Endpoint::Latest, Endpoint::Series, Endpoint::Heatmap];

    pub fn name(self) -> &'static str {
        match self {
            Self::Latest => "latest",
            Self::Series => "series",
            Self::Heatmap => "heatmap",
        }
    }

    pub fn ttl(self) -> Duration {
        match self {
            Self::Latest => LATEST_TTL,
            Self::Series => SERIES_TTL,
            Self::Heatmap => HEATMAP_TTL,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
