use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::retry::{RetryPolicy, DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_MAX_RETRIES};

/// Default series row limit: one day of 15-minute samples.
pub const DEFAULT_SERIES_LIMIT: u32 = 96;
/// Default background refresh interval: one sample period.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 900;

/// Feed client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Base URL of the feed service.
    pub base_url: String,
    /// Row limit requested from the series endpoint.
    pub series_limit: u32,
    /// Interval between background refreshes.
    pub refresh_interval: Duration,
    /// Retry budget and per-attempt timeout.
    pub retry: RetryPolicy,
}

impl FeedConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                 | Default    |
    /// |-------------------------|------------|
    /// | `FEED_BASE_URL`         | required   |
    /// | `SERIES_LIMIT`          | `96`       |
    /// | `REFRESH_INTERVAL_SECS` | `900`      |
    /// | `ATTEMPT_TIMEOUT_SECS`  | `20`       |
    /// | `MAX_RETRIES`           | `2`        |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup("FEED_BASE_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("FEED_BASE_URL"))?;

        let series_limit: u32 = parse_var(&lookup, "SERIES_LIMIT", DEFAULT_SERIES_LIMIT, "a positive integer")?;
        if series_limit == 0 {
            return Err(invalid("SERIES_LIMIT", "a positive integer", "0"));
        }

        let refresh_secs: u64 = parse_var(
            &lookup,
            "REFRESH_INTERVAL_SECS",
            DEFAULT_REFRESH_INTERVAL_SECS,
            "a positive number of seconds",
        )?;
        if refresh_secs == 0 {
            return Err(invalid("REFRESH_INTERVAL_SECS", "a positive number of seconds", "0"));
        }

        let timeout_secs: u64 = parse_var(
            &lookup,
            "ATTEMPT_TIMEOUT_SECS",
            DEFAULT_ATTEMPT_TIMEOUT.as_secs(),
            "a positive number of seconds",
        )?;
        if timeout_secs == 0 {
            return Err(invalid("ATTEMPT_TIMEOUT_SECS", "a positive number of seconds", "0"));
        }

        let max_retries: u32 = parse_var(&lookup, "MAX_RETRIES", DEFAULT_MAX_RETRIES, "a non-negative integer")?;

        Ok(Self {
            base_url,
            series_limit,
            refresh_interval: Duration::from_secs(refresh_secs),
            retry: RetryPolicy {
                max_retries,
                attempt_timeout: Duration::from_secs(timeout_secs),
                ..RetryPolicy::default()
            },
        })
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| invalid(name, expected, &raw)),
    }
}

fn invalid(name: &'static str, expected: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        expected,
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<FeedConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        FeedConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[("FEED_BASE_URL", "https://feeds.example.org")]).expect("config");
        assert_eq!(config.series_limit, 96);
        assert_eq!(config.refresh_interval, Duration::from_secs(900));
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.retry.attempt_timeout, Duration::from_secs(20));
    }

    #[test]
    fn overrides_apply() {
        let config = load(&[
            ("FEED_BASE_URL", "http://localhost:8080"),
            ("SERIES_LIMIT", "288"),
            ("MAX_RETRIES", "0"),
            ("ATTEMPT_TIMEOUT_SECS", " 5 "),
        ])
        .expect("config");
        assert_eq!(config.series_limit, 288);
        assert_eq!(config.retry.total_attempts(), 1);
        assert_eq!(config.retry.attempt_timeout, Duration::from_secs(5));
    }

    #[test]
    fn base_url_is_required() {
        assert_matches!(load(&[]), Err(ConfigError::Missing("FEED_BASE_URL")));
        assert_matches!(
            load(&[("FEED_BASE_URL", "  ")]),
            Err(ConfigError::Missing("FEED_BASE_URL"))
        );
    }

    #[test]
    fn bad_numbers_are_rejected() {
        assert_matches!(
            load(&[("FEED_BASE_URL", "http://x"), ("SERIES_LIMIT", "many")]),
            Err(ConfigError::Invalid { name: "SERIES_LIMIT", .. })
        );
        assert_matches!(
            load(&[("FEED_BASE_URL", "http://x"), ("REFRESH_INTERVAL_SECS", "0")]),
            Err(ConfigError::Invalid { name: "REFRESH_INTERVAL_SECS", .. })
        );
    }
}
