use crate::endpoint::Endpoint;

/// Errors from a single network attempt.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The HTTP request itself failed (network, DNS, TLS, body read, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The feed returned a non-2xx status code.
    #[error("Feed returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The attempt did not complete within its timeout.
    #[error("Attempt timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The payload decoded but reported `ok: false`.
    #[error("Feed reported a failed payload")]
    NotOk,
}

/// Why one endpoint produced no data in a refresh.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("{endpoint}: network failure after {attempts} attempt(s): {source}")]
    Network {
        endpoint: Endpoint,
        attempts: u32,
        #[source]
        source: TransportError,
    },

    #[error("{endpoint}: payload did not decode: {message}")]
    Decode { endpoint: Endpoint, message: String },
}

impl FeedError {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Self::Network { endpoint, .. } | Self::Decode { endpoint, .. } => *endpoint,
        }
    }
}

/// Invalid configuration value.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{name} must be {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}
