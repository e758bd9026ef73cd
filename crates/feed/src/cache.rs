//! Per-endpoint TTL cache of the last successfully decoded payload.
//!
//! One shared map behind a [`tokio::sync::RwLock`]: readers proceed in
//! parallel, a write excludes everyone else. Values are stored
//! serialized and decoded on read; an entry that no longer decodes as the
//! requested type is a cache miss, never an error.
//!
//! There is no eviction: the key space is the three [`Endpoint`]s and a
//! write simply replaces the previous entry.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use resonance_core::types::Timestamp;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::endpoint::Endpoint;

#[derive(Debug, Clone)]
struct CacheEntry {
    key: Endpoint,
    serialized: String,
    fetched_at: Timestamp,
    expires_at: Timestamp,
}

impl CacheEntry {
    fn decode<T: DeserializeOwned>(&self) -> Option<T> {
        match serde_json::from_str(&self.serialized) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(endpoint = %self.key, error = %e, "Cached entry failed to decode");
                None
            }
        }
    }
}

/// Shared cache, constructed once and handed to the orchestrator as an
/// `Arc<FeedCache>`.
#[derive(Debug, Default)]
pub struct FeedCache {
    entries: RwLock<HashMap<Endpoint, CacheEntry>>,
}

impl FeedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored value, only while it is within its freshness window.
    pub async fn read_valid<T: DeserializeOwned>(&self, key: Endpoint) -> Option<T> {
        self.read_valid_at(key, Utc::now()).await
    }

    /// [`read_valid`](Self::read_valid) against an explicit clock.
    pub async fn read_valid_at<T: DeserializeOwned>(&self, key: Endpoint, now: Timestamp) -> Option<T> {
        let entries = self.entries.read().await;
        let entry = entries.get(&key)?;
        if now >= entry.expires_at {
            return None;
        }
        entry.decode()
    }

    /// The stored value regardless of age. Only for stale fallback.
    pub async fn read_any<T: DeserializeOwned>(&self, key: Endpoint) -> Option<T> {
        self.entries.read().await.get(&key)?.decode()
    }

    /// Replace the entry for `key` and start a new freshness window.
    pub async fn write<T: Serialize>(&self, key: Endpoint, value: &T, ttl: Duration) {
        self.write_at(key, value, ttl, Utc::now()).await;
    }

    /// [`write`](Self::write) against an explicit clock.
    pub async fn write_at<T: Serialize>(
        &self,
        key: Endpoint,
        value: &T,
        ttl: Duration,
        fetched_at: Timestamp,
    ) {
        let serialized = match serde_json::to_string(value) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(endpoint = %key, error = %e, "Payload not cacheable, skipping write");
                return;
            }
        };
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| fetched_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let entry = CacheEntry {
            key,
            serialized,
            fetched_at,
            expires_at,
        };
        self.entries.write().await.insert(key, entry);
    }

    /// How long ago the entry for `key` was fetched.
    pub async fn entry_age(&self, key: Endpoint) -> Option<chrono::Duration> {
        let entries = self.entries.read().await;
        entries
            .get(&key)
            .map(|entry| Utc::now().signed_duration_since(entry.fetched_at))
    }
}
