use bytes::Bytes;
use chrono::{DateTime, Utc};
use moka::future::Cache;

#[derive(Clone, Debug)]
struct CacheEntry {
    value: Bytes,
    expires_at: DateTime<Utc>,
}

/// In-memory store of byte payloads keyed by string, each with an
/// absolute expiry.
///
/// Expired entries are dropped when they are read. Every call is safe to
/// make concurrently, but a `get` followed by a `set` is not atomic.
#[derive(Clone)]
pub struct TtlCache {
    name: &'static str,
    store: Cache<String, CacheEntry>,
}

impl TtlCache {
    pub fn new(name: &'static str, capacity: Option<u64>) -> Self {
        let mut builder = Cache::builder().name(name);
        if let Some(capacity) = capacity {
            builder = builder.max_capacity(capacity);
        }

        Self {
            name,
            store: builder.build(),
        }
    }

    pub async fn set(&self, key: &str, value: Bytes, expires_at: DateTime<Utc>) {
        self.store
            .insert(key.to_string(), CacheEntry { value, expires_at })
            .await;
    }

    pub async fn get(&self, key: &str) -> Option<Bytes> {
        let entry = self.store.get(key).await?;

        if Utc::now() >= entry.expires_at {
            tracing::debug!(cache = self.name, key, "evicting expired entry");
            self.store.invalidate(key).await;
            return None;
        }

        Some(entry.value)
    }

    /// Overwrites `key` with an entry that is already past its deadline,
    /// forcing the next reader to go back upstream.
    pub async fn expire(&self, key: &str) {
        self.set(key, Bytes::new(), Utc::now()).await;
    }
}
