use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use super::value::CacheResult;

/// Lifetime of a written entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Durable entry, removed only by an explicit write.
    Never,
    /// Entry the cache store drops once the duration has elapsed.
    After(Duration),
}

impl Expiry {
    /// A zero duration means no expiration.
    pub fn from_ttl(ttl: Duration) -> Self {
        if ttl.is_zero() { Self::Never } else { Self::After(ttl) }
    }

    pub fn ttl(self) -> Option<Duration> {
        match self {
            Self::Never => None,
            Self::After(ttl) => Some(ttl),
        }
    }
}

/// Key-value operations the cache-aside layer needs from a cache store.
///
/// List indexes follow Redis conventions: `stop` is inclusive and negative
/// indexes count from the tail, so `list_range(key, 0, -1)` reads the whole
/// list. A missing key reads as an empty list.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> CacheResult<Option<Bytes>>;

    async fn set(
        &self, key: &str, value: Bytes, expiry: Expiry,
    ) -> CacheResult<()>;

    /// Writes a durable value only when the key is absent. Returns whether
    /// the value was written.
    async fn set_if_absent(&self, key: &str, value: Bytes)
    -> CacheResult<bool>;

    async fn exists(&self, key: &str) -> CacheResult<bool>;

    async fn remove(&self, key: &str) -> CacheResult<bool>;

    async fn list_range(
        &self, key: &str, start: isize, stop: isize,
    ) -> CacheResult<Vec<Bytes>>;

    /// Appends to the tail, returning the new length.
    async fn list_push(&self, key: &str, value: Bytes) -> CacheResult<usize>;

    /// Removes elements equal to `value`: all of them when `count` is 0,
    /// the first `count` from the head when positive, from the tail when
    /// negative. Returns how many were removed.
    async fn list_remove(
        &self, key: &str, value: Bytes, count: isize,
    ) -> CacheResult<usize>;

    /// Atomically removes every element equal to `value` or to any of
    /// `stale`, then appends `value`. No other writer observes the list
    /// between the removal and the append.
    async fn list_replace(
        &self, key: &str, stale: &[Bytes], value: Bytes,
    ) -> CacheResult<()>;
}
