use std::{
    ops::Range,
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use bytes::Bytes;
use moka::{
    Expiry as EntryExpiry,
    future::Cache,
    ops::compute::{CompResult, Op},
};

use crate::{
    config::MemoryConfig,
    core::{CacheError, CacheResult, CacheStore, Expiry},
};

#[derive(Debug, Clone)]
enum MemoryValue {
    Scalar(Bytes),
    List(Vec<Bytes>),
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: MemoryValue,
    ttl: Option<Duration>,
}

impl MemoryEntry {
    fn scalar(value: Bytes, expiry: Expiry) -> Arc<Self> {
        Arc::new(Self {
            value: MemoryValue::Scalar(value),
            ttl: expiry.ttl(),
        })
    }

    fn list(items: Vec<Bytes>) -> Arc<Self> {
        Arc::new(Self {
            value: MemoryValue::List(items),
            ttl: None,
        })
    }
}

/// Every write sets the entry's own lifetime, like `SET`/`SETEX` do.
struct PerEntryExpiry;

impl EntryExpiry<String, Arc<MemoryEntry>> for PerEntryExpiry {
    fn expire_after_create(
        &self, _key: &String, value: &Arc<MemoryEntry>, _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_update(
        &self, _key: &String, value: &Arc<MemoryEntry>, _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.ttl
    }
}

/// In-process cache store backed by moka.
///
/// Mutations of a key go through moka's per-key compute, which makes list
/// replace atomic with respect to other writers of the same key.
#[derive(Clone)]
pub struct MemoryStore {
    cache: Cache<String, Arc<MemoryEntry>>,
}

impl MemoryStore {
    pub fn new(config: &MemoryConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.capacity)
            .expire_after(PerEntryExpiry)
            .build();
        Self { cache }
    }

    async fn read_list(&self, key: &str) -> CacheResult<Vec<Bytes>> {
        match self.cache.get(key).await {
            None => Ok(Vec::new()),
            Some(entry) => {
                match &entry.value {
                    MemoryValue::List(items) => Ok(items.clone()),
                    MemoryValue::Scalar(_) => {
                        Err(CacheError::WrongType(key.to_string()))
                    }
                }
            }
        }
    }

    /// Runs `update` over the current list under the key's compute lock.
    async fn modify_list<F, R>(&self, key: &str, update: F) -> CacheResult<R>
    where
        F: FnOnce(&mut Vec<Bytes>) -> R + Send,
        R: Send,
    {
        let mut outcome = None;
        let mut wrong_type = false;

        self.cache
            .entry(key.to_string())
            .and_compute_with(|current| {
                let op = match current.map(|entry| entry.into_value()) {
                    Some(entry) => {
                        match &entry.value {
                            MemoryValue::List(items) => {
                                let mut items = items.clone();
                                outcome = Some(update(&mut items));
                                list_op(items)
                            }
                            MemoryValue::Scalar(_) => {
                                wrong_type = true;
                                Op::Nop
                            }
                        }
                    }
                    None => {
                        let mut items = Vec::new();
                        outcome = Some(update(&mut items));
                        list_op(items)
                    }
                };
                std::future::ready(op)
            })
            .await;

        if wrong_type {
            return Err(CacheError::WrongType(key.to_string()));
        }
        outcome.ok_or_else(|| CacheError::Unavailable(key.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self { Self::new(&MemoryConfig::default()) }
}

/// An emptied list disappears, as it does in Redis.
fn list_op(items: Vec<Bytes>) -> Op<Arc<MemoryEntry>> {
    if items.is_empty() {
        Op::Remove
    }
    else {
        Op::Put(MemoryEntry::list(items))
    }
}

/// Translates Redis-style inclusive, possibly negative, bounds.
fn list_window(len: usize, start: isize, stop: isize) -> Range<usize> {
    let len = len as isize;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };

    if start > stop || start >= len {
        0..0
    }
    else {
        start as usize..(stop + 1) as usize
    }
}

fn remove_matching(items: &mut Vec<Bytes>, value: &Bytes, count: isize) -> usize {
    let limit = if count == 0 { usize::MAX } else { count.unsigned_abs() };
    let mut removed = 0;

    if count >= 0 {
        items.retain(|item| {
            if removed < limit && item == value {
                removed += 1;
                false
            }
            else {
                true
            }
        });
    }
    else {
        let mut index = items.len();
        while index > 0 && removed < limit {
            index -= 1;
            if items[index] == *value {
                items.remove(index);
                removed += 1;
            }
        }
    }

    removed
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> CacheResult<Option<Bytes>> {
        match self.cache.get(key).await {
            None => Ok(None),
            Some(entry) => {
                match &entry.value {
                    MemoryValue::Scalar(bytes) => Ok(Some(bytes.clone())),
                    MemoryValue::List(_) => {
                        Err(CacheError::WrongType(key.to_string()))
                    }
                }
            }
        }
    }

    async fn set(
        &self, key: &str, value: Bytes, expiry: Expiry,
    ) -> CacheResult<()> {
        self.cache
            .insert(key.to_string(), MemoryEntry::scalar(value, expiry))
            .await;
        Ok(())
    }

    async fn set_if_absent(
        &self, key: &str, value: Bytes,
    ) -> CacheResult<bool> {
        let result = self
            .cache
            .entry(key.to_string())
            .and_compute_with(|current| {
                let op = match current {
                    Some(_) => Op::Nop,
                    None => Op::Put(MemoryEntry::scalar(value, Expiry::Never)),
                };
                std::future::ready(op)
            })
            .await;

        Ok(matches!(result, CompResult::Inserted(_)))
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        Ok(self.cache.get(key).await.is_some())
    }

    async fn remove(&self, key: &str) -> CacheResult<bool> {
        Ok(self.cache.remove(key).await.is_some())
    }

    async fn list_range(
        &self, key: &str, start: isize, stop: isize,
    ) -> CacheResult<Vec<Bytes>> {
        let items = self.read_list(key).await?;
        let window = list_window(items.len(), start, stop);
        Ok(items[window].to_vec())
    }

    async fn list_push(&self, key: &str, value: Bytes) -> CacheResult<usize> {
        self.modify_list(key, move |items| {
            items.push(value);
            items.len()
        })
        .await
    }

    async fn list_remove(
        &self, key: &str, value: Bytes, count: isize,
    ) -> CacheResult<usize> {
        self.modify_list(key, move |items| {
            remove_matching(items, &value, count)
        })
        .await
    }

    async fn list_replace(
        &self, key: &str, stale: &[Bytes], value: Bytes,
    ) -> CacheResult<()> {
        let stale = stale.to_vec();
        self.modify_list(key, move |items| {
            items.retain(|item| *item != value && !stale.contains(item));
            items.push(value);
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(value: &str) -> Bytes { Bytes::copy_from_slice(value.as_bytes()) }

    #[test]
    fn test_list_window_follows_redis_bounds() {
        assert_eq!(list_window(5, 0, -1), 0..5);
        assert_eq!(list_window(5, 1, 2), 1..3);
        assert_eq!(list_window(5, -2, -1), 3..5);
        assert_eq!(list_window(5, 0, 100), 0..5);
        assert_eq!(list_window(5, 4, 1), 0..0);
        assert_eq!(list_window(0, 0, -1), 0..0);
    }

    #[test]
    fn test_remove_matching_counts() {
        let mut items = vec![b("a"), b("b"), b("a"), b("a")];
        assert_eq!(remove_matching(&mut items, &b("a"), 1), 1);
        assert_eq!(items, vec![b("b"), b("a"), b("a")]);

        assert_eq!(remove_matching(&mut items, &b("a"), -1), 1);
        assert_eq!(items, vec![b("b"), b("a")]);

        let mut items = vec![b("a"), b("b"), b("a")];
        assert_eq!(remove_matching(&mut items, &b("a"), 0), 2);
        assert_eq!(items, vec![b("b")]);
    }

    #[tokio::test]
    async fn test_scalar_set_get_and_set_if_absent() {
        let store = MemoryStore::default();

        assert!(store.set_if_absent("theater:1", b("AMC")).await.unwrap());
        assert!(!store.set_if_absent("theater:1", b("Regal")).await.unwrap());
        assert_eq!(store.get("theater:1").await.unwrap(), Some(b("AMC")));

        store.set("theater:1", b("Regal"), Expiry::Never).await.unwrap();
        assert_eq!(store.get("theater:1").await.unwrap(), Some(b("Regal")));
        assert!(store.exists("theater:1").await.unwrap());
        assert!(store.remove("theater:1").await.unwrap());
        assert!(!store.exists("theater:1").await.unwrap());
    }

    #[tokio::test]
    async fn test_entries_expire_after_their_ttl() {
        let store = MemoryStore::default();
        let ttl = Expiry::After(Duration::from_millis(100));

        store.set("report:top_theater:x", b("{}"), ttl).await.unwrap();
        store.set("theater:1", b("AMC"), Expiry::Never).await.unwrap();
        assert!(store.exists("report:top_theater:x").await.unwrap());

        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(store.get("report:top_theater:x").await.unwrap(), None);
        assert_eq!(store.get("theater:1").await.unwrap(), Some(b("AMC")));
    }

    #[tokio::test]
    async fn test_list_replace_deduplicates() {
        let store = MemoryStore::default();

        store.list_push("sales_theater:1", b("one")).await.unwrap();
        store.list_push("sales_theater:1", b("two")).await.unwrap();
        store
            .list_replace("sales_theater:1", &[], b("one"))
            .await
            .unwrap();
        store
            .list_replace("sales_theater:1", &[b("two")], b("two-v2"))
            .await
            .unwrap();

        let items = store.list_range("sales_theater:1", 0, -1).await.unwrap();
        assert_eq!(items, vec![b("one"), b("two-v2")]);
    }

    #[tokio::test]
    async fn test_list_and_scalar_kinds_do_not_mix() {
        let store = MemoryStore::default();
        store.set("sale:1", b("{}"), Expiry::Never).await.unwrap();

        let result = store.list_push("sale:1", b("x")).await;
        assert!(matches!(result, Err(CacheError::WrongType(_))));

        store.list_push("sales_date:2024-03-10", b("x")).await.unwrap();
        let result = store.get("sales_date:2024-03-10").await;
        assert!(matches!(result, Err(CacheError::WrongType(_))));
    }

    #[tokio::test]
    async fn test_removing_last_element_drops_the_key() {
        let store = MemoryStore::default();
        store.list_push("sales_date:2024-03-10", b("x")).await.unwrap();

        let removed = store
            .list_remove("sales_date:2024-03-10", b("x"), 0)
            .await
            .unwrap();

        assert_eq!(removed, 1);
        assert!(!store.exists("sales_date:2024-03-10").await.unwrap());
    }
}
