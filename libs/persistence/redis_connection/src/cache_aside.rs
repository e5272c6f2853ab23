use std::future::Future;

use tracing::{debug, instrument, warn};

use crate::{
    core::{CacheValue, Expiry},
    types::normal::Normal,
};

/// Where a returned value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cache,
    Store,
}

/// A value tagged with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct Sourced<T> {
    pub source: Source,
    pub value: T,
}

impl<T> Sourced<T> {
    pub fn cache(value: T) -> Self {
        Self {
            source: Source::Cache,
            value,
        }
    }

    pub fn store(value: T) -> Self {
        Self {
            source: Source::Store,
            value,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sourced<U> {
        Sourced {
            source: self.source,
            value: f(self.value),
        }
    }
}

impl<T> Normal<T>
where
    T: CacheValue,
{
    /// Reads the key, falling back to `loader` on a miss.
    ///
    /// An unreadable or undecodable cached value counts as a miss. A loaded
    /// value is written back with `expiry`; a failed write is logged and the
    /// value is still returned. `Ok(None)` from the loader writes nothing, and
    /// a loader error is returned as is.
    #[instrument(skip(self, loader), fields(key = %self.key()))]
    pub async fn get_or_load<F, Fut, E>(
        &self, expiry: Expiry, loader: F,
    ) -> Result<Option<Sourced<T>>, E>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<Option<T>, E>> + Send,
    {
        match self.try_get().await {
            Ok(Some(value)) => {
                debug!("Cache hit");
                return Ok(Some(Sourced::cache(value)));
            }
            Ok(None) => debug!("Cache miss"),
            Err(e) => warn!(error = %e, "Cache read failed, loading from store"),
        }

        let Some(value) = loader().await?
        else {
            return Ok(None);
        };

        if let Err(e) = self.set(&value, expiry).await {
            warn!(error = %e, "Cache write failed");
        }

        Ok(Some(Sourced::store(value)))
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use async_trait::async_trait;
    use bytes::Bytes;

    use super::*;
    use crate::{
        CacheError, CacheResult, CacheStore, MemoryStore,
        core::{CacheTypeTrait, Primitive},
    };

    /// Memory store whose scalar reads or writes fail like a lost
    /// connection.
    #[derive(Default)]
    struct Unreachable {
        inner: MemoryStore,
        reads: bool,
        writes: bool,
    }

    fn refuse(failing: bool) -> CacheResult<()> {
        if failing {
            return Err(CacheError::Unavailable("connection refused".into()));
        }
        Ok(())
    }

    #[async_trait]
    impl CacheStore for Unreachable {
        async fn get(&self, key: &str) -> CacheResult<Option<Bytes>> {
            refuse(self.reads)?;
            self.inner.get(key).await
        }

        async fn set(
            &self, key: &str, value: Bytes, expiry: Expiry,
        ) -> CacheResult<()> {
            refuse(self.writes)?;
            self.inner.set(key, value, expiry).await
        }

        async fn set_if_absent(
            &self, key: &str, value: Bytes,
        ) -> CacheResult<bool> {
            refuse(self.writes)?;
            self.inner.set_if_absent(key, value).await
        }

        async fn exists(&self, key: &str) -> CacheResult<bool> {
            self.inner.exists(key).await
        }

        async fn remove(&self, key: &str) -> CacheResult<bool> {
            self.inner.remove(key).await
        }

        async fn list_range(
            &self, key: &str, start: isize, stop: isize,
        ) -> CacheResult<Vec<Bytes>> {
            self.inner.list_range(key, start, stop).await
        }

        async fn list_push(
            &self, key: &str, value: Bytes,
        ) -> CacheResult<usize> {
            self.inner.list_push(key, value).await
        }

        async fn list_remove(
            &self, key: &str, value: Bytes, count: isize,
        ) -> CacheResult<usize> {
            self.inner.list_remove(key, value, count).await
        }

        async fn list_replace(
            &self, key: &str, stale: &[Bytes], value: Bytes,
        ) -> CacheResult<()> {
            self.inner.list_replace(key, stale, value).await
        }
    }

    fn name_key(store: &Arc<dyn CacheStore>) -> Normal<Primitive<String>> {
        Normal::from_store_and_key(store.clone(), "theater:7".into())
    }

    #[tokio::test]
    async fn test_second_read_is_served_from_cache() {
        let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::default());
        let key = name_key(&store);
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        let load = move || {
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(Some(Primitive("Cinema".to_string())))
            }
        };

        let first = key.get_or_load(Expiry::Never, load).await.unwrap();
        let second = key.get_or_load(Expiry::Never, load).await.unwrap();

        assert_eq!(first.map(|s| s.source), Some(Source::Store));
        let second = second.unwrap();
        assert_eq!(second.source, Source::Cache);
        assert_eq!(second.value.0, "Cinema");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_value_is_loaded_again() {
        let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::default());
        let key = name_key(&store);
        let ttl = Expiry::After(Duration::from_millis(100));
        let load =
            || async { Ok::<_, String>(Some(Primitive("Cinema".into()))) };

        key.get_or_load(ttl, load).await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        let again = key.get_or_load(ttl, load).await.unwrap().unwrap();

        assert_eq!(again.source, Source::Store);
    }

    #[tokio::test]
    async fn test_loader_error_writes_nothing() {
        let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::default());
        let key = name_key(&store);

        let result = key
            .get_or_load(Expiry::Never, || {
                async { Err::<Option<Primitive<String>>, _>("db down") }
            })
            .await;

        assert_eq!(result.unwrap_err(), "db down");
        assert!(!store.exists("theater:7").await.unwrap());
    }

    #[tokio::test]
    async fn test_absent_data_writes_nothing() {
        let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::default());
        let key = name_key(&store);

        let result = key
            .get_or_load(Expiry::Never, || async { Ok::<_, String>(None) })
            .await
            .unwrap();

        assert!(result.is_none());
        assert!(!store.exists("theater:7").await.unwrap());
    }

    #[tokio::test]
    async fn test_undecodable_value_is_a_miss() {
        let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::default());
        store
            .list_push("theater:7", bytes::Bytes::from_static(b"x"))
            .await
            .unwrap();
        let key = name_key(&store);

        let result = key
            .get_or_load(Expiry::Never, || {
                async { Ok::<_, String>(Some(Primitive("Cinema".into()))) }
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(result.source, Source::Store);
    }

    #[tokio::test]
    async fn test_read_failure_is_a_miss() {
        let store: Arc<dyn CacheStore> = Arc::new(Unreachable {
            reads: true,
            ..Default::default()
        });
        let key = name_key(&store);

        let result = key
            .get_or_load(Expiry::Never, || {
                async { Ok::<_, String>(Some(Primitive("Cinema".into()))) }
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(result.source, Source::Store);
        assert_eq!(result.value.0, "Cinema");
        assert!(store.exists("theater:7").await.unwrap());
    }

    #[tokio::test]
    async fn test_write_failure_still_returns_loaded_value() {
        let store: Arc<dyn CacheStore> = Arc::new(Unreachable {
            writes: true,
            ..Default::default()
        });
        let key = name_key(&store);

        let result = key
            .get_or_load(Expiry::After(Duration::from_secs(300)), || {
                async { Ok::<_, String>(Some(Primitive("Cinema".into()))) }
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(result.source, Source::Store);
        assert_eq!(result.value.0, "Cinema");
        assert!(!store.exists("theater:7").await.unwrap());
    }
}
