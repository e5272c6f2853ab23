use std::{borrow::Cow, marker::PhantomData, sync::Arc};

use bytes::Bytes;

use crate::core::{CacheResult, CacheStore, CacheTypeTrait, CacheValue};

/// An ordered list of values stored under one key.
pub struct List<T> {
    store: Arc<dyn CacheStore>,
    key: Cow<'static, str>,
    __phantom: PhantomData<T>,
}

impl<T> CacheTypeTrait for List<T> {
    fn from_store_and_key(
        store: Arc<dyn CacheStore>, key: Cow<'static, str>,
    ) -> Self {
        Self {
            store,
            key,
            __phantom: PhantomData,
        }
    }
}

impl<T> List<T>
where
    T: CacheValue,
{
    pub fn key(&self) -> &str { &self.key }

    /// Every element in list order, each decoded on its own so one bad
    /// element does not hide the rest.
    pub async fn members(&self) -> CacheResult<Vec<CacheResult<T>>> {
        self.range(0, -1).await
    }

    /// Elements between `start` and `stop`, both inclusive
    pub async fn range(
        &self, start: isize, stop: isize,
    ) -> CacheResult<Vec<CacheResult<T>>> {
        let raw = self.store.list_range(&self.key, start, stop).await?;
        Ok(raw.iter().map(|bytes| T::from_bytes(bytes)).collect())
    }

    /// Push element to the right (end) of the list
    pub async fn push_right(&self, value: &T) -> CacheResult<usize> {
        self.store.list_push(&self.key, value.to_bytes()?).await
    }

    /// Remove elements equal to `value`, see [`CacheStore::list_remove`]
    pub async fn remove(&self, value: &T, count: isize) -> CacheResult<usize> {
        self.store
            .list_remove(&self.key, value.to_bytes()?, count)
            .await
    }

    /// Drop every copy of `value` and of the `stale` values, then append
    /// `value`, as one atomic step.
    pub async fn replace(&self, value: &T, stale: &[T]) -> CacheResult<()> {
        let stale = stale
            .iter()
            .map(CacheValue::to_bytes)
            .collect::<CacheResult<Vec<Bytes>>>()?;
        self.store
            .list_replace(&self.key, &stale, value.to_bytes()?)
            .await
    }
}
