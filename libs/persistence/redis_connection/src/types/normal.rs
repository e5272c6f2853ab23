use std::{borrow::Cow, marker::PhantomData, sync::Arc};

use crate::core::{
    CacheResult, CacheStore, CacheTypeTrait, CacheValue, Expiry,
};

/// A single value stored under one key.
pub struct Normal<T> {
    store: Arc<dyn CacheStore>,
    key: Cow<'static, str>,
    __phantom: PhantomData<T>,
}

impl<T> CacheTypeTrait for Normal<T> {
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

impl<T> Normal<T>
where
    T: CacheValue,
{
    pub fn key(&self) -> &str { &self.key }

    /// Determine whether the current value exists
    pub async fn exists(&self) -> CacheResult<bool> {
        self.store.exists(&self.key).await
    }

    /// Write current value with the given expiry
    pub async fn set(&self, value: &T, expiry: Expiry) -> CacheResult<()> {
        self.store.set(&self.key, value.to_bytes()?, expiry).await
    }

    /// When the value does not exist, write a durable value
    pub async fn set_if_not_exist(&self, value: &T) -> CacheResult<bool> {
        self.store.set_if_absent(&self.key, value.to_bytes()?).await
    }

    /// Try to get the value, if it does not exist, return [`None`]
    pub async fn try_get(&self) -> CacheResult<Option<T>> {
        match self.store.get(&self.key).await? {
            Some(bytes) => T::from_bytes(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Delete value
    pub async fn remove(&self) -> CacheResult<bool> {
        self.store.remove(&self.key).await
    }
}
