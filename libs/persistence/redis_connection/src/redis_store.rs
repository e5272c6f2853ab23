use async_trait::async_trait;
use bytes::Bytes;
use deadpool_redis::{Connection, Pool};
use redis::AsyncCommands;

use crate::core::{CacheResult, CacheStore, Expiry};

/// Cache store over a deadpool Redis pool.
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool,
}

impl RedisStore {
    pub fn new(pool: Pool) -> Self { Self { pool } }

    pub fn pool(&self) -> &Pool { &self.pool }

    async fn conn(&self) -> CacheResult<Connection> {
        Ok(self.pool.get().await?)
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> CacheResult<Option<Bytes>> {
        let mut conn = self.conn().await?;
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value.map(Bytes::from))
    }

    async fn set(
        &self, key: &str, value: Bytes, expiry: Expiry,
    ) -> CacheResult<()> {
        let mut conn = self.conn().await?;
        match expiry {
            Expiry::Never => {
                let _: () = conn.set(key, value.as_ref()).await?;
            }
            Expiry::After(ttl) => {
                // SETEX rejects zero seconds
                let secs = ttl.as_secs().max(1);
                let _: () = conn.set_ex(key, value.as_ref(), secs).await?;
            }
        }
        Ok(())
    }

    async fn set_if_absent(
        &self, key: &str, value: Bytes,
    ) -> CacheResult<bool> {
        let mut conn = self.conn().await?;
        let written: bool = conn.set_nx(key, value.as_ref()).await?;
        Ok(written)
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.conn().await?;
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }

    async fn remove(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.conn().await?;
        let count: u32 = conn.del(key).await?;
        Ok(count > 0)
    }

    async fn list_range(
        &self, key: &str, start: isize, stop: isize,
    ) -> CacheResult<Vec<Bytes>> {
        let mut conn = self.conn().await?;
        let items: Vec<Vec<u8>> = conn.lrange(key, start, stop).await?;
        Ok(items.into_iter().map(Bytes::from).collect())
    }

    async fn list_push(&self, key: &str, value: Bytes) -> CacheResult<usize> {
        let mut conn = self.conn().await?;
        let len: usize = conn.rpush(key, value.as_ref()).await?;
        Ok(len)
    }

    async fn list_remove(
        &self, key: &str, value: Bytes, count: isize,
    ) -> CacheResult<usize> {
        let mut conn = self.conn().await?;
        let removed: usize = conn.lrem(key, count, value.as_ref()).await?;
        Ok(removed)
    }

    async fn list_replace(
        &self, key: &str, stale: &[Bytes], value: Bytes,
    ) -> CacheResult<()> {
        let mut conn = self.conn().await?;

        let mut pipe = redis::pipe();
        pipe.atomic();
        for old in stale {
            pipe.lrem(key, 0, old.as_ref()).ignore();
        }
        pipe.lrem(key, 0, value.as_ref())
            .ignore()
            .rpush(key, value.as_ref())
            .ignore();

        pipe.query_async::<()>(&mut conn).await?;
        Ok(())
    }
}
