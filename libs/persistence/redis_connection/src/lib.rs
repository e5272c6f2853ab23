use deadpool_redis::{Config, Pool, PoolConfig, Runtime};
pub use deadpool_redis::PoolError;
pub use redis::RedisError;
use tracing::{info, instrument};
use url::Url;

pub mod cache_aside;
pub mod config;
pub mod core;
pub mod macros;
pub mod memory;
pub mod redis_store;
pub mod types;

pub use cache_aside::{Source, Sourced};
pub use crate::core::{CacheError, CacheResult, CacheStore, Expiry};
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

/// Builds the `redis://host:port/db` url a pool connects to.
pub fn redis_url<C>(config: &C) -> CacheResult<Url>
where
    C: config::DbConnectConfig,
{
    let mut url = Url::parse(&format!("redis://{}", config.host()))
        .map_err(|e| CacheError::Config(e.to_string()))?;

    url.set_port(Some(config.port())).map_err(|_| {
        CacheError::Config(format!("cannot set port on {url}"))
    })?;
    if let Some(password) = config.password() {
        url.set_password(Some(password)).map_err(|_| {
            CacheError::Config("cannot set password on redis url".into())
        })?;
    }
    url.set_path(&format!("/{}", config.db()));

    Ok(url)
}

#[instrument(skip_all, name = "connect-redis")]
pub fn connect_redis_db<C>(config: &C) -> CacheResult<Pool>
where
    C: config::DbConnectConfig,
{
    let url = redis_url(config)?;

    info!(
        redis.host = config.host(),
        redis.port = config.port(),
        redis.db = config.db(),
        redis.connect = true
    );

    let mut cfg = Config::from_url(url.to_string());
    if let Some(max_conn) = config.max_conn() {
        cfg.pool = Some(PoolConfig::new(max_conn));
    }

    cfg.create_pool(Some(Runtime::Tokio1))
        .map_err(|e| CacheError::Config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RedisDbConfig;

    #[test]
    fn test_url_construction() {
        let config = RedisDbConfig {
            host: "localhost".to_string(),
            port: 6379,
            db: 0,
            ..Default::default()
        };

        let url = redis_url(&config).unwrap();

        assert_eq!(url.to_string(), "redis://localhost:6379/0");
    }

    #[test]
    fn test_url_carries_password_and_db() {
        let config = RedisDbConfig {
            host: "cache.internal".to_string(),
            port: 6380,
            db: 3,
            password: Some("secret".to_string()),
            max_conn: None,
        };

        let url = redis_url(&config).unwrap();

        assert_eq!(url.to_string(), "redis://:secret@cache.internal:6380/3");
    }

    #[test]
    fn test_redis_db_config_default() {
        let json = r#"{}"#;
        let config: RedisDbConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 6379);
        assert_eq!(config.db, 0);
        assert!(config.password.is_none());
    }
}
