pub use config::{DbConnectConfig, DbOptionsConfig, PostgresDbConfig};
pub use connect::{PoolStatus, SqlConnect, build_pool, connect_postgres_db};
pub use deadpool_postgres::PoolError;
pub use tokio_postgres::Error as PgError;

pub mod config;
mod connect;
