use std::ops::{Deref, DerefMut};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// The unified trait for all cacheable values
pub trait CacheValue: Sized + Send + Sync {
    /// Serialize to the bytes stored under a key or list element
    fn to_bytes(&self) -> CacheResult<Bytes>;

    /// Deserialize from bytes
    fn from_bytes(bytes: &[u8]) -> CacheResult<Self>;
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Serialization failed: {0}")]
    Serialization(String),
    #[error("Deserialization failed: {0}")]
    Deserialization(String),
    #[error("Cache unavailable: {0}")]
    Unavailable(String),
    #[error("Key {0} holds a value of another kind")]
    WrongType(String),
    #[error("Invalid cache configuration: {0}")]
    Config(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        match err.kind() {
            redis::ErrorKind::TypeError => Self::WrongType(err.to_string()),
            _ => Self::Unavailable(err.to_string()),
        }
    }
}

impl From<deadpool_redis::PoolError> for CacheError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// JSON-encoded value. Field order follows the struct definition, so equal
/// values always encode to identical bytes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    pub fn new(value: T) -> Self { Self(value) }

    pub fn inner(self) -> T { self.0 }

    pub fn as_inner(&self) -> &T { &self.0 }
}

impl<T> Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target { &self.0 }
}

impl<T> DerefMut for Json<T> {
    fn deref_mut(&mut self) -> &mut Self::Target { &mut self.0 }
}

impl<T> From<T> for Json<T> {
    fn from(value: T) -> Self { Json(value) }
}

impl<T> CacheValue for Json<T>
where
    T: Serialize + for<'de> Deserialize<'de> + Send + Sync,
{
    fn to_bytes(&self) -> CacheResult<Bytes> {
        serde_json::to_vec(&self.0)
            .map(Bytes::from)
            .map_err(|e| CacheError::Serialization(e.to_string()))
    }

    fn from_bytes(bytes: &[u8]) -> CacheResult<Self> {
        serde_json::from_slice(bytes)
            .map(Json)
            .map_err(|e| CacheError::Deserialization(e.to_string()))
    }
}

/// Plain UTF-8 string stored without any envelope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Primitive<T>(pub T);

impl<T> Primitive<T> {
    pub fn new(value: T) -> Self { Self(value) }

    pub fn inner(self) -> T { self.0 }
}

impl CacheValue for Primitive<String> {
    fn to_bytes(&self) -> CacheResult<Bytes> {
        Ok(Bytes::copy_from_slice(self.0.as_bytes()))
    }

    fn from_bytes(bytes: &[u8]) -> CacheResult<Self> {
        String::from_utf8(bytes.to_vec())
            .map(Primitive)
            .map_err(|e| CacheError::Deserialization(e.to_string()))
    }
}
