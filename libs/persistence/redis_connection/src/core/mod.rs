pub mod key;
pub mod store;
pub mod type_bind;
pub mod value;

// Re-export commonly used items
pub use key::{CacheKey, CacheKeyArg1, CacheKeyAutoConstruct};
pub use store::{CacheStore, Expiry};
pub use type_bind::{CacheTypeBind, CacheTypeTrait};
pub use value::{CacheError, CacheResult, CacheValue, Json, Primitive};
