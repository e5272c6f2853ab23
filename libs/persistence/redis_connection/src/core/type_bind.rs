use std::{borrow::Cow, sync::Arc};

use super::{
    key::{CacheKey, CacheKeyArg1, CacheKeyAutoConstruct},
    store::CacheStore,
};

/// A typed handle over one cache key.
pub trait CacheTypeTrait: Sized {
    fn from_store_and_key(
        store: Arc<dyn CacheStore>, key: Cow<'static, str>,
    ) -> Self;
}

pub trait CacheTypeBind: CacheKey {
    type CacheType: CacheTypeTrait;

    /// Construct a cache type binding, when key construction requires 2 or
    /// more parameters
    fn bind_with_args(
        &self, store: Arc<dyn CacheStore>, args: <Self as CacheKey>::Args<'_>,
    ) -> Self::CacheType {
        let key = CacheKey::get_key_with_args(self, args);
        CacheTypeTrait::from_store_and_key(store, key)
    }

    /// Construct a cache type binding, when key construction requires a
    /// parameter
    fn bind_with(
        &self, store: Arc<dyn CacheStore>,
        arg: <<Self as CacheKey>::Args<'_> as CacheKeyArg1>::Arg0,
    ) -> Self::CacheType
    where
        for<'r> <Self as CacheKey>::Args<'r>: CacheKeyArg1,
    {
        CacheTypeBind::bind_with_args(
            self,
            store,
            <<Self as CacheKey>::Args<'_> as CacheKeyArg1>::construct(arg),
        )
    }

    /// Construct a cache type binding, when key construction does not
    /// require any parameters
    fn bind(&self, store: Arc<dyn CacheStore>) -> Self::CacheType
    where
        for<'r> <Self as CacheKey>::Args<'r>: CacheKeyAutoConstruct,
    {
        CacheTypeBind::bind_with_args(
            self,
            store,
            CacheKeyAutoConstruct::construct(),
        )
    }
}
