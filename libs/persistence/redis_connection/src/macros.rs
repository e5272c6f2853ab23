/// Declares a typed cache key.
///
/// ```ignore
/// cache_key!(TheaterNameKey::<Primitive<String>> => "theater:{}"[theater_id: i32]);
/// cache_key!(list SalesKey::<Json<Sale>> => "sales_date:{}"[date: NaiveDate]);
/// ```
#[macro_export]
macro_rules! cache_key {
    (list $name:ident::<$t:ty> => $format_key:literal[$($arg:ident:$ty:ty),*]) => {
        #[doc=concat!(concat!("Cache List type binding \n ## Key \n", $format_key), concat!("\n ## Value Type \n ", stringify!($t)))]
        pub struct $name;

        impl $crate::core::key::CacheKey for $name {
            type Args<'r> = ($(&'r $ty,)*);

            fn get_key_with_args(&self, args: Self::Args<'_>) -> std::borrow::Cow<'static, str> {
                let ($($arg,)*) = args;

                (format!($format_key, $($arg),*)).into()
            }
        }

        impl $crate::core::type_bind::CacheTypeBind for $name {
            type CacheType = $crate::types::list::List<$t>;
        }
    };
    (list $name:ident::<$t:ty> => $key:literal) => {
        #[doc=concat!(concat!("Cache List type binding\n ## Key \n", $key), concat!("\n ## Value Type \n ", stringify!($t)))]
        pub struct $name;

        impl $crate::core::key::CacheKey for $name {
            type Args<'r> = ();

            fn get_key_with_args(&self, _: Self::Args<'_>) -> std::borrow::Cow<'static, str> {
                ($key).into()
            }
        }

        impl $crate::core::type_bind::CacheTypeBind for $name {
            type CacheType = $crate::types::list::List<$t>;
        }
    };
    ($name:ident::<$t:ty> => $format_key:literal[$($arg:ident:$ty:ty),*]) => {
        #[doc=concat!(concat!("Cache common type binding\n ## Key \n", $format_key), concat!("\n ## Value Type \n ", stringify!($t)))]
        pub struct $name;

        impl $crate::core::key::CacheKey for $name {
            type Args<'r> = ($(&'r $ty,)*);

            fn get_key_with_args(&self, args: Self::Args<'_>) -> std::borrow::Cow<'static, str> {
                let ($($arg,)*) = args;

                (format!($format_key, $($arg),*)).into()
            }
        }

        impl $crate::core::type_bind::CacheTypeBind for $name {
            type CacheType = $crate::types::normal::Normal<$t>;
        }
    };
    ($name:ident::<$t:ty> => $key:literal) => {
        #[doc=concat!(concat!("Cache common type binding\n ## Key \n", $key), concat!("\n ## Value Type \n ", stringify!($t)))]
        pub struct $name;

        impl $crate::core::key::CacheKey for $name {
            type Args<'r> = ();

            fn get_key_with_args(&self, _: Self::Args<'_>) -> std::borrow::Cow<'static, str> {
                ($key).into()
            }
        }

        impl $crate::core::type_bind::CacheTypeBind for $name {
            type CacheType = $crate::types::normal::Normal<$t>;
        }
    };
}
