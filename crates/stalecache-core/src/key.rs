//! Cache key normalization.
//!
//! Drivers address items by a plain string. A key type picks its string form
//! at compile time, in order of preference:
//!
//! 1. its own [`CacheKey`] implementation (explicit key),
//! 2. the string itself for `str`/`String`,
//! 3. its `Display` text, through [`DisplayKey`] or [`impl_display_key!`],
//! 4. its `Debug` text, through [`DebugKey`], as the generic fallback.
//!
//! [`impl_display_key!`]: crate::impl_display_key

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// A value that produces a stable, idempotent cache key.
///
/// # Examples
///
/// ```
/// use stalecache_core::CacheKey;
///
/// struct OrderId {
///     tenant: String,
///     id: u64,
/// }
///
/// impl CacheKey for OrderId {
///     fn cache_key(&self) -> String {
///         format!("{}:{}", self.tenant, self.id)
///     }
/// }
///
/// let key = OrderId { tenant: "acme".into(), id: 7 };
/// assert_eq!(key.cache_key(), "acme:7");
/// ```
pub trait CacheKey {
    /// Returns the normalized key string.
    fn cache_key(&self) -> String;
}

impl CacheKey for str {
    fn cache_key(&self) -> String {
        self.to_owned()
    }
}

impl CacheKey for String {
    fn cache_key(&self) -> String {
        self.clone()
    }
}

impl CacheKey for Cow<'_, str> {
    fn cache_key(&self) -> String {
        self.as_ref().to_owned()
    }
}

impl<T: CacheKey + ?Sized> CacheKey for &T {
    fn cache_key(&self) -> String {
        (**self).cache_key()
    }
}

impl<T: CacheKey + ?Sized> CacheKey for Box<T> {
    fn cache_key(&self) -> String {
        (**self).cache_key()
    }
}

impl<T: CacheKey + ?Sized> CacheKey for Arc<T> {
    fn cache_key(&self) -> String {
        (**self).cache_key()
    }
}

impl<T: CacheKey + ?Sized> CacheKey for Rc<T> {
    fn cache_key(&self) -> String {
        (**self).cache_key()
    }
}

/// Implements [`CacheKey`] for types whose `Display` output is their key.
///
/// ```
/// use stalecache_core::{CacheKey, impl_display_key};
/// use std::fmt;
///
/// struct Sku(u32);
///
/// impl fmt::Display for Sku {
///     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         write!(f, "sku-{}", self.0)
///     }
/// }
///
/// impl_display_key!(Sku);
///
/// assert_eq!(Sku(9).cache_key(), "sku-9");
/// ```
#[macro_export]
macro_rules! impl_display_key {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::CacheKey for $ty {
                fn cache_key(&self) -> ::std::string::String {
                    ::std::string::ToString::to_string(self)
                }
            }
        )+
    };
}

impl_display_key!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize
);

/// Adapts any `Display` value into a cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DisplayKey<T>(pub T);

impl<T: fmt::Display> CacheKey for DisplayKey<T> {
    fn cache_key(&self) -> String {
        self.0.to_string()
    }
}

/// Generic fallback: uses the `Debug` representation as the key.
///
/// Only stable if the `Debug` output is deterministic (no hash-ordered
/// collections, no addresses).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DebugKey<T>(pub T);

impl<T: fmt::Debug> CacheKey for DebugKey<T> {
    fn cache_key(&self) -> String {
        format!("{:?}", self.0)
    }
}
