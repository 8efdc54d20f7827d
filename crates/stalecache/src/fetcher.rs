//! Origin fetchers.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use stalecache_core::BoxError;

type FetchFn<K, V> = dyn Fn(K) -> BoxFuture<'static, Result<V, BoxError>> + Send + Sync;

/// Loads a value from its origin when the cache cannot serve it.
///
/// Cloning is cheap and shares the underlying closure.
///
/// ```
/// use stalecache::Fetcher;
///
/// let fetcher: Fetcher<u64, String> = Fetcher::new(|id| async move {
///     Ok::<_, std::io::Error>(format!("order {}", id))
/// });
/// ```
pub struct Fetcher<K, V> {
    f: Arc<FetchFn<K, V>>,
}

impl<K: 'static, V: 'static> Fetcher<K, V> {
    /// Wraps an async closure.
    pub fn new<F, Fut, E>(f: F) -> Self
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        Self {
            f: Arc::new(move |key| f(key).map(|r| r.map_err(Into::into)).boxed()),
        }
    }

    /// Runs the fetcher once.
    pub async fn fetch(&self, key: K) -> Result<V, BoxError> {
        (self.f)(key).await
    }
}

impl<K, V> Clone for Fetcher<K, V> {
    fn clone(&self) -> Self {
        Self {
            f: Arc::clone(&self.f),
        }
    }
}

impl<K, V> fmt::Debug for Fetcher<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fetcher").finish_non_exhaustive()
    }
}
