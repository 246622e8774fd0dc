use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::trace;

use crate::domain::Pool;
use crate::error::Result;

/// Maps a trading-pair caption to pool metadata. `Ok(None)` means the
/// caption is unknown; the order is held and the miss reported.
#[async_trait]
pub trait PoolResolver: Send + Sync {
    async fn get_pool(&self, caption: &str) -> Result<Option<Pool>>;
}

/// TTL cache in front of a pool resolver.
///
/// Pool metadata moves slowly but can change between cycles, so the TTL must
/// not exceed one cycle interval: a stale entry then affects at most the
/// cycle it was fetched in. Misses are not cached.
pub struct CachedPoolResolver<R> {
    inner: R,
    ttl: Duration,
    cache: DashMap<String, (Instant, Arc<Pool>)>,
}

impl<R: PoolResolver> CachedPoolResolver<R> {
    pub fn new(inner: R, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cache: DashMap::new(),
        }
    }
}

#[async_trait]
impl<R: PoolResolver> PoolResolver for CachedPoolResolver<R> {
    async fn get_pool(&self, caption: &str) -> Result<Option<Pool>> {
        if let Some(entry) = self.cache.get(caption) {
            let (fetched_at, pool) = entry.value();
            if fetched_at.elapsed() < self.ttl {
                trace!(caption, "pool cache hit");
                return Ok(Some(pool.as_ref().clone()));
            }
        }

        let resolved = self.inner.get_pool(caption).await?;
        if let Some(pool) = &resolved {
            self.cache
                .insert(caption.to_string(), (Instant::now(), Arc::new(pool.clone())));
        } else {
            self.cache.remove(caption);
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Asset;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingResolver {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PoolResolver for CountingResolver {
        async fn get_pool(&self, caption: &str) -> Result<Option<Pool>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if caption == "known" {
                Ok(Some(Pool::new(
                    "known",
                    [Asset::Native, Asset::jetton("EQAbc")],
                    [9, 6],
                )))
            } else {
                Ok(None)
            }
        }
    }

    #[tokio::test]
    async fn caches_hits_within_ttl() {
        let resolver = CachedPoolResolver::new(
            CountingResolver { calls: AtomicUsize::new(0) },
            Duration::from_secs(60),
        );

        assert!(resolver.get_pool("known").await.unwrap().is_some());
        assert!(resolver.get_pool("known").await.unwrap().is_some());
        assert_eq!(resolver.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn misses_are_not_cached() {
        let resolver = CachedPoolResolver::new(
            CountingResolver { calls: AtomicUsize::new(0) },
            Duration::from_secs(60),
        );

        assert!(resolver.get_pool("missing").await.unwrap().is_none());
        assert!(resolver.get_pool("missing").await.unwrap().is_none());
        assert_eq!(resolver.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn expired_entries_are_refetched() {
        let resolver = CachedPoolResolver::new(
            CountingResolver { calls: AtomicUsize::new(0) },
            Duration::from_millis(0),
        );

        assert!(resolver.get_pool("known").await.unwrap().is_some());
        assert!(resolver.get_pool("known").await.unwrap().is_some());
        assert_eq!(resolver.inner.calls.load(Ordering::SeqCst), 2);
    }
}
