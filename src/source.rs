//! Catalog lifecycle: where the item list for a request comes from.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::catalog::{CatalogError, CatalogExtractor, CatalogItem};

/// Shared, immutable catalog snapshot.
pub type Catalog = Arc<[CatalogItem]>;

/// Supplies the catalog for one pipeline run.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Returns the current catalog; an empty slice means no data is available.
    async fn load(&self) -> Result<Catalog, CatalogError>;
}

/// Scrapes the catalog page on every call.
#[derive(Clone)]
pub struct LiveCatalog {
    extractor: CatalogExtractor,
}

impl LiveCatalog {
    /// Wraps an extractor.
    pub fn new(extractor: CatalogExtractor) -> Self {
        Self { extractor }
    }
}

#[async_trait]
impl CatalogSource for LiveCatalog {
    async fn load(&self) -> Result<Catalog, CatalogError> {
        Ok(self.extractor.fetch().await.into())
    }
}

/// Fixed item list, e.g. parsed from a saved page.
#[derive(Clone)]
pub struct StaticCatalog {
    items: Catalog,
}

impl StaticCatalog {
    /// Serves `items` for every call.
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self {
            items: items.into(),
        }
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn load(&self) -> Result<Catalog, CatalogError> {
        Ok(Arc::clone(&self.items))
    }
}

struct Snapshot {
    items: Catalog,
    loaded_at: Instant,
}

/// Result of the most recent refresh, handed to callers that queued behind it.
struct Refresh {
    generation: u64,
    outcome: Result<Catalog, String>,
}

/// Serves a snapshot from `inner` until it is older than `ttl`, then refreshes.
///
/// Empty loads are returned but never stored, so an outage is retried on the
/// next request instead of pinning an empty catalog for a whole TTL. Only one
/// refresh runs at a time; callers that arrive while it is in flight receive
/// its result instead of starting their own.
pub struct CachedCatalog<S> {
    inner: S,
    ttl: Duration,
    snapshot: RwLock<Option<Snapshot>>,
    refresh: Mutex<Refresh>,
    generation: AtomicU64,
}

impl<S: CatalogSource> CachedCatalog<S> {
    /// Caches `inner` for `ttl`.
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            snapshot: RwLock::new(None),
            refresh: Mutex::new(Refresh {
                generation: 0,
                outcome: Ok(Catalog::from(Vec::new())),
            }),
            generation: AtomicU64::new(0),
        }
    }

    fn fresh(&self, snapshot: &Option<Snapshot>) -> Option<Catalog> {
        snapshot
            .as_ref()
            .filter(|snap| snap.loaded_at.elapsed() < self.ttl)
            .map(|snap| Arc::clone(&snap.items))
    }
}

#[async_trait]
impl<S: CatalogSource> CatalogSource for CachedCatalog<S> {
    async fn load(&self) -> Result<Catalog, CatalogError> {
        if let Some(items) = self.fresh(&*self.snapshot.read().await) {
            return Ok(items);
        }

        let seen = self.generation.load(Ordering::Acquire);
        let mut refresh = self.refresh.lock().await;
        if refresh.generation != seen {
            // A refresh finished while we queued; share its result.
            return refresh.outcome.clone().map_err(CatalogError::Refresh);
        }

        let loaded = self.inner.load().await;
        match &loaded {
            Ok(items) if items.is_empty() => debug!("catalog refresh returned no items"),
            Ok(items) => {
                info!(items = items.len(), ttl_secs = self.ttl.as_secs(), "catalog snapshot refreshed");
                *self.snapshot.write().await = Some(Snapshot {
                    items: Arc::clone(items),
                    loaded_at: Instant::now(),
                });
            }
            Err(err) => debug!(error = %err, "catalog refresh failed"),
        }

        refresh.generation += 1;
        refresh.outcome = match &loaded {
            Ok(items) => Ok(Arc::clone(items)),
            Err(err) => Err(err.to_string()),
        };
        self.generation.store(refresh.generation, Ordering::Release);
        loaded
    }
}
