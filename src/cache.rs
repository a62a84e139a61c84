//! Category-keyed menu listing cache.
//!
//! Listings are never expired by time. Each namespace carries a generation counter and
//! each category a version counter; both are part of the read key, so bumping either one
//! makes every older entry unreachable. A reader that loaded a pre-write snapshot can
//! only store it under a key nobody will read again.

use std::{future::Future, sync::Arc};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),
    #[error("cache payload error")]
    Codec(#[from] serde_json::Error),
}

/// Key/value backend with atomic counters.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set(&self, key: &str, value: String) -> Result<(), CacheError>;
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
    /// Removes every entry whose key starts with `prefix`, returning how many went.
    async fn delete_prefix(&self, prefix: &str) -> Result<u64, CacheError>;
    /// Current value of a counter, 0 when it was never incremented.
    async fn counter(&self, key: &str) -> Result<u64, CacheError>;
    /// Atomically increments a counter and returns the new value.
    async fn incr(&self, key: &str) -> Result<u64, CacheError>;
}

#[derive(Debug, Default)]
pub struct InMemoryCacheStore {
    entries: DashMap<String, String>,
    counters: DashMap<String, u64>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(prefix));
        Ok(before.saturating_sub(self.entries.len()) as u64)
    }

    async fn counter(&self, key: &str) -> Result<u64, CacheError> {
        Ok(self.counters.get(key).map(|v| *v).unwrap_or(0))
    }

    async fn incr(&self, key: &str) -> Result<u64, CacheError> {
        let mut entry = self.counters.entry(key.to_string()).or_insert(0);
        *entry += 1;
        Ok(*entry)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuNamespace {
    Dishes,
    Setmeals,
}

impl MenuNamespace {
    fn prefix(self) -> &'static str {
        match self {
            MenuNamespace::Dishes => "dish",
            MenuNamespace::Setmeals => "setmeal",
        }
    }

    fn generation_key(self) -> String {
        format!("{}:generation", self.prefix())
    }

    fn version_key(self, category_id: Uuid) -> String {
        format!("{}:version:{}", self.prefix(), category_id)
    }
}

#[derive(Clone)]
pub struct MenuCache {
    store: Arc<dyn CacheStore>,
}

impl MenuCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    pub async fn listing_key(
        &self,
        namespace: MenuNamespace,
        category_id: Uuid,
    ) -> Result<String, CacheError> {
        let generation = self.store.counter(&namespace.generation_key()).await?;
        let version = self
            .store
            .counter(&namespace.version_key(category_id))
            .await?;
        Ok(listing_key(namespace, generation, category_id, version))
    }

    /// Returns the cached listing, or loads it and caches it when non-empty.
    ///
    /// Cache failures never reach the caller; the loader is the fallback.
    pub async fn read_through<T, E, F, Fut>(
        &self,
        namespace: MenuNamespace,
        category_id: Uuid,
        load: F,
    ) -> Result<Vec<T>, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
    {
        let key = match self.listing_key(namespace, category_id).await {
            Ok(key) => Some(key),
            Err(err) => {
                tracing::debug!(error = %err, "menu cache key lookup failed, reading store");
                None
            }
        };

        if let Some(key) = key.as_deref() {
            match self.lookup::<T>(key).await {
                Ok(Some(items)) if !items.is_empty() => {
                    tracing::debug!(key, "menu cache hit");
                    return Ok(items);
                }
                Ok(_) => {}
                Err(err) => tracing::debug!(key, error = %err, "menu cache read failed"),
            }
        }

        let items = load().await?;

        if let Some(key) = key.as_deref() {
            if !items.is_empty() {
                if let Err(err) = self.populate(key, &items).await {
                    tracing::debug!(key, error = %err, "menu cache populate failed");
                }
            }
        }

        Ok(items)
    }

    /// Call only after the write that changed the category has committed.
    pub async fn invalidate_category(&self, namespace: MenuNamespace, category_id: Uuid) {
        match self.store.incr(&namespace.version_key(category_id)).await {
            Ok(version) => self.reclaim(namespace, category_id, version - 1).await,
            Err(err) => tracing::warn!(
                namespace = namespace.prefix(),
                category_id = %category_id,
                error = %err,
                "menu cache invalidation failed, listing may be stale until the next change"
            ),
        }
    }

    /// Best effort removal of the entry a version bump just orphaned.
    async fn reclaim(&self, namespace: MenuNamespace, category_id: Uuid, old_version: u64) {
        let Ok(generation) = self.store.counter(&namespace.generation_key()).await else {
            return;
        };
        let old_key = listing_key(namespace, generation, category_id, old_version);
        if let Err(err) = self.store.delete(&old_key).await {
            tracing::debug!(key = %old_key, error = %err, "menu cache reclaim failed");
        }
    }

    /// Drops every listing of the namespace at once.
    ///
    /// Entries of the previous generation are removed afterwards. A reader that
    /// loaded before the bump may still store one entry under an old key; it is
    /// never read and goes with the next namespace invalidation.
    pub async fn invalidate_namespace(&self, namespace: MenuNamespace) {
        match self.store.incr(&namespace.generation_key()).await {
            Ok(generation) => {
                let old = format!("{}:{}:", namespace.prefix(), generation - 1);
                match self.store.delete_prefix(&old).await {
                    Ok(removed) => tracing::debug!(prefix = %old, removed, "menu cache generation reclaimed"),
                    Err(err) => tracing::debug!(prefix = %old, error = %err, "menu cache reclaim failed"),
                }
            }
            Err(err) => tracing::warn!(
                namespace = namespace.prefix(),
                error = %err,
                "menu cache namespace invalidation failed, listings may be stale until the next change"
            ),
        }
    }

    async fn lookup<T: DeserializeOwned>(&self, key: &str) -> Result<Option<Vec<T>>, CacheError> {
        match self.store.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn populate<T: Serialize>(&self, key: &str, items: &[T]) -> Result<(), CacheError> {
        let raw = serde_json::to_string(items)?;
        self.store.set(key, raw).await
    }
}

fn listing_key(namespace: MenuNamespace, generation: u64, category_id: Uuid, version: u64) -> String {
    format!(
        "{}:{}:{}:{}",
        namespace.prefix(),
        generation,
        category_id,
        version
    )
}
