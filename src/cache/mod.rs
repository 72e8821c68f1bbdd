//! Keyed, asynchronous, deduplicating entity caches.
//!
//! [`EntityCache`] is a process-lifetime memo table from key to mirror-node
//! payload. Concurrent lookups for the same key are coalesced into a single
//! load by storing the in-flight future in the table before the first await
//! point. `Ok(None)` from a loader is the confirmed-absent sentinel and is
//! memoized like any other value; a failed load is never memoized, so the
//! next lookup retries from scratch.

pub mod entities;
pub mod lookup;

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};

pub use entities::Caches;
pub use lookup::{
    composite_key, make_composite_lookup, make_lookup, split_composite, EntityLookup,
    LookupState, COMPOSITE_SEPARATOR,
};

/// Performs the actual fetch for a cache. `Ok(None)` means the entity is
/// confirmed absent (e.g. the mirror node answered 404); errors are transport
/// failures and must not be used to signal absence.
#[async_trait]
pub trait EntityLoader<K, V>: Send + Sync {
    async fn load(&self, key: &K) -> Result<Option<V>>;
}

/// Cloneable load failure, shared by every caller awaiting the same key.
#[derive(Clone)]
pub struct LoadError(Arc<anyhow::Error>);

impl LoadError {
    pub fn inner(&self) -> &anyhow::Error {
        &self.0
    }
}

impl From<anyhow::Error> for LoadError {
    fn from(err: anyhow::Error) -> Self {
        Self(Arc::new(err))
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Debug for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for LoadError {}

type LoadFuture<V> = Shared<BoxFuture<'static, Result<Option<V>, LoadError>>>;

enum Entry<V> {
    /// Terminal: loaded value, or confirmed absent.
    Ready(Option<V>),
    /// A load is in flight; later lookups for the key await this future.
    Pending(LoadFuture<V>),
}

pub struct EntityCache<K, V> {
    name: &'static str,
    loader: Arc<dyn EntityLoader<K, V>>,
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K, V> EntityCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str, loader: Arc<dyn EntityLoader<K, V>>) -> Arc<Self> {
        Arc::new(Self {
            name,
            loader,
            entries: Mutex::new(HashMap::new()),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the memoized value for `key`, loading it on first use.
    ///
    /// Concurrent callers for the same key observe exactly one underlying
    /// load. A rejected load propagates to every waiting caller and leaves
    /// the key unmemoized.
    pub async fn lookup(&self, key: K) -> Result<Option<V>, LoadError> {
        let fut = {
            let mut entries = self.entries.lock().expect("cache lock");
            match entries.get(&key) {
                Some(Entry::Ready(value)) => return Ok(value.clone()),
                Some(Entry::Pending(fut)) => fut.clone(),
                None => {
                    let fut = self.make_load_future(key.clone());
                    entries.insert(key.clone(), Entry::Pending(fut.clone()));
                    fut
                }
            }
        };
        self.resolve(key, fut).await
    }

    /// Like [`lookup`](Self::lookup), but discards a terminal entry first so
    /// the value is re-fetched. An in-flight load is still coalesced, never
    /// duplicated. Used by pollers that would otherwise pin a memoized
    /// "absent" answer forever.
    pub async fn refresh(&self, key: K) -> Result<Option<V>, LoadError> {
        {
            let mut entries = self.entries.lock().expect("cache lock");
            if let Some(Entry::Ready(_)) = entries.get(&key) {
                entries.remove(&key);
            }
        }
        self.lookup(key).await
    }

    /// Stores a terminal entry directly, without a load. Lets one cache
    /// populate another when a payload carries a second identity (e.g. a
    /// contract fetched by EVM address also known by contract id).
    pub fn prime(&self, key: K, value: Option<V>) {
        let mut entries = self.entries.lock().expect("cache lock");
        entries.insert(key, Entry::Ready(value));
    }

    /// True iff a terminal (non-pending) entry exists for `key`.
    pub fn contains(&self, key: &K) -> bool {
        let entries = self.entries.lock().expect("cache lock");
        matches!(entries.get(key), Some(Entry::Ready(_)))
    }

    /// True iff the cache holds no entries at all, pending ones included.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().expect("cache lock").is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache lock").len()
    }

    /// Evicts every entry. In-flight loads resolve but no longer populate
    /// the table.
    pub fn clear(&self) {
        let mut entries = self.entries.lock().expect("cache lock");
        let evicted = entries.len();
        entries.clear();
        log::debug!("[cache] {} cleared ({evicted} entries)", self.name);
    }

    fn make_load_future(&self, key: K) -> LoadFuture<V> {
        let loader = Arc::clone(&self.loader);
        async move { loader.load(&key).await.map_err(LoadError::from) }
            .boxed()
            .shared()
    }

    async fn resolve(&self, key: K, fut: LoadFuture<V>) -> Result<Option<V>, LoadError> {
        let result = fut.clone().await;
        let mut entries = self.entries.lock().expect("cache lock");
        // Only transition the entry this lookup installed; a clear() or a
        // racing refresh may already have replaced it.
        let ours = matches!(
            entries.get(&key),
            Some(Entry::Pending(current)) if current.ptr_eq(&fut)
        );
        if ours {
            match &result {
                Ok(value) => {
                    entries.insert(key, Entry::Ready(value.clone()));
                }
                Err(e) => {
                    log::debug!("[cache] {} load failed for {key:?}: {e}", self.name);
                    entries.remove(&key);
                }
            }
        }
        result
    }
}

/// Type-erased handle so a registry can manage caches of different shapes.
pub trait CacheHandle: Send + Sync {
    fn name(&self) -> &'static str;
    fn clear(&self);
    fn is_empty(&self) -> bool;
}

impl<K, V> CacheHandle for EntityCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn clear(&self) {
        EntityCache::clear(self)
    }

    fn is_empty(&self) -> bool {
        EntityCache::is_empty(self)
    }
}

/// Explicitly constructed registry over every cache in a bundle. Cleared on
/// account or network switch and between tests.
#[derive(Default)]
pub struct CacheRegistry {
    caches: Mutex<Vec<Arc<dyn CacheHandle>>>,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, cache: Arc<dyn CacheHandle>) {
        self.caches.lock().expect("registry lock").push(cache);
    }

    pub fn clear_all(&self) {
        let caches = self.caches.lock().expect("registry lock");
        for cache in caches.iter() {
            cache.clear();
        }
        log::info!("[cache] registry cleared ({} caches)", caches.len());
    }

    pub fn all_empty(&self) -> bool {
        let caches = self.caches.lock().expect("registry lock");
        caches.iter().all(|c| c.is_empty())
    }
}
