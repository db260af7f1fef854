//! Memoizing resolver, deduplicating concurrent fetches of the same DID

use std::{
    num::NonZeroUsize,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

use futures::future::{BoxFuture, FutureExt, Shared};
use lru::LruCache;
use serde::Deserialize;
use smart_default::SmartDefault;
use tokio::time::Instant;

use super::Resolver;
use crate::{
    driver::{DriverOptions, GeneratedDid, MethodDriver},
    error::{DidError, ResolverError, SharedDriverError},
    types::DidDocument,
};

/// Settings for the [`CachedResolver`] cache.
///
/// Deserializes from either snake_case or camelCase keys, e.g. `{"max": 10, "maxAge": 1000}`,
/// and from the environment with [`CacheOptions::from_env`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, SmartDefault)]
#[serde(default)]
pub struct CacheOptions {
    /// maximum number of entries, `0` for unbounded
    #[default = 100]
    pub max: usize,
    /// maximum age of an entry in milliseconds, `0` to never expire
    #[default = 5000]
    #[serde(alias = "maxAge")]
    pub max_age: u64,
    /// whether a cache hit restarts the entry's age
    #[serde(alias = "updateAgeOnGet")]
    pub update_age_on_get: bool,
}

impl CacheOptions {
    /// Environment variable prefix read by [`CacheOptions::from_env`]
    pub const ENV_PREFIX: &'static str = "DID_CACHE_";

    /// Load options from `DID_CACHE_MAX`, `DID_CACHE_MAX_AGE` and `DID_CACHE_UPDATE_AGE_ON_GET`,
    /// falling back to the defaults for unset variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed(Self::ENV_PREFIX).from_env::<Self>()
    }

    fn max_age(&self) -> Option<Duration> {
        (self.max_age > 0).then(|| Duration::from_millis(self.max_age))
    }
}

type Fetch = Shared<BoxFuture<'static, Result<DidDocument, SharedDriverError>>>;

struct CacheEntry {
    fetch: Fetch,
    /// when the fetch started, then when it settled
    inserted_at: Instant,
    /// set once the fetch succeeded; pending entries never expire
    settled: bool,
    generation: u64,
}

type Cache = Arc<Mutex<LruCache<String, CacheEntry>>>;

fn lock(cache: &Mutex<LruCache<String, CacheEntry>>) -> MutexGuard<'_, LruCache<String, CacheEntry>> {
    // entries stay consistent even if a holder panicked, nothing is left half-written
    cache.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drop the entry for `key`, unless it has since been replaced by a newer fetch.
fn evict_generation(cache: &Mutex<LruCache<String, CacheEntry>>, key: &str, generation: u64) {
    let mut cache = lock(cache);
    if cache.peek(key).map(|entry| entry.generation) == Some(generation) {
        cache.pop(key);
    }
}

/// Mark the entry for `key` as settled now, unless it has since been replaced by a newer fetch.
fn settle_generation(cache: &Mutex<LruCache<String, CacheEntry>>, key: &str, generation: u64) {
    let mut cache = lock(cache);
    if let Some(entry) = cache.peek_mut(key) {
        if entry.generation == generation {
            entry.inserted_at = Instant::now();
            entry.settled = true;
        }
    }
}

/// A [`Resolver`] with a bounded, time-limited cache in front of `get`.
///
/// At most one fetch per key is in flight: the pending result is cached as soon as the fetch
/// starts and every caller asking for the same key meanwhile awaits that same fetch. Fetches are
/// spawned onto the Tokio runtime and run to completion even if every caller goes away. A
/// failed fetch is dropped from the cache so the next caller retries; callers already waiting on
/// it all receive its error. An entry's age counts from when its fetch succeeded.
///
/// `generate`, `update` and `register` are never cached.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// # use async_trait::async_trait;
/// # use lib_didresolver::{DriverOptions, GeneratedDid, MethodDriver, types::DidDocument, error::DriverError};
/// # struct ExampleDriver;
/// # #[async_trait]
/// # impl MethodDriver for ExampleDriver {
/// #     fn method(&self) -> &str { "example" }
/// #     async fn get(&self, did: &str, _: &DriverOptions) -> Result<DidDocument, DriverError> {
/// #         Ok(DidDocument::new(did)?)
/// #     }
/// #     async fn generate(&self, _: &DriverOptions) -> Result<GeneratedDid, DriverError> { unimplemented!() }
/// #     async fn update(&self, _: &DidDocument, _: &DriverOptions) -> Result<serde_json::Value, DriverError> { unimplemented!() }
/// #     async fn register(&self, _: &DidDocument, _: &DriverOptions) -> Result<serde_json::Value, DriverError> { unimplemented!() }
/// # }
/// use lib_didresolver::{CacheOptions, CachedResolver};
///
/// # tokio_test::block_on(async {
/// let mut resolver = CachedResolver::new(CacheOptions { max: 10, ..Default::default() });
/// resolver.use_driver(Arc::new(ExampleDriver));
///
/// let document = resolver.get("did:example:123", &Default::default()).await.unwrap();
/// assert_eq!(document.id(), "did:example:123");
/// # })
/// ```
pub struct CachedResolver {
    resolver: Resolver,
    cache: Cache,
    options: CacheOptions,
    generation: AtomicU64,
}

impl Default for CachedResolver {
    fn default() -> Self {
        Self::new(CacheOptions::default())
    }
}

impl CachedResolver {
    pub fn new(options: CacheOptions) -> Self {
        Self::with_resolver(Resolver::new(), options)
    }

    /// Put a cache in front of an already assembled [`Resolver`].
    pub fn with_resolver(resolver: Resolver, options: CacheOptions) -> Self {
        let cache = match NonZeroUsize::new(options.max) {
            Some(max) => LruCache::new(max),
            None => LruCache::unbounded(),
        };
        log::debug!(
            "DID cache initialized, max={} max_age={}ms update_age_on_get={}",
            options.max,
            options.max_age,
            options.update_age_on_get
        );
        Self {
            resolver,
            cache: Arc::new(Mutex::new(cache)),
            options,
            generation: AtomicU64::new(0),
        }
    }

    /// Register `driver` under the method it reports with [`MethodDriver::method`].
    pub fn use_driver(&mut self, driver: Arc<dyn MethodDriver>) {
        let method = driver.method().to_string();
        self.resolver.use_driver(method, driver);
    }

    /// The underlying registry
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Resolve `did`, from the cache when possible.
    ///
    /// The key is the literal string given, so a DID and one of its DID URLs are cached apart.
    ///
    /// # Errors
    /// A cache miss outside of a Tokio runtime returns [`ResolverError::NoRuntime`].
    pub async fn get(
        &self,
        did: &str,
        options: &DriverOptions,
    ) -> Result<DidDocument, ResolverError> {
        if did.is_empty() {
            return Err(DidError::Empty.into());
        }
        let driver = Arc::clone(self.resolver.driver_for_did(did)?);
        self.memoize(did, driver, options)?
            .await
            .map_err(ResolverError::Driver)
    }

    /// Alias of [`CachedResolver::get`] for DID URLs such as key ids.
    pub async fn get_url(
        &self,
        url: &str,
        options: &DriverOptions,
    ) -> Result<DidDocument, ResolverError> {
        self.get(url, options).await
    }

    fn memoize(
        &self,
        key: &str,
        driver: Arc<dyn MethodDriver>,
        options: &DriverOptions,
    ) -> Result<Fetch, ResolverError> {
        let mut cache = lock(&self.cache);
        let now = Instant::now();

        if let Some(entry) = cache.get_mut(key) {
            let expired = entry.settled
                && self
                    .options
                    .max_age()
                    .is_some_and(|max_age| now.duration_since(entry.inserted_at) > max_age);
            if !expired {
                log::trace!("Cache hit for {key}");
                if entry.settled && self.options.update_age_on_get {
                    entry.inserted_at = now;
                }
                return Ok(entry.fetch.clone());
            }
            log::debug!("Cache entry for {key} expired");
            cache.pop(key);
        }

        let runtime = tokio::runtime::Handle::try_current()?;
        log::trace!("Cache miss for {key}, fetching with the `{}` driver", driver.method());
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let task = {
            let cache = Arc::clone(&self.cache);
            let key = key.to_string();
            let options = options.clone();
            runtime.spawn(async move {
                let result = driver.get(&key, &options).await.map_err(SharedDriverError::from);
                match &result {
                    Ok(_) => settle_generation(&cache, &key, generation),
                    Err(e) => {
                        log::warn!("Fetching {key} failed, not caching: {e}");
                        evict_generation(&cache, &key, generation);
                    }
                }
                result
            })
        };

        let fetch = {
            let cache = Arc::clone(&self.cache);
            let key = key.to_string();
            async move {
                match task.await {
                    Ok(result) => result,
                    Err(join_error) => {
                        evict_generation(&cache, &key, generation);
                        Err(Arc::new(join_error) as SharedDriverError)
                    }
                }
            }
            .boxed()
            .shared()
        };

        cache.put(
            key.to_string(),
            CacheEntry {
                fetch: fetch.clone(),
                inserted_at: now,
                settled: false,
                generation,
            },
        );
        Ok(fetch)
    }

    /// Drop the cached result for `key`, whether settled or in flight.
    pub fn evict(&self, key: &str) -> bool {
        lock(&self.cache).pop(key).is_some()
    }

    /// Drop every cached result.
    pub fn clear(&self) {
        lock(&self.cache).clear();
    }

    /// Number of cached entries, including in-flight fetches and entries that have expired but
    /// not yet been looked up again.
    pub fn len(&self) -> usize {
        lock(&self.cache).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Generate a new DID; never cached.
    pub async fn generate(
        &self,
        method: &str,
        options: &DriverOptions,
    ) -> Result<GeneratedDid, ResolverError> {
        self.resolver.generate(method, options).await
    }

    /// Commit an edited document; never cached.
    pub async fn update(
        &self,
        document: &DidDocument,
        options: &DriverOptions,
    ) -> Result<serde_json::Value, ResolverError> {
        self.resolver.update(document, options).await
    }

    /// Register a new document; never cached.
    pub async fn register(
        &self,
        document: &DidDocument,
        options: &DriverOptions,
    ) -> Result<serde_json::Value, ResolverError> {
        self.resolver.register(document, options).await
    }
}
