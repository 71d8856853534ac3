use super::key::NO_CACHE_PARAM;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Cache settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether responses are cached at all
    pub enabled: bool,
    /// TTL applied when a caller passes a zero TTL
    pub default_ttl_secs: u64,
    /// Maximum number of entries; `0` means unbounded
    pub capacity: usize,
    /// How often the background sweep removes expired entries; `0` disables it
    pub sweep_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_ttl_secs: 300,
            capacity: 1000,
            sweep_interval_secs: 60,
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Per-request cache behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
    /// False when caching is disabled globally or bypassed by `no-cache`
    pub enabled: bool,
    pub ttl: Duration,
}

impl CacheOptions {
    /// Any `no-cache` parameter bypasses the cache, whatever its value
    #[must_use]
    pub fn from_query(query: &BTreeMap<String, String>, config: &CacheConfig) -> Self {
        let bypass = query.contains_key(NO_CACHE_PARAM);
        Self {
            enabled: config.enabled && !bypass,
            ttl: config.default_ttl(),
        }
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ttl: Duration::ZERO,
        }
    }
}

/// A stored value with its absolute expiry
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub key: String,
    pub value: V,
    pub expires_at: Instant,
}

impl<V> CacheEntry<V> {
    #[must_use]
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Point-in-time counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub entries: usize,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

type Store<V> = Arc<RwLock<HashMap<String, CacheEntry<V>>>>;

struct Sweeper {
    stop_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

/// Thread-safe TTL cache with a background expiry sweep
pub struct ResourceCache<V> {
    store: Store<V>,
    config: CacheConfig,
    counters: Arc<Counters>,
    sweeper: Mutex<Option<Sweeper>>,
}

fn purge_expired<V>(store: &Store<V>, counters: &Counters) -> usize {
    let now = Instant::now();
    let mut guard = store.write();
    let before = guard.len();
    guard.retain(|_, entry| !entry.is_expired(now));
    let removed = before - guard.len();
    counters
        .expirations
        .fetch_add(removed as u64, Ordering::Relaxed);
    removed
}

impl<V> ResourceCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache and start its sweep thread
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        let store: Store<V> = Arc::new(RwLock::new(HashMap::new()));
        let counters = Arc::new(Counters::default());
        let sweeper = if config.sweep_interval_secs > 0 {
            Self::spawn_sweeper(&store, &counters, config.sweep_interval())
        } else {
            None
        };

        info!(
            enabled = config.enabled,
            default_ttl_secs = config.default_ttl_secs,
            capacity = config.capacity,
            sweep_interval_secs = config.sweep_interval_secs,
            "Resource cache initialized"
        );

        Self {
            store,
            config,
            counters,
            sweeper: Mutex::new(sweeper),
        }
    }

    /// Create a cache whose sweep runs on a sub-second interval
    #[must_use]
    pub fn with_sweep_interval(config: CacheConfig, interval: Duration) -> Self {
        let cache = Self::new(CacheConfig {
            sweep_interval_secs: 0,
            ..config
        });
        if !interval.is_zero() {
            *cache.sweeper.lock() = Self::spawn_sweeper(&cache.store, &cache.counters, interval);
        }
        cache
    }

    fn spawn_sweeper(
        store: &Store<V>,
        counters: &Arc<Counters>,
        interval: Duration,
    ) -> Option<Sweeper> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let store = Arc::clone(store);
        let counters = Arc::clone(counters);

        let spawned = thread::Builder::new()
            .name("rgw-cache-sweep".to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        let removed = purge_expired(&store, &counters);
                        if removed > 0 {
                            debug!(removed = removed, "Cache sweep removed expired entries");
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            });

        match spawned {
            Ok(handle) => Some(Sweeper { stop_tx, handle }),
            Err(e) => {
                warn!(error = %e, "Failed to start cache sweep thread; expired entries are only dropped on access");
                None
            }
        }
    }

    #[must_use]
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Look up a live entry; expired entries count as misses
    #[must_use]
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_with_ttl(key).map(|(value, _)| value)
    }

    /// Look up a live entry together with its remaining TTL
    #[must_use]
    pub fn get_with_ttl(&self, key: &str) -> Option<(V, Duration)> {
        let now = Instant::now();
        let found = {
            let guard = self.store.read();
            guard
                .get(key)
                .filter(|entry| !entry.is_expired(now))
                .map(|entry| (entry.value.clone(), entry.expires_at - now))
        };
        match &found {
            Some(_) => self.counters.hits.fetch_add(1, Ordering::Relaxed),
            None => self.counters.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    /// Store `value` for `ttl`; a zero TTL uses the configured default
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        let ttl = if ttl.is_zero() {
            self.config.default_ttl()
        } else {
            ttl
        };
        let expires_at = Instant::now() + ttl;

        let mut guard = self.store.write();
        if self.config.capacity > 0
            && !guard.contains_key(&key)
            && guard.len() >= self.config.capacity
        {
            let victim = guard
                .values()
                .min_by_key(|entry| entry.expires_at)
                .map(|entry| entry.key.clone());
            if let Some(victim) = victim {
                guard.remove(&victim);
                self.counters.evictions.fetch_add(1, Ordering::Relaxed);
                debug!(key = %victim, "Evicted cache entry with the soonest expiry");
            }
        }
        guard.insert(
            key.clone(),
            CacheEntry {
                key,
                value,
                expires_at,
            },
        );
    }

    /// Remove one entry; returns whether it existed
    pub fn delete(&self, key: &str) -> bool {
        self.store.write().remove(key).is_some()
    }

    pub fn clear(&self) {
        let mut guard = self.store.write();
        let count = guard.len();
        guard.clear();
        debug!(cleared = count, "Cache cleared");
    }

    /// Remove every expired entry now; returns how many were removed
    pub fn purge_expired(&self) -> usize {
        purge_expired(&self.store, &self.counters)
    }

    /// Number of stored entries, including expired ones not yet swept
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            expirations: self.counters.expirations.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    /// Whether the background sweep is still running
    #[must_use]
    pub fn is_sweeping(&self) -> bool {
        self.sweeper.lock().is_some()
    }
}

impl<V> ResourceCache<V> {
    /// Stop the sweep thread and wait for it to exit. Safe to call more than once.
    pub fn stop(&self) {
        let sweeper = self.sweeper.lock().take();
        if let Some(Sweeper { stop_tx, handle }) = sweeper {
            // The thread also exits if the sender is already gone
            stop_tx.send(()).ok();
            if handle.join().is_err() {
                warn!("Cache sweep thread panicked");
            }
            info!("Resource cache sweep stopped");
        }
    }
}

impl<V> Drop for ResourceCache<V> {
    fn drop(&mut self) {
        self.stop();
    }
}
