use crate::error::CacheError;
use crate::events::{CacheHit, CacheMiss, HIT_EVENT, MISS_EVENT};
use fxhash::{FxBuildHasher, FxHashMap};
use parking_lot::Mutex;
use relay_event_bus::{Event, EventBus};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{trace, warn};

/// One stored key. Owns its expiry timer exclusively: the entry is the only
/// holder of the reaper handle, and dropping the entry aborts it, so replace
/// and delete can never leave an orphaned timer behind.
struct CacheEntry<V> {
    value: V,
    expires_at: Option<Instant>,
    generation: u64,
    reaper: Option<JoinHandle<()>>,
}

impl<V> CacheEntry<V> {
    fn expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

impl<V> Drop for CacheEntry<V> {
    fn drop(&mut self) {
        if let Some(reaper) = self.reaper.take() {
            reaper.abort();
        }
    }
}

/// Entry map and counters share one mutex: an entry transition and its
/// matching counter update are atomic to outside observers.
struct CacheState<V> {
    entries: FxHashMap<String, CacheEntry<V>>,
    hits: u64,
    misses: u64,
    next_generation: u64,
}

struct CacheInner<V> {
    state: Mutex<CacheState<V>>,
    bus: EventBus,
}

/// Thread-safe in-memory key/value cache with optional per-entry TTL.
///
/// Cloning is cheap and every clone operates on the same store. Hits and
/// misses are counted and published on the attached
/// [`EventBus`](relay_event_bus::EventBus); see the crate docs for the
/// expiration model.
pub struct Cache<V> {
    inner: Arc<CacheInner<V>>,
}

impl<V> Clone for Cache<V> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<V> fmt::Debug for Cache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache").finish_non_exhaustive()
    }
}

impl<V: Clone + Send + Sync + 'static> Cache<V> {
    /// Creates a new [`CacheBuilder`].
    #[must_use]
    pub fn builder() -> CacheBuilder<V> {
        CacheBuilder::new()
    }

    /// Creates a cache publishing its events on `bus`.
    #[must_use]
    pub fn new(bus: EventBus) -> Self {
        Self::builder().bus(bus).build()
    }

    /// The bus this cache publishes `cache:hit` / `cache:miss` on.
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.inner.bus
    }

    /// Stores `value` under `key`, replacing any previous entry.
    ///
    /// The previous entry's pending reaper is cancelled before the new entry
    /// is installed. `None` and `Some(Duration::ZERO)` both mean "never
    /// expires"; a live TTL arms one reaper task that removes the key when
    /// the deadline passes, unless the entry was replaced or deleted first.
    /// Writes emit no events and touch no counters.
    ///
    /// Arming the reaper requires a Tokio runtime on the calling thread; when
    /// none is available the entry still expires, but only lazily on access.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidKey`] if `key` is empty.
    pub fn set(
        &self,
        key: impl Into<String>,
        value: V,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let key = key.into();
        if key.is_empty() {
            return Err(CacheError::InvalidKey {
                message: "cache key must be a non-empty string".into(),
                context: None,
            });
        }
        let ttl = ttl.filter(|ttl| !ttl.is_zero());
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);

        let mut state = self.inner.state.lock();
        let generation = state.next_generation;
        state.next_generation += 1;
        // Dropping the previous entry cancels its reaper before the new one is armed.
        state.entries.remove(&key);
        let reaper =
            expires_at.and_then(|deadline| self.arm_reaper(key.clone(), generation, deadline));
        state
            .entries
            .insert(key.clone(), CacheEntry { value, expires_at, generation, reaper });
        drop(state);

        trace!(%key, ?ttl, "Cache entry stored");
        Ok(())
    }

    /// Looks up `key`, returning a clone of the stored value.
    ///
    /// An entry whose deadline has passed is torn down on the spot and
    /// reported exactly like an absent one; the caller cannot distinguish
    /// lazy expiry from true absence. Every call increments one counter and
    /// publishes the matching event before returning, so subscribers observe
    /// the lookup synchronously. The counter update happens under the state
    /// lock but the event is emitted after release, so under concurrent
    /// lookups the counter/event ordering is per-call, not global.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut state = self.inner.state.lock();

        let value = match state.entries.get(key) {
            Some(entry) if !entry.expired(now) => Some(entry.value.clone()),
            Some(_) => {
                // Lazy expiry. Dropping the entry cancels the in-flight reaper.
                state.entries.remove(key);
                None
            },
            None => None,
        };

        match value {
            Some(value) => {
                state.hits += 1;
                drop(state);
                trace!(key, "Cache hit");
                self.notify(HIT_EVENT, CacheHit { key: key.to_owned(), value: value.clone() });
                Some(value)
            },
            None => {
                state.misses += 1;
                drop(state);
                trace!(key, "Cache miss");
                self.notify(MISS_EVENT, CacheMiss { key: key.to_owned() });
                None
            },
        }
    }

    /// Removes `key`, cancelling its pending reaper.
    ///
    /// Returns whether the key was present. Never touches the hit/miss
    /// counters and never emits events.
    pub fn del(&self, key: &str) -> bool {
        let removed = self.inner.state.lock().entries.remove(key).is_some();
        if removed {
            trace!(key, "Cache entry deleted");
        }
        removed
    }

    /// Snapshot of the current store: size, counters, and stored keys.
    ///
    /// A key whose TTL has passed but whose reaper has not fired yet still
    /// appears here; it disappears once the reaper or a lookup reaps it.
    #[must_use]
    pub fn debug(&self) -> CacheDebug {
        let state = self.inner.state.lock();
        CacheDebug {
            size: state.entries.len(),
            stats: CacheStats { hits: state.hits, misses: state.misses },
            keys: state.entries.keys().cloned().collect(),
        }
    }

    /// Tears down every entry (cancelling all pending reapers) and resets
    /// both counters to zero.
    pub fn clear(&self) {
        let evicted = {
            let mut state = self.inner.state.lock();
            let evicted = state.entries.len();
            state.entries.clear();
            state.hits = 0;
            state.misses = 0;
            evicted
        };
        trace!(evicted, "Cache cleared");
    }

    /// Spawns the reaper task for one armed entry. The task holds only a
    /// `Weak` reference, so dropping the last cache handle ends it, and the
    /// generation check makes a fired-but-already-replaced timer a no-op.
    fn arm_reaper(
        &self,
        key: String,
        generation: u64,
        deadline: Instant,
    ) -> Option<JoinHandle<()>> {
        let Ok(handle) = Handle::try_current() else {
            warn!(%key, "No Tokio runtime on this thread; entry will expire lazily on access");
            return None;
        };

        let inner = Arc::downgrade(&self.inner);
        Some(handle.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let Some(inner) = inner.upgrade() else { return };
            let mut state = inner.state.lock();
            if state.entries.get(&key).is_some_and(|entry| entry.generation == generation) {
                state.entries.remove(&key);
                drop(state);
                trace!(%key, "Expired cache entry reaped");
            }
        }))
    }

    fn notify<T: Event>(&self, event: &'static str, payload: T) {
        if let Err(error) = self.inner.bus.emit(event, payload) {
            warn!(event, %error, "Failed to publish cache event");
        }
    }
}

/// Hit/miss counters since construction or the last [`Cache::clear`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Owned snapshot returned by [`Cache::debug`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheDebug {
    pub size: usize,
    pub stats: CacheStats,
    pub keys: Vec<String>,
}

/// A fluent builder for configuring a [`Cache`].
#[must_use = "builders do nothing unless you call .build()"]
pub struct CacheBuilder<V> {
    bus: Option<EventBus>,
    capacity: usize,
    _values: PhantomData<V>,
}

impl<V> fmt::Debug for CacheBuilder<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheBuilder").field("capacity", &self.capacity).finish_non_exhaustive()
    }
}

impl<V> Default for CacheBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> CacheBuilder<V> {
    /// Creates a new [`CacheBuilder`].
    pub fn new() -> Self {
        Self { bus: None, capacity: 0, _values: PhantomData }
    }

    /// Publishes cache events on `bus` instead of a private one.
    pub fn bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Pre-allocates room for `capacity` entries.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Builds the cache.
    pub fn build(self) -> Cache<V> {
        let bus = self.bus.unwrap_or_default();
        let state = CacheState {
            entries: FxHashMap::with_capacity_and_hasher(self.capacity, FxBuildHasher::default()),
            hits: 0,
            misses: 0,
            next_generation: 0,
        };
        Cache { inner: Arc::new(CacheInner { state: Mutex::new(state), bus }) }
    }
}
