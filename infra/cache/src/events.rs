//! Well-known event names and payloads published by the cache.
//!
//! Consumers subscribe through the shared [`EventBus`](relay_event_bus::EventBus)
//! and downcast the envelope payload to the matching struct.

/// Event name published on every successful lookup.
pub const HIT_EVENT: &str = "cache:hit";

/// Event name published when a key is absent or expired.
pub const MISS_EVENT: &str = "cache:miss";

/// Payload for [`HIT_EVENT`]: the key and a clone of the stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheHit<V> {
    pub key: String,
    pub value: V,
}

/// Payload for [`MISS_EVENT`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheMiss {
    pub key: String,
}
