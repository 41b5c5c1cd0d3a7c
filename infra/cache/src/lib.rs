//! # Cache
//!
//! An in-memory key/value cache with optional per-entry TTL that reports its
//! hit/miss behavior through the [event bus](relay_event_bus).
//!
//! ## Expiration model
//!
//! Every entry stored with a TTL owns exactly one scheduled reaper task that
//! removes it when the deadline passes (**proactive expiry**). Independently,
//! a lookup that finds an entry past its deadline tears it down on the spot
//! (**lazy expiry**); to the caller both paths look identical to a plain miss.
//! Replacing or deleting a key always cancels its pending reaper first, so at
//! most one live timer exists per key at any time.
//!
//! ## Observability
//!
//! Successful lookups publish [`HIT_EVENT`] with a [`CacheHit`] payload,
//! misses publish [`MISS_EVENT`] with a [`CacheMiss`] payload. Delivery is
//! synchronous: [`Cache::get`] does not return before all subscribers ran.
//! Writes and deletes emit nothing.
//!
//! # Example
//!
//! ```rust
//! use relay_cache::{Cache, CacheError};
//! use relay_event_bus::EventBus;
//! use std::time::Duration;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), CacheError> {
//!     let bus = EventBus::new();
//!     let cache: Cache<String> = Cache::builder().bus(bus.clone()).build();
//!
//!     cache.set("greeting", "hello".to_owned(), Some(Duration::from_millis(250)))?;
//!     assert_eq!(cache.get("greeting").as_deref(), Some("hello"));
//!     assert!(cache.del("greeting"));
//!     assert_eq!(cache.get("greeting"), None);
//!
//!     let snapshot = cache.debug();
//!     assert_eq!((snapshot.stats.hits, snapshot.stats.misses), (1, 1));
//!     Ok(())
//! }
//! ```

mod error;
mod events;
mod store;

pub use error::{CacheError, CacheErrorExt};
pub use events::{CacheHit, CacheMiss, HIT_EVENT, MISS_EVENT};
pub use store::{Cache, CacheBuilder, CacheDebug, CacheStats};
