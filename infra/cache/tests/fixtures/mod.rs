use relay_cache::{CacheHit, CacheMiss, HIT_EVENT, MISS_EVENT};
use relay_event_bus::EventBus;
use std::sync::{Arc, Mutex};

pub type Hits = Arc<Mutex<Vec<(String, String)>>>;
pub type Misses = Arc<Mutex<Vec<String>>>;

/// Subscribes a recorder for `cache:hit` events carrying `String` values.
pub fn record_hits(bus: &EventBus) -> Hits {
    let seen: Hits = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    bus.on(HIT_EVENT, move |envelope| {
        if let Some(hit) = envelope.payload::<CacheHit<String>>() {
            sink.lock().unwrap().push((hit.key.clone(), hit.value.clone()));
        }
    })
    .unwrap();
    seen
}

/// Subscribes a recorder for `cache:miss` events.
pub fn record_misses(bus: &EventBus) -> Misses {
    let seen: Misses = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    bus.on(MISS_EVENT, move |envelope| {
        if let Some(miss) = envelope.payload::<CacheMiss>() {
            sink.lock().unwrap().push(miss.key.clone());
        }
    })
    .unwrap();
    seen
}

/// Lets already-woken background tasks (reapers) run to completion.
pub async fn settle() {
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
}
