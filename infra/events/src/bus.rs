use crate::error::EventBusError;
use crate::subscription::{Envelope, Subscriber, Subscription};
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::any::Any;
use std::sync::Arc;
use tracing::trace;

/// Marker trait for values that can travel through the [`EventBus`] as payloads.
///
/// Any type that is `Send + Sync + 'static` automatically implements this trait.
pub trait Event: Any + Send + Sync + 'static {}
impl<T: Any + Send + Sync + 'static> Event for T {}

#[derive(Debug, Default)]
struct Registry {
    events: FxHashMap<Arc<str>, Vec<Arc<Subscriber>>>,
    /// Monotonic; never reused, so stale tokens can never hit a later subscriber.
    next_id: u64,
}

/// A thread-safe publish/subscribe bus over named events.
///
/// Cloning is cheap and every clone operates on the same registry. Delivery is
/// synchronous with respect to the emitter and iterates a snapshot of the
/// subscriber list, so callbacks may call back into the bus without corrupting
/// the registry.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    registry: Arc<RwLock<Registry>>,
}

impl EventBus {
    /// Creates a new, empty `EventBus`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` under `event` and returns the removal token.
    ///
    /// Every call registers an independent subscriber: registering the same
    /// closure twice yields two deliveries per emission and two tokens.
    /// Subscribers are invoked in registration order.
    ///
    /// # Errors
    /// Returns [`EventBusError::InvalidEventName`] if `event` is empty.
    ///
    /// # Examples
    /// ```rust
    /// use relay_event_bus::EventBus;
    ///
    /// # fn main() -> Result<(), relay_event_bus::EventBusError> {
    /// let bus = EventBus::new();
    /// let token = bus.on("tick", |_envelope| {})?;
    /// bus.off(&token);
    /// # Ok(())
    /// # }
    /// ```
    pub fn on<F>(&self, event: &str, callback: F) -> Result<Subscription, EventBusError>
    where
        F: Fn(&Envelope) + Send + Sync + 'static,
    {
        self.register(event, callback, false)
    }

    /// Registers `callback` under `event` for a single delivery.
    ///
    /// The subscriber is removed from the registry before its first invocation
    /// runs, so it observes exactly one emission even when emitters race. If
    /// the event never fires the registration stays in place indefinitely;
    /// releasing it early is the caller's responsibility.
    ///
    /// # Errors
    /// Returns [`EventBusError::InvalidEventName`] if `event` is empty.
    pub fn once<F>(&self, event: &str, callback: F) -> Result<(), EventBusError>
    where
        F: Fn(&Envelope) + Send + Sync + 'static,
    {
        self.register(event, callback, true).map(|_| ())
    }

    /// Removes the registration identified by `subscription`, if still present.
    ///
    /// Idempotent: removing twice, removing after the event is gone, or
    /// removing after [`EventBus::clear`] are all no-ops.
    pub fn off(&self, subscription: &Subscription) {
        if self.remove(subscription.event(), subscription.id()) {
            trace!(event = subscription.event(), id = subscription.id(), "Subscriber removed");
        }
    }

    /// Emits `payload` to every subscriber of `event`, in registration order.
    ///
    /// Delivery happens on the calling thread and outside any bus lock; the
    /// subscriber list is snapshotted first, so a callback that unsubscribes
    /// itself or a sibling mid-emission neither skips nor double-invokes
    /// anyone in the current round. A panicking subscriber is contained and
    /// logged without affecting siblings or the emitter.
    ///
    /// Returns the number of subscribers invoked; zero subscribers is a
    /// silent no-op, not an error.
    ///
    /// # Errors
    /// Returns [`EventBusError::InvalidEventName`] if `event` is empty.
    ///
    /// # Examples
    /// ```rust
    /// use relay_event_bus::EventBus;
    ///
    /// #[derive(Debug)]
    /// struct Ping(u64);
    ///
    /// # fn main() -> Result<(), relay_event_bus::EventBusError> {
    /// let bus = EventBus::new();
    /// assert_eq!(bus.emit("ping", Ping(1))?, 0);
    /// # Ok(())
    /// # }
    /// ```
    pub fn emit<T: Event>(&self, event: &str, payload: T) -> Result<usize, EventBusError> {
        validate_event_name(event)?;

        let snapshot = {
            let registry = self.registry.read();
            registry.events.get(event).cloned()
        };
        let Some(snapshot) = snapshot.filter(|subscribers| !subscribers.is_empty()) else {
            trace!(event, "Event dropped: no active subscribers");
            return Ok(0);
        };

        let envelope = Envelope::new(event, payload);
        let mut delivered = 0_usize;
        for subscriber in snapshot {
            // A `once` subscriber is claimed by removal first; losing the
            // claim means another emitter already delivered to it.
            if subscriber.once && !self.remove(event, subscriber.id) {
                continue;
            }
            subscriber.invoke(&envelope);
            delivered += 1;
        }

        trace!(event, delivered, "Event dispatched");
        Ok(delivered)
    }

    /// Snapshot of current subscriber counts per event name.
    ///
    /// The returned map is owned and detached from the live registry.
    #[must_use]
    pub fn debug(&self) -> FxHashMap<String, usize> {
        let registry = self.registry.read();
        registry
            .events
            .iter()
            .map(|(name, subscribers)| (name.to_string(), subscribers.len()))
            .collect()
    }

    /// Unconditionally removes all events and all subscribers.
    ///
    /// Previously issued [`Subscription`] tokens stay valid but inert.
    pub fn clear(&self) {
        let events = {
            let mut registry = self.registry.write();
            let events = registry.events.len();
            registry.events.clear();
            events
        };
        trace!(events, "Event registry cleared");
    }

    fn register<F>(&self, event: &str, callback: F, once: bool) -> Result<Subscription, EventBusError>
    where
        F: Fn(&Envelope) + Send + Sync + 'static,
    {
        validate_event_name(event)?;
        let name: Arc<str> = Arc::from(event);

        let id = {
            let mut registry = self.registry.write();
            let id = registry.next_id;
            registry.next_id += 1;
            registry
                .events
                .entry(Arc::clone(&name))
                .or_default()
                .push(Arc::new(Subscriber::new(id, once, callback)));
            id
        };

        trace!(event = %name, id, once, "Subscriber registered");
        Ok(Subscription::new(name, id))
    }

    /// Removes subscriber `id` from `event`; returns whether it was present.
    /// Empty subscriber lists are pruned so `debug()` never reports zeros.
    fn remove(&self, event: &str, id: u64) -> bool {
        let mut registry = self.registry.write();
        let Some(subscribers) = registry.events.get_mut(event) else {
            return false;
        };
        let before = subscribers.len();
        subscribers.retain(|subscriber| subscriber.id != id);
        let removed = subscribers.len() != before;
        if subscribers.is_empty() {
            registry.events.remove(event);
        }
        removed
    }
}

fn validate_event_name(event: &str) -> Result<(), EventBusError> {
    if event.is_empty() {
        return Err(EventBusError::InvalidEventName {
            message: "event name must be a non-empty string".into(),
            context: None,
        });
    }
    Ok(())
}
