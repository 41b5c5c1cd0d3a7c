use crate::bus::Event;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::warn;

/// A delivered event: the name it was emitted under plus its payload.
///
/// The payload is type-erased so one bus can carry arbitrary event kinds;
/// subscribers recover it with [`Envelope::payload`].
#[derive(Clone)]
pub struct Envelope {
    name: Arc<str>,
    payload: Arc<dyn Any + Send + Sync>,
}

impl Envelope {
    pub(crate) fn new<T: Event>(name: &str, payload: T) -> Self {
        Self { name: Arc::from(name), payload: Arc::new(payload) }
    }

    /// The event name this envelope was emitted under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Downcasts the payload to `T`, returning `None` on a type mismatch.
    #[must_use]
    pub fn payload<T: Event>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Token identifying one registration of one callback under one event name.
///
/// Passing it to [`EventBus::off`](crate::EventBus::off) removes exactly that
/// registration. Tokens stay valid (and inert) after removal or a bus
/// [`clear`](crate::EventBus::clear); ids are never reused.
#[derive(Debug, Clone)]
pub struct Subscription {
    event: Arc<str>,
    id: u64,
}

impl Subscription {
    pub(crate) fn new(event: Arc<str>, id: u64) -> Self {
        Self { event, id }
    }

    /// The event name this subscription is registered under.
    #[must_use]
    pub fn event(&self) -> &str {
        &self.event
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }
}

pub(crate) struct Subscriber {
    pub(crate) id: u64,
    pub(crate) once: bool,
    callback: Box<dyn Fn(&Envelope) + Send + Sync>,
}

impl Subscriber {
    pub(crate) fn new<F>(id: u64, once: bool, callback: F) -> Self
    where
        F: Fn(&Envelope) + Send + Sync + 'static,
    {
        Self { id, once, callback: Box::new(callback) }
    }

    /// Invokes the callback, containing any panic it raises. One failing
    /// subscriber must never prevent delivery to its siblings.
    pub(crate) fn invoke(&self, envelope: &Envelope) {
        let result = panic::catch_unwind(AssertUnwindSafe(|| (self.callback)(envelope)));
        if let Err(payload) = result {
            warn!(
                event = envelope.name(),
                id = self.id,
                reason = panic_message(payload.as_ref()),
                "Subscriber panicked during dispatch; continuing delivery"
            );
        }
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.id)
            .field("once", &self.once)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}
