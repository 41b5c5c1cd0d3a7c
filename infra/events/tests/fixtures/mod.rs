use relay_event_bus::Envelope;
use std::sync::{Arc, Mutex};

/// Payload used by most bus tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestEvent(pub i64);

pub type Seen = Arc<Mutex<Vec<i64>>>;

pub fn seen() -> Seen {
    Arc::new(Mutex::new(Vec::new()))
}

/// Callback recording every [`TestEvent`] payload it receives, in order.
pub fn record_into(seen: Seen) -> impl Fn(&Envelope) + Send + Sync + 'static {
    move |envelope| {
        if let Some(TestEvent(value)) = envelope.payload::<TestEvent>() {
            seen.lock().unwrap().push(*value);
        }
    }
}
