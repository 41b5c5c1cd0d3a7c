pub mod fixtures;

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use relay_event_bus::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_emit_delivers_typed_payload() {
        let bus = EventBus::new();
        let seen = seen();
        bus.on("greeting", record_into(Arc::clone(&seen))).unwrap();

        let delivered = bus.emit("greeting", TestEvent(42)).unwrap();

        assert_eq!(delivered, 1);
        assert_eq!(*seen.lock().unwrap(), vec![42]);
    }

    #[test]
    fn test_subscribers_invoked_in_registration_order() {
        let bus = EventBus::new();
        let seen = seen();

        let first = Arc::clone(&seen);
        bus.on("order", move |_| first.lock().unwrap().push(1)).unwrap();
        let second = Arc::clone(&seen);
        bus.on("order", move |_| second.lock().unwrap().push(2)).unwrap();

        bus.emit("order", TestEvent(0)).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![1, 2], "Delivery must follow registration order");
    }

    #[test]
    fn test_duplicate_registrations_are_independent() {
        let bus = EventBus::new();
        let seen = seen();
        let first = bus.on("dup", record_into(Arc::clone(&seen))).unwrap();
        let _second = bus.on("dup", record_into(Arc::clone(&seen))).unwrap();

        bus.emit("dup", TestEvent(7)).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![7, 7]);

        bus.off(&first);
        bus.emit("dup", TestEvent(8)).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![7, 7, 8], "Only the removed token stops delivering");
    }

    #[test]
    fn test_off_is_idempotent() {
        let bus = EventBus::new();
        let seen = seen();
        let token = bus.on("quiet", record_into(Arc::clone(&seen))).unwrap();

        bus.off(&token);
        bus.off(&token);

        assert_eq!(bus.emit("quiet", TestEvent(1)).unwrap(), 0);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_off_after_clear_is_noop() {
        let bus = EventBus::new();
        let stale = bus.on("reset", |_| {}).unwrap();
        bus.clear();

        bus.off(&stale);

        let seen = seen();
        bus.on("reset", record_into(Arc::clone(&seen))).unwrap();
        bus.emit("reset", TestEvent(3)).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![3], "Stale tokens must not touch new subscribers");
    }

    #[test]
    fn test_once_delivers_exactly_once() {
        let bus = EventBus::new();
        let seen = seen();
        bus.once("boot", record_into(Arc::clone(&seen))).unwrap();

        bus.emit("boot", TestEvent(1)).unwrap();
        bus.emit("boot", TestEvent(2)).unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![1],
            "A once subscriber sees only the first emission's payload"
        );
        assert!(bus.debug().is_empty(), "The once registration must be gone after delivery");
    }

    #[test]
    fn test_panicking_subscriber_does_not_stop_delivery() {
        let bus = EventBus::new();
        bus.on("fragile", |_| panic!("boom")).unwrap();
        let seen = seen();
        bus.on("fragile", record_into(Arc::clone(&seen))).unwrap();

        let result = bus.emit("fragile", TestEvent(5));

        assert!(result.is_ok(), "Subscriber failures must never surface to the emitter");
        assert_eq!(*seen.lock().unwrap(), vec![5], "Siblings still run after a panic");
    }

    #[test]
    fn test_emit_without_subscribers_is_silent() {
        let bus = EventBus::new();
        assert_eq!(bus.emit("nobody", TestEvent(0)).unwrap(), 0);
    }

    #[test]
    fn test_empty_event_name_rejected() {
        let bus = EventBus::new();

        assert!(matches!(bus.on("", |_| {}), Err(EventBusError::InvalidEventName { .. })));
        assert!(matches!(bus.once("", |_| {}), Err(EventBusError::InvalidEventName { .. })));
        assert!(matches!(
            bus.emit("", TestEvent(0)),
            Err(EventBusError::InvalidEventName { .. })
        ));
    }

    #[test]
    fn test_debug_returns_detached_snapshot() {
        let bus = EventBus::new();
        bus.on("a", |_| {}).unwrap();
        bus.on("a", |_| {}).unwrap();
        bus.on("b", |_| {}).unwrap();

        let counts = bus.debug();
        assert_eq!(counts.get("a"), Some(&2));
        assert_eq!(counts.get("b"), Some(&1));

        bus.on("b", |_| {}).unwrap();
        assert_eq!(counts.get("b"), Some(&1), "A snapshot must not track later registrations");
    }

    #[test]
    fn test_clear_removes_everything() {
        let bus = EventBus::new();
        bus.on("a", |_| {}).unwrap();
        bus.once("b", |_| {}).unwrap();

        bus.clear();

        assert!(bus.debug().is_empty());
        assert_eq!(bus.emit("a", TestEvent(0)).unwrap(), 0);
    }

    #[test]
    fn test_callback_may_unsubscribe_itself_mid_emit() {
        let bus = EventBus::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let inner_bus = bus.clone();
        let inner_slot = Arc::clone(&slot);
        let token = bus
            .on("self", move |_| {
                if let Some(token) = inner_slot.lock().unwrap().take() {
                    inner_bus.off(&token);
                }
            })
            .unwrap();
        slot.lock().unwrap().replace(token);

        let seen = seen();
        bus.on("self", record_into(Arc::clone(&seen))).unwrap();

        bus.emit("self", TestEvent(1)).unwrap();
        bus.emit("self", TestEvent(2)).unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![1, 2],
            "A sibling must not be skipped when another subscriber removes itself"
        );
        assert_eq!(bus.debug().get("self"), Some(&1));
    }

    #[test]
    fn test_callback_may_subscribe_during_emit() {
        let bus = EventBus::new();
        let seen = seen();

        let inner_bus = bus.clone();
        let inner_seen = Arc::clone(&seen);
        bus.on("grow", move |_| {
            inner_bus.on("grow", record_into(Arc::clone(&inner_seen))).unwrap();
        })
        .unwrap();

        bus.emit("grow", TestEvent(1)).unwrap();
        assert!(seen.lock().unwrap().is_empty(), "New subscribers join from the next emission on");

        bus.emit("grow", TestEvent(2)).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![2]);
    }

    #[test]
    fn test_concurrent_emitters_deliver_all_events() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        bus.on("load", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        let handles: Vec<_> = (0..2_i64)
            .map(|worker| {
                let bus = bus.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        bus.emit("load", TestEvent(worker * 50 + i)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(count.load(Ordering::SeqCst), 100, "Should receive all events");
    }

    #[test]
    fn test_error_context_is_attached() {
        let bus = EventBus::new();
        let error = bus.emit("", TestEvent(0)).context("demo listener").unwrap_err();
        assert!(error.to_string().contains("demo listener"));
    }
}
