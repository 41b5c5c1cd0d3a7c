//! # Event Bus
//!
//! A synchronous, thread-safe event bus for named publish/subscribe messaging.
//!
//! ## Overview
//!
//! Provides a centralized [`EventBus`] mapping event names to ordered subscriber
//! lists. Delivery is synchronous: `emit` does not return until every subscriber
//! for that event has been invoked. A `FxHashMap` registry behind a
//! `parking_lot::RwLock` keeps lookups cheap; dispatch iterates a snapshot so
//! callbacks may freely re-enter the bus.
//!
//! ## Features
//!
//! * **Named events**: any non-empty string, no schema imposed.
//! * **Typed payloads**: one payload value per emission, recovered by
//!   downcast through [`Envelope::payload`].
//! * **Removal tokens**: [`EventBus::on`] returns a [`Subscription`] that
//!   revokes exactly that registration, idempotently.
//! * **Failure isolation**: a panicking subscriber is contained and logged;
//!   siblings still run and `emit` still succeeds.
//!
//! # Example
//!
//! ```rust
//! use relay_event_bus::{EventBus, EventBusError};
//!
//! #[derive(Debug)]
//! struct UserCreated {
//!     id: u64,
//! }
//!
//! fn main() -> Result<(), EventBusError> {
//!     let bus = EventBus::new();
//!
//!     let token = bus.on("user:created", |envelope| {
//!         if let Some(event) = envelope.payload::<UserCreated>() {
//!             assert_eq!(event.id, 42);
//!         }
//!     })?;
//!
//!     let delivered = bus.emit("user:created", UserCreated { id: 42 })?;
//!     assert_eq!(delivered, 1);
//!
//!     bus.off(&token);
//!     Ok(())
//! }
//! ```

mod bus;
mod error;
mod subscription;

pub use bus::{Event, EventBus};
pub use error::{EventBusError, EventBusErrorExt};
pub use subscription::{Envelope, Subscription};
