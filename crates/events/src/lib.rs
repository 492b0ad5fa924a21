//! Domain events and their distribution.
//!
//! Aggregates return events from `handle`; infrastructure wraps committed
//! events in envelopes and publishes them so post-commit side effects (such as
//! user notices) run outside the write path.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod handler;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::{EventEnvelope, EventHeader};
pub use event::Event;
pub use handler::execute;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
