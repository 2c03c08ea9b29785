//! Event fan-out: broadcast hub, sinks, and subscriber APIs.
//!
//! The module is organised around a broadcast-based [`EventHub`] plus helpers
//! for configuring sinks ([`EventBus`]) and consuming the resulting
//! [`EventStream`].

pub mod bus;
pub mod emitter;
pub mod event;
pub mod hub;
pub mod sink;

pub use bus::EventBus;
pub use emitter::{EmitterError, EventEmitter};
pub use event::EngineEvent;
pub use hub::{EventHub, EventStream, HubEmitter};
pub use sink::{ChannelSink, EventSink, MemorySink, TracingSink};
