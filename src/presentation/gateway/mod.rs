//! Gateway Module
//!
//! Inbound side of the service: gateway event decoding and dispatch to the
//! proxy pipeline.

pub mod dispatcher;
pub mod events;

pub use dispatcher::EventDispatcher;
pub use events::{EventError, EventKind, GatewayEvent, GatewayPacket, MessageUpdate};
