//! Realtime session fan-out: connection registry and signal relay.

pub mod registry;
pub mod relay;

pub use registry::{ConnectionHandle, ConnectionId, SessionRegistry};
pub use relay::SignalRelay;
