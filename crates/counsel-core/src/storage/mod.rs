//! Object storage port.

pub mod object;

pub use object::ObjectStore;
