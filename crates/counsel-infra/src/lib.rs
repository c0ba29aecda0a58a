//! Infrastructure layer for Counsel.
//!
//! Contains implementations of the repository and gateway traits defined in
//! `counsel-core`: SQLite storage, the external assistant client, the
//! object store client, and the payment provider client.

pub mod assistant;
pub mod config;
pub mod object_store;
pub mod payment;
pub mod sqlite;
