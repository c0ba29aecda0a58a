//! Business logic and repository trait definitions for Counsel.
//!
//! This crate defines the "ports" (repository and gateway traits) that the
//! infrastructure layer implements, plus the services that coordinate them:
//! the quota ledger, the chat orchestrator, the session connection registry,
//! the typing relay, and the billing service. It depends only on
//! `counsel-types` -- never on `counsel-infra` or any database/IO crate.

pub mod assistant;
pub mod billing;
pub mod chat;
pub mod quota;
pub mod realtime;
pub mod repository;
pub mod storage;
