//! Shared domain types for Counsel.
//!
//! This crate contains the core domain types used across the Counsel platform:
//! users and tiers, chat sessions and messages, quotas, uploaded files,
//! subscriptions, realtime wire frames, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod billing;
pub mod chat;
pub mod config;
pub mod error;
pub mod file;
pub mod quota;
pub mod realtime;
pub mod user;
