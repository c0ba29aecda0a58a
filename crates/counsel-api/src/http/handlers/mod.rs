//! HTTP request handlers.

pub mod auth;
pub mod chat;
pub mod payment;
pub mod session;
pub mod upload;
pub mod user;
pub mod ws;
