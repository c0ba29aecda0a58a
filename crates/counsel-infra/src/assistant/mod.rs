//! External assistant service client.

pub mod client;
pub mod types;

pub use client::OpenAiAssistant;
