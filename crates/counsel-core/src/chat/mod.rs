//! Chat orchestration: the usage-gated message and upload pipelines.

pub mod service;

pub use service::ChatService;
