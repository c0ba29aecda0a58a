//! External assistant gateway port.

pub mod gateway;

pub use gateway::{AssistantGateway, AssistantReply};
