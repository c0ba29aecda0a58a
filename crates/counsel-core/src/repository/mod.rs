//! Repository trait definitions (storage ports).
//!
//! Implementations live in counsel-infra (e.g., `SqliteChatRepository`).
//! All traits use native async fn in traits (RPITIT, Rust 2024 edition).

pub mod chat;
pub mod file;
pub mod quota;
pub mod subscription;
pub mod user;

pub use chat::ChatRepository;
pub use file::FileRepository;
pub use quota::QuotaRepository;
pub use subscription::SubscriptionRepository;
pub use user::UserRepository;
