//! Payment provider client.

pub mod paystack;

pub use paystack::PaystackProvider;
