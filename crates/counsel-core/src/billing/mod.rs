//! Billing: checkout initialization and payment callback handling.

pub mod provider;
pub mod service;

pub use provider::{CheckoutMetadata, PaymentProvider};
pub use service::BillingService;
