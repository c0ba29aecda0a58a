//! Usage quota ledger and admission control.

pub mod ledger;

pub use ledger::QuotaLedger;
