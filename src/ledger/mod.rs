//! Ledger module containing counterparty ledger construction

pub mod builder;

pub use builder::*;
