//! # Ledger Engine
//!
//! A reconciliation library that reconstructs accounting state - running
//! balances, payment status, inventory stock, and categorized expenses - from
//! immutable transaction records spread across independent entity streams
//! (purchases, bank and cash payments, sales invoices, plot sales).
//!
//! ## Features
//!
//! - **Counterparty ledgers**: supplier, customer, and project ledgers merged
//!   chronologically with deterministic tie-breaks and running balances
//! - **Expense classification**: free-text payment descriptions bucketed into
//!   seven fixed categories by ordered keyword matching
//! - **Stock & payment reconciliation**: write-time counters with full-replay
//!   audits that detect drift, and atomic paid-amount/status updates
//! - **Aggregate reports**: income statements, inventory reports, dashboard
//!   statistics with month-over-month comparison, and project progress
//! - **Storage abstraction**: database-agnostic design with a trait-based
//!   transaction store
//!
//! ## Quick Start
//!
//! ```rust
//! use ledger_engine::{CounterpartyKey, Engine};
//! use ledger_engine::utils::MemoryStore;
//!
//! // The engine works over any TransactionStore implementation
//! // let engine = Engine::new(MemoryStore::new());
//! // let ledger = engine.build_ledger(&CounterpartyKey::Supplier("SUP001".into()), None).await?;
//! ```

pub mod classify;
pub mod engine;
pub mod ledger;
pub mod reconcile;
pub mod reports;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use classify::*;
pub use engine::*;
pub use ledger::*;
pub use reconcile::*;
pub use reports::*;
pub use traits::*;
pub use types::*;
