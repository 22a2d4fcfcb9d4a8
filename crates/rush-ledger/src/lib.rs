//! Transactional facade for the Speed Rush asset ledger.
//!
//! This crate ties the component crates together into one serialized
//! ledger. It provides:
//! - [`Ledger`], the shared entry point holding all state behind one lock
//! - [`LedgerState`], the serializable state and its all-or-nothing operations
//! - [`Bank`], native-currency balances and the treasury
//! - [`Journal`], a hash-linked log of committed operations with validation
//! - [`invariants::check`], a from-scratch audit of slot and index consistency

pub mod bank;
pub mod config;
pub mod error;
pub mod invariants;
pub mod journal;
pub mod ledger;
pub mod state;

pub use bank::{Bank, Pot, Transfer};
pub use config::LedgerConfig;
pub use error::{LedgerError, LedgerResult};
pub use invariants::{InvariantKind, InvariantReport, InvariantViolation};
pub use journal::{
    Authority, Journal, JournalEntry, LedgerEvent, ValidationReport, Violation, ViolationKind,
};
pub use ledger::Ledger;
pub use state::LedgerState;
