//! Foundation types for the Speed Rush asset ledger.
//!
//! This crate provides the identity and structural types shared by every
//! other `rush-*` crate.
//!
//! # Key Types
//!
//! - [`AccountId`]: BLAKE3-derived account identity
//! - [`PartId`] / [`CarId`]: monotonically allocated token identifiers
//! - [`PartType`]: the three part kinds, each bound to one car slot
//! - [`PartSpec`] / [`MintCarRequest`]: caller- or generator-supplied mint parameters
//! - [`Amount`]: integer smallest-unit native currency amount

pub mod account;
pub mod error;
pub mod ids;
pub mod part;

pub use account::{AccountId, AccountMaterial};
pub use error::TypeError;
pub use ids::{CarId, PartId};
pub use part::{MintCarRequest, PartSpec, PartType, SLOT_COUNT};

/// Native currency amount in the host ledger's smallest unit.
pub type Amount = u128;
