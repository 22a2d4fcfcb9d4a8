//! Part registry for the Speed Rush asset ledger.
//!
//! Parts are individually owned tokens with type-scoped stats. The registry
//! owns the authoritative part table and keeps four per-owner index
//! partitions (all, by type, equipped, unequipped) in step with it on every
//! mint, equip flip, and transfer, so owner queries never scan the table.
//!
//! The [`TokenIndex`] and [`Approvals`] building blocks are generic over the
//! token id and are reused by the car side of the ledger.

pub mod approval;
pub mod error;
pub mod index;
pub mod registry;

pub use approval::Approvals;
pub use error::{PartsError, PartsResult};
pub use index::{OwnerParts, TokenIndex};
pub use registry::{OwnerPartsDetails, Part, PartRegistry};
