//! Composition engine for the Speed Rush asset ledger.
//!
//! A car is a slot table with one socket per [`PartType`](rush_types::PartType).
//! The engine owns the car table and drives every equip, unequip, and
//! replace transition against a [`PartRegistry`](rush_parts::PartRegistry),
//! keeping the car's slots and each part's equipped flag in agreement.
//! Combined stats are never stored; they are recomputed from the slot table
//! on every read.

pub mod engine;
pub mod error;
pub mod stats;

pub use engine::{
    Car, CarComposition, CompositionEngine, FullCarMetadata, SlotPart, DEFAULT_MAX_CONDITION,
};
pub use error::{ComposeError, ComposeResult};
pub use stats::{CombinedStats, CompactCarStats};
