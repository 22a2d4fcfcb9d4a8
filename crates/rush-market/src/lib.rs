//! Marketplace for the Speed Rush asset ledger.
//!
//! A listing offers a car together with any subset of its equipped parts at
//! a fixed price. Listing is cheap and unchecked against approvals; the buy
//! path re-validates ownership, slot contents, and transfer approvals at
//! purchase time and produces a [`PurchasePlan`]. The plan is applied only
//! after every check has passed, so a purchase either settles completely or
//! leaves no trace.

pub mod error;
pub mod listing;
pub mod market;

pub use error::{Asset, MarketError, MarketResult};
pub use listing::{Listing, ListingState};
pub use market::{ApprovalStatus, Marketplace, PurchasePlan, MAX_FEE_BPS};
