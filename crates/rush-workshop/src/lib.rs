//! Satellite services of the Speed Rush asset ledger.
//!
//! - [`Workshop`]: paid repairs that restore a car's condition, and race
//!   wear applied by the race authority.
//! - [`Leaderboard`]: best score per car with a fixed tie-break (the score
//!   achieved first ranks higher).

pub mod error;
pub mod leaderboard;
pub mod workshop;

pub use error::{WorkshopError, WorkshopResult};
pub use leaderboard::{Leaderboard, ScoreEntry};
pub use workshop::{RepairReceipt, Workshop};
