use rush_types::{AccountId, Amount, CarId, PartId, SLOT_COUNT};
use serde::{Deserialize, Serialize};

/// Lifecycle of a listing. Only `Active` listings can be bought or cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ListingState {
    Active,
    Settled { buyer: AccountId },
    Cancelled,
}

/// An offer to sell a car, optionally bundled with some of its equipped parts.
///
/// `part_ids` records which part sat in each bundled slot when the listing was
/// made; the buyer receives exactly those parts or the purchase fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub car_id: CarId,
    pub seller: AccountId,
    pub price: Amount,
    pub include_slots: [bool; SLOT_COUNT],
    pub part_ids: [Option<PartId>; SLOT_COUNT],
    pub state: ListingState,
}

impl Listing {
    pub fn is_active(&self) -> bool {
        self.state == ListingState::Active
    }

    /// The bundled parts, as `(slot, part)` pairs.
    pub fn bundled(&self) -> impl Iterator<Item = (usize, PartId)> + '_ {
        self.part_ids
            .iter()
            .enumerate()
            .filter_map(|(slot, part)| part.map(|part| (slot, part)))
    }
}
