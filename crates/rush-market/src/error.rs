use std::fmt;

use rush_compose::ComposeError;
use rush_parts::PartsError;
use rush_types::{AccountId, Amount, CarId, PartId};
use serde::{Deserialize, Serialize};

/// A token the marketplace needs authority over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Asset {
    Car(CarId),
    Part(PartId),
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Car(id) => write!(f, "{id}"),
            Self::Part(id) => write!(f, "{id}"),
        }
    }
}

/// Errors from marketplace operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarketError {
    #[error("no listing for {0}")]
    ListingNotFound(CarId),

    #[error("listing for {0} is not active")]
    ListingInactive(CarId),

    #[error("{0} already has an active listing")]
    AlreadyListed(CarId),

    #[error("{account} does not own {asset}")]
    NotOwner { asset: Asset, account: AccountId },

    #[error("slot {slot} of {car} holds no part to bundle")]
    NotEquipped { car: CarId, slot: usize },

    #[error("slot {slot} of {car} no longer holds the part bundled at listing time")]
    BundleChanged { car: CarId, slot: usize },

    #[error("marketplace is not approved to transfer {0}")]
    TransferNotApproved(Asset),

    #[error("insufficient payment: required {required}, attached {attached}")]
    InsufficientPayment { required: Amount, attached: Amount },

    #[error("listing price must be positive")]
    InvalidPrice,

    #[error("protocol fee {0} bps exceeds 10000")]
    InvalidFeeBps(u16),

    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    #[error(transparent)]
    Compose(#[from] ComposeError),

    #[error(transparent)]
    Parts(#[from] PartsError),
}

/// Result alias for marketplace operations.
pub type MarketResult<T> = Result<T, MarketError>;
