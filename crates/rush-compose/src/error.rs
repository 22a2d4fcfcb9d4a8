use rush_parts::PartsError;
use rush_types::{AccountId, CarId, PartId, PartType};

/// Errors from composition operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComposeError {
    #[error("car not found: {0}")]
    CarNotFound(CarId),

    #[error("{account} does not own {car}")]
    NotOwner { car: CarId, account: AccountId },

    #[error("invalid composition: {0}")]
    InvalidComposition(String),

    #[error("type mismatch: slot takes {expected}, part is {found}")]
    TypeMismatch { expected: PartType, found: PartType },

    #[error("slot {slot} of {car} is already occupied")]
    SlotOccupied { car: CarId, slot: usize },

    #[error("{part} is not equipped to {car}")]
    NotEquipped { car: CarId, part: PartId },

    #[error("slot index {0} out of range")]
    InvalidSlot(usize),

    #[error("car id space exhausted")]
    IdExhausted,

    #[error(transparent)]
    Parts(#[from] PartsError),
}

/// Result alias for composition operations.
pub type ComposeResult<T> = Result<T, ComposeError>;
