use rush_types::{AccountId, PartId};

/// Errors from part registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PartsError {
    #[error("part not found: {0}")]
    PartNotFound(PartId),

    #[error("{account} does not own {part}")]
    NotOwner { part: PartId, account: AccountId },

    #[error("{0} is already equipped")]
    AlreadyEquipped(PartId),

    #[error("{0} is not equipped")]
    NotEquipped(PartId),

    #[error("stat value {value} exceeds maximum {max}")]
    InvalidStat { value: u8, max: u8 },

    #[error("part id space exhausted")]
    IdExhausted,
}

/// Result alias for part registry operations.
pub type PartsResult<T> = Result<T, PartsError>;
