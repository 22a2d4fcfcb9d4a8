use rush_compose::ComposeError;
use rush_market::MarketError;
use rush_parts::PartsError;
use rush_types::{AccountId, Amount};
use rush_workshop::WorkshopError;

/// Errors produced by ledger operations.
///
/// Component errors are wrapped unchanged, so callers can match the
/// original variant (`LedgerError::Compose(ComposeError::SlotOccupied { .. })`).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error(transparent)]
    Parts(#[from] PartsError),

    #[error(transparent)]
    Compose(#[from] ComposeError),

    #[error(transparent)]
    Market(#[from] MarketError),

    #[error(transparent)]
    Workshop(#[from] WorkshopError),

    #[error("insufficient payment: required {required}, attached {attached}")]
    InsufficientPayment { required: Amount, attached: Amount },

    #[error("insufficient funds in {account}: needed {needed}, available {available}")]
    InsufficientFunds {
        account: AccountId,
        needed: Amount,
        available: Amount,
    },

    #[error("treasury holds {available}, cannot withdraw {requested}")]
    InsufficientTreasury { requested: Amount, available: Amount },

    #[error("{0} is not the ledger operator")]
    Unauthorized(AccountId),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    #[error("ledger lock poisoned")]
    LockPoisoned,
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
