use rush_compose::ComposeError;
use rush_types::{AccountId, Amount, CarId};

/// Errors from workshop and leaderboard operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkshopError {
    #[error("{0} is not authorized for this operation")]
    Unauthorized(AccountId),

    #[error("{account} does not own {car}")]
    NotOwner { car: CarId, account: AccountId },

    #[error("insufficient payment: required {required}, attached {attached}")]
    InsufficientPayment { required: Amount, attached: Amount },

    #[error(transparent)]
    Compose(#[from] ComposeError),
}

/// Result alias for workshop and leaderboard operations.
pub type WorkshopResult<T> = Result<T, WorkshopError>;
