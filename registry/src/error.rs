//! Registry-specific errors.

use shoal_types::{OperatorId, ValidatorId};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("operator {0} is not registered")]
    UnknownOperator(OperatorId),

    #[error("validator {0} is not registered")]
    UnknownValidator(ValidatorId),

    #[error("caller does not own operator {0}")]
    NotOperatorOwner(OperatorId),

    #[error("caller does not own validator {0}")]
    NotValidatorOwner(ValidatorId),

    #[error("fee increase from {current} to {requested} exceeds the allowed step of {max_increase}")]
    FeeIncreaseTooLarge {
        current: u128,
        requested: u128,
        max_increase: u128,
    },

    #[error("validator must be assigned at least one operator")]
    EmptyOperatorSet,
}
