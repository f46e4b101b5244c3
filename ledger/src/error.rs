//! Ledger-specific errors.

use shoal_registry::RegistryError;
use shoal_types::AccountAddress;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient balance: need {needed}, available {available}")]
    InsufficientBalance { needed: u128, available: u128 },

    #[error("account {0} is not liquidatable")]
    NotLiquidatable(AccountAddress),

    #[error("arithmetic overflow in balance computation")]
    Overflow,

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
