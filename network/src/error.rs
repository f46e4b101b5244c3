//! Facade-level error aggregation.

use crate::token::TokenError;
use shoal_ledger::LedgerError;
use shoal_registry::RegistryError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NetworkError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

impl NetworkError {
    /// Whether this is a caller-recoverable validation failure (retry only
    /// makes sense after a state change: more blocks, a deposit).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            NetworkError::Ledger(
                LedgerError::InsufficientBalance { .. } | LedgerError::NotLiquidatable(_)
            ) | NetworkError::Registry(_)
        )
    }
}
