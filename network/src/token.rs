//! Token adapter — the external value-transfer seam.
//!
//! The token itself (transfer/approve semantics, custody) lives outside the
//! accounting engine. The facade calls `credit_external_deposit` before it
//! credits the ledger and `debit_external_withdrawal` after a withdrawal's
//! guards have passed.

use shoal_types::{AccountAddress, Amount};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("external token transfer failed: {0}")]
    TransferFailed(String),
}

/// Moves value between the external token and the ledger.
pub trait TokenAdapter {
    /// Pull `amount` from `account`'s external holdings into the network.
    fn credit_external_deposit(
        &mut self,
        account: &AccountAddress,
        amount: Amount,
    ) -> Result<(), TokenError>;

    /// Push `amount` from the network back to `account`'s external holdings.
    fn debit_external_withdrawal(
        &mut self,
        account: &AccountAddress,
        amount: Amount,
    ) -> Result<(), TokenError>;
}

/// Deterministic no-op adapter for tests: always succeeds, tallies flows.
#[derive(Clone, Debug, Default)]
pub struct NullToken {
    pub total_deposited: u128,
    pub total_withdrawn: u128,
}

impl NullToken {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenAdapter for NullToken {
    fn credit_external_deposit(
        &mut self,
        _account: &AccountAddress,
        amount: Amount,
    ) -> Result<(), TokenError> {
        self.total_deposited = self.total_deposited.saturating_add(amount.raw());
        Ok(())
    }

    fn debit_external_withdrawal(
        &mut self,
        _account: &AccountAddress,
        amount: Amount,
    ) -> Result<(), TokenError> {
        self.total_withdrawn = self.total_withdrawn.saturating_add(amount.raw());
        Ok(())
    }
}
