//! Per-account checkpoint state.

use crate::error::LedgerError;
use serde::{Deserialize, Serialize};
use shoal_types::{Amount, BlockNumber, BurnRate};

/// The checkpoint tuple for one account.
///
/// `balance_at_checkpoint` was exactly correct at `checkpoint_block`;
/// `burn_rate` has been in force since then. Every balance read projects
/// forward from here — nothing is written per block.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccountState {
    pub balance_at_checkpoint: Amount,
    pub checkpoint_block: BlockNumber,
    pub burn_rate: BurnRate,
}

impl AccountState {
    /// A fresh entry: zero balance, zero rate, checkpointed now.
    pub fn new(at: BlockNumber) -> Self {
        Self {
            balance_at_checkpoint: Amount::ZERO,
            checkpoint_block: at,
            burn_rate: BurnRate::ZERO,
        }
    }

    /// Project the balance forward to `at`.
    ///
    /// A draining rate clamps at zero once the charge would cross it: the
    /// engine does not reconstruct the exact crossing block, it treats the
    /// account as having hit zero and stayed there. A negative (earning)
    /// rate credits with checked arithmetic. Multiplication or addition
    /// overflow is fatal, never wrapped.
    pub fn balance_at(&self, at: BlockNumber) -> Result<Amount, LedgerError> {
        let elapsed = self.checkpoint_block.elapsed_since(at) as u128;
        if self.burn_rate.is_draining() {
            let charge = self
                .burn_rate
                .drain_per_block()
                .checked_mul(elapsed)
                .ok_or(LedgerError::Overflow)?;
            Ok(self.balance_at_checkpoint.saturating_sub(Amount::new(charge)))
        } else {
            let earned = self
                .burn_rate
                .earn_per_block()
                .checked_mul(elapsed)
                .ok_or(LedgerError::Overflow)?;
            self.balance_at_checkpoint
                .checked_add(Amount::new(earned))
                .ok_or(LedgerError::Overflow)
        }
    }
}
