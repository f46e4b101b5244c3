//! The balance ledger — checkpoint store for every account.

use std::collections::HashMap;

use crate::account::AccountState;
use crate::error::LedgerError;
use serde::{Deserialize, Serialize};
use shoal_types::{AccountAddress, Amount, BlockNumber, BurnRate};

/// Checkpointed balances for every account that ever interacted with the
/// network.
///
/// Entries are created implicitly (zero balance, zero rate) on first touch
/// and never deleted: a liquidated account keeps its entry with zero
/// balance and zero owner-side rate until it deposits and re-registers.
///
/// Discipline: `settle` must run before any change to an account's burn
/// rate or checkpoint balance, so the old rate is only ever applied to the
/// interval during which it was actually in force. All mutating entry
/// points here follow that order internally.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BalanceLedger {
    accounts: HashMap<AccountAddress, AccountState>,
}

impl BalanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored checkpoint state, if the account has ever been touched.
    pub fn account(&self, account: &AccountAddress) -> Option<&AccountState> {
        self.accounts.get(account)
    }

    /// The account's current net burn rate (zero for untouched accounts).
    pub fn burn_rate(&self, account: &AccountAddress) -> BurnRate {
        self.accounts
            .get(account)
            .map(|s| s.burn_rate)
            .unwrap_or(BurnRate::ZERO)
    }

    /// Read-only balance projection at `at`. Equals exactly what `settle`
    /// would persist; calling it never mutates state.
    pub fn balance_of(
        &self,
        account: &AccountAddress,
        at: BlockNumber,
    ) -> Result<Amount, LedgerError> {
        match self.accounts.get(account) {
            Some(state) => state.balance_at(at),
            None => Ok(Amount::ZERO),
        }
    }

    /// Take a checkpoint: persist `balance_at(at)` and move the checkpoint
    /// block to `at`. Returns the settled balance.
    pub fn settle(
        &mut self,
        account: &AccountAddress,
        at: BlockNumber,
    ) -> Result<Amount, LedgerError> {
        let state = self
            .accounts
            .entry(account.clone())
            .or_insert_with(|| AccountState::new(at));
        let settled = state.balance_at(at)?;
        state.balance_at_checkpoint = settled;
        state.checkpoint_block = at;
        Ok(settled)
    }

    /// Settle, then replace the account's burn rate. The only path by
    /// which rates change.
    pub fn set_burn_rate(
        &mut self,
        account: &AccountAddress,
        rate: BurnRate,
        at: BlockNumber,
    ) -> Result<(), LedgerError> {
        self.settle(account, at)?;
        self.accounts
            .get_mut(account)
            .expect("settle created the entry")
            .burn_rate = rate;
        Ok(())
    }

    /// Settle, then credit `amount`.
    pub fn deposit(
        &mut self,
        account: &AccountAddress,
        amount: Amount,
        at: BlockNumber,
    ) -> Result<(), LedgerError> {
        // Guards before any write: the projected balance and the credited
        // total are both computed on the read-only path first.
        let settled = self.balance_of(account, at)?;
        let credited = settled.checked_add(amount).ok_or(LedgerError::Overflow)?;
        let state = self
            .accounts
            .entry(account.clone())
            .or_insert_with(|| AccountState::new(at));
        state.balance_at_checkpoint = credited;
        state.checkpoint_block = at;
        Ok(())
    }

    /// Settle, then debit `amount`.
    ///
    /// For a draining account the remainder must stay at or above the
    /// liquidation threshold (`rate × window`): a withdrawal is never
    /// allowed to push a borderline payer into eligibility. For other
    /// accounts the only requirement is `amount ≤ balance`. On failure
    /// nothing is written.
    pub fn withdraw(
        &mut self,
        account: &AccountAddress,
        amount: Amount,
        at: BlockNumber,
        window_blocks: u64,
    ) -> Result<(), LedgerError> {
        let settled = self.balance_of(account, at)?;
        let threshold = self
            .burn_rate(account)
            .liquidation_threshold(window_blocks)
            .ok_or(LedgerError::Overflow)?;
        let needed = amount.checked_add(threshold).ok_or(LedgerError::Overflow)?;
        if settled < needed {
            return Err(LedgerError::InsufficientBalance {
                needed: needed.raw(),
                available: settled.raw(),
            });
        }
        let state = self
            .accounts
            .entry(account.clone())
            .or_insert_with(|| AccountState::new(at));
        state.balance_at_checkpoint = settled - amount;
        state.checkpoint_block = at;
        Ok(())
    }

    /// Settle both sides and move the whole of `from`'s balance to `to`.
    /// Returns the transferred amount. `from == to` settles and moves
    /// nothing.
    pub fn transfer_all(
        &mut self,
        from: &AccountAddress,
        to: &AccountAddress,
        at: BlockNumber,
    ) -> Result<Amount, LedgerError> {
        let amount = self.settle(from, at)?;
        if from == to {
            return Ok(amount);
        }
        let to_settled = self.settle(to, at)?;
        let credited = to_settled.checked_add(amount).ok_or(LedgerError::Overflow)?;
        self.accounts
            .get_mut(to)
            .expect("settle created the entry")
            .balance_at_checkpoint = credited;
        self.accounts
            .get_mut(from)
            .expect("settle created the entry")
            .balance_at_checkpoint = Amount::ZERO;
        Ok(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> AccountAddress {
        AccountAddress::new(format!("shl_{:0>40}", n))
    }

    fn block(n: u64) -> BlockNumber {
        BlockNumber::new(n)
    }

    #[test]
    fn untouched_account_has_zero_balance_and_rate() {
        let ledger = BalanceLedger::new();
        assert_eq!(ledger.balance_of(&addr(1), block(100)).unwrap(), Amount::ZERO);
        assert_eq!(ledger.burn_rate(&addr(1)), BurnRate::ZERO);
        assert!(ledger.account(&addr(1)).is_none());
    }

    #[test]
    fn deposit_then_drain() {
        let mut ledger = BalanceLedger::new();
        let a = addr(1);
        ledger.deposit(&a, Amount::new(10_000), block(0)).unwrap();
        ledger.set_burn_rate(&a, BurnRate::new(10), block(0)).unwrap();

        assert_eq!(ledger.balance_of(&a, block(99)).unwrap(), Amount::new(9_010));
        assert_eq!(ledger.balance_of(&a, block(1000)).unwrap(), Amount::ZERO);
    }

    #[test]
    fn balance_of_matches_settle() {
        let mut ledger = BalanceLedger::new();
        let a = addr(1);
        ledger.deposit(&a, Amount::new(5_000), block(10)).unwrap();
        ledger.set_burn_rate(&a, BurnRate::new(7), block(10)).unwrap();

        let read = ledger.balance_of(&a, block(310)).unwrap();
        let settled = ledger.settle(&a, block(310)).unwrap();
        assert_eq!(read, settled);
        assert_eq!(ledger.account(&a).unwrap().checkpoint_block, block(310));
        // Settling again at the same block changes nothing.
        assert_eq!(ledger.settle(&a, block(310)).unwrap(), settled);
    }

    #[test]
    fn rate_change_applies_old_rate_to_old_interval() {
        let mut ledger = BalanceLedger::new();
        let a = addr(1);
        ledger.deposit(&a, Amount::new(10_000), block(0)).unwrap();
        ledger.set_burn_rate(&a, BurnRate::new(10), block(0)).unwrap();
        // 100 blocks at 10, then the rate halves.
        ledger.set_burn_rate(&a, BurnRate::new(5), block(100)).unwrap();

        // 10_000 − 10×100 − 5×100 = 8_500
        assert_eq!(ledger.balance_of(&a, block(200)).unwrap(), Amount::new(8_500));
    }

    #[test]
    fn withdraw_keeps_safety_margin_for_payers() {
        let mut ledger = BalanceLedger::new();
        let a = addr(1);
        ledger.deposit(&a, Amount::new(1_000), block(0)).unwrap();
        ledger.set_burn_rate(&a, BurnRate::new(10), block(0)).unwrap();

        // Threshold at window 50 is 500; only 500 of the 1000 is free.
        let err = ledger.withdraw(&a, Amount::new(600), block(0), 50).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientBalance {
                needed: 1_100,
                available: 1_000,
            }
        );
        // Nothing moved on failure.
        assert_eq!(ledger.balance_of(&a, block(0)).unwrap(), Amount::new(1_000));

        ledger.withdraw(&a, Amount::new(500), block(0), 50).unwrap();
        assert_eq!(ledger.balance_of(&a, block(0)).unwrap(), Amount::new(500));
    }

    #[test]
    fn withdraw_without_drain_only_needs_funds() {
        let mut ledger = BalanceLedger::new();
        let a = addr(1);
        ledger.deposit(&a, Amount::new(300), block(5)).unwrap();

        ledger.withdraw(&a, Amount::new(300), block(5), 50).unwrap();
        assert_eq!(ledger.balance_of(&a, block(5)).unwrap(), Amount::ZERO);

        let err = ledger.withdraw(&a, Amount::new(1), block(5), 50).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
    }

    #[test]
    fn earner_balance_grows_and_withdraws_freely() {
        let mut ledger = BalanceLedger::new();
        let a = addr(1);
        ledger.set_burn_rate(&a, BurnRate::new(-4), block(0)).unwrap();

        assert_eq!(ledger.balance_of(&a, block(100)).unwrap(), Amount::new(400));
        ledger.withdraw(&a, Amount::new(400), block(100), 50).unwrap();
        assert_eq!(ledger.balance_of(&a, block(100)).unwrap(), Amount::ZERO);
    }

    #[test]
    fn transfer_all_conserves_value() {
        let mut ledger = BalanceLedger::new();
        let (a, b) = (addr(1), addr(2));
        ledger.deposit(&a, Amount::new(900), block(0)).unwrap();
        ledger.set_burn_rate(&a, BurnRate::new(4), block(0)).unwrap();
        ledger.deposit(&b, Amount::new(100), block(0)).unwrap();

        // At block 100 a has 900 − 400 = 500.
        let moved = ledger.transfer_all(&a, &b, block(100)).unwrap();
        assert_eq!(moved, Amount::new(500));
        assert_eq!(ledger.balance_of(&a, block(100)).unwrap(), Amount::ZERO);
        assert_eq!(ledger.balance_of(&b, block(100)).unwrap(), Amount::new(600));
    }

    #[test]
    fn transfer_all_to_self_is_a_settle() {
        let mut ledger = BalanceLedger::new();
        let a = addr(1);
        ledger.deposit(&a, Amount::new(250), block(0)).unwrap();

        let moved = ledger.transfer_all(&a, &a, block(10)).unwrap();
        assert_eq!(moved, Amount::new(250));
        assert_eq!(ledger.balance_of(&a, block(10)).unwrap(), Amount::new(250));
    }
}
