//! `FeeNetwork` — the public contract of the accounting engine.

use std::collections::BTreeSet;

use crate::error::NetworkError;
use crate::token::TokenAdapter;
use shoal_ledger::{burn_rate_of, BalanceLedger, LedgerError};
use shoal_registry::{FeeRegistry, RegistryError};
use shoal_types::{
    AccountAddress, Amount, BlockNumber, BurnRate, NetworkParams, OperatorId, ValidatorId,
};

/// The fee network: registry + ledger + token seam, driven as a single
/// sequential ledger. One call = one atomic transition; there is no
/// internal parallelism and no partial settlement.
pub struct FeeNetwork<T: TokenAdapter> {
    registry: FeeRegistry,
    ledger: BalanceLedger,
    params: NetworkParams,
    token: T,
}

impl<T: TokenAdapter> FeeNetwork<T> {
    pub fn new(params: NetworkParams, token: T) -> Self {
        Self {
            registry: FeeRegistry::new(),
            ledger: BalanceLedger::new(),
            params,
            token,
        }
    }

    pub fn params(&self) -> &NetworkParams {
        &self.params
    }

    pub fn registry(&self) -> &FeeRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &BalanceLedger {
        &self.ledger
    }

    pub fn token(&self) -> &T {
        &self.token
    }

    // ── Queries ──────────────────────────────────────────────────────────

    /// The account's balance as of `at`. Read-only.
    pub fn total_balance_of(
        &self,
        account: &AccountAddress,
        at: BlockNumber,
    ) -> Result<Amount, NetworkError> {
        Ok(self.ledger.balance_of(account, at)?)
    }

    /// The account's net per-block rate, derived from current registry
    /// state.
    pub fn burn_rate(&self, account: &AccountAddress) -> Result<BurnRate, NetworkError> {
        Ok(burn_rate_of(&self.registry, account)?)
    }

    /// Whether the account currently meets the liquidation predicate.
    pub fn liquidatable(
        &self,
        account: &AccountAddress,
        at: BlockNumber,
    ) -> Result<bool, NetworkError> {
        Ok(shoal_ledger::liquidatable(
            &self.registry,
            &self.ledger,
            account,
            at,
            &self.params,
        )?)
    }

    // ── Deposits and withdrawals ─────────────────────────────────────────

    /// Pull `amount` from the external token and credit the account.
    pub fn deposit(
        &mut self,
        account: &AccountAddress,
        amount: Amount,
        at: BlockNumber,
    ) -> Result<(), NetworkError> {
        self.token.credit_external_deposit(account, amount)?;
        self.ledger.deposit(account, amount, at)?;
        Ok(())
    }

    /// Debit the account and push `amount` back to the external token.
    /// A draining account must keep its safety margin; see
    /// [`BalanceLedger::withdraw`].
    pub fn withdraw(
        &mut self,
        account: &AccountAddress,
        amount: Amount,
        at: BlockNumber,
    ) -> Result<(), NetworkError> {
        self.ledger.withdraw(
            account,
            amount,
            at,
            self.params.minimum_blocks_before_liquidation,
        )?;
        self.token.debit_external_withdrawal(account, amount)?;
        Ok(())
    }

    // ── Registration ─────────────────────────────────────────────────────

    /// Register an operator. No account's rate changes until a validator
    /// assigns it, so nothing needs settling.
    pub fn register_operator(
        &mut self,
        owner: &AccountAddress,
        fee_per_block: Amount,
    ) -> OperatorId {
        self.registry.register_operator(owner.clone(), fee_per_block)
    }

    /// Update an operator's fee.
    ///
    /// Every account whose rate prices in this fee — the operator's owner
    /// and the owner of each validator assigning it — is settled under the
    /// old fee before the new one takes effect.
    pub fn update_operator_fee(
        &mut self,
        caller: &AccountAddress,
        id: OperatorId,
        new_fee: Amount,
        at: BlockNumber,
    ) -> Result<(), NetworkError> {
        // Guards first so a rejected update leaves no trace.
        self.registry.authorize_fee_update(
            caller,
            id,
            new_fee,
            self.params.operator_max_fee_increase,
        )?;

        let affected = self.operator_stakeholders(id)?;
        self.settle_all(&affected, at)?;
        self.registry
            .update_operator_fee(caller, id, new_fee, self.params.operator_max_fee_increase)?;
        self.refresh_rates(&affected, at)
    }

    /// Register a validator, optionally depositing alongside.
    ///
    /// The owner must come out of the registration solvent: the balance
    /// (including the riding deposit) must cover the new rate across the
    /// safety window, otherwise the whole operation fails before anything
    /// mutates.
    pub fn register_validator(
        &mut self,
        owner: &AccountAddress,
        operators: Vec<OperatorId>,
        deposit: Amount,
        at: BlockNumber,
    ) -> Result<ValidatorId, NetworkError> {
        if operators.is_empty() {
            return Err(RegistryError::EmptyOperatorSet.into());
        }
        let added = self.operator_fee_sum(&operators)?;
        let prospective = self.prospective_rate(owner, added)?;
        self.ensure_solvent(owner, prospective, deposit, at)?;

        if !deposit.is_zero() {
            self.deposit(owner, deposit, at)?;
        }

        let mut affected = BTreeSet::new();
        affected.insert(owner.clone());
        for op in &operators {
            affected.insert(self.registry.operator_owner(*op)?.clone());
        }
        self.settle_all(&affected, at)?;
        let id = self.registry.register_validator(owner.clone(), operators)?;
        self.refresh_rates(&affected, at)?;
        Ok(id)
    }

    /// Replace a validator's operator assignment, optionally depositing
    /// alongside. Same solvency guard as registration.
    pub fn update_validator(
        &mut self,
        caller: &AccountAddress,
        id: ValidatorId,
        operators: Vec<OperatorId>,
        deposit: Amount,
        at: BlockNumber,
    ) -> Result<(), NetworkError> {
        if operators.is_empty() {
            return Err(RegistryError::EmptyOperatorSet.into());
        }
        if self.registry.validator_owner(id)? != caller {
            return Err(RegistryError::NotValidatorOwner(id).into());
        }
        let old_operators: Vec<OperatorId> = self.registry.validator_operators(id)?.to_vec();
        // Summing the fees also proves every new id exists; it must run
        // before the deposit so a rejected update leaves no partial state.
        let new_sum = self.operator_fee_sum(&operators)?;
        // An inactive validator prices into nobody's rate; the swap is then
        // rate-neutral and needs no solvency check.
        let delta = if self.registry.is_validator_active(id)? {
            new_sum
                .checked_sub(self.operator_fee_sum(&old_operators)?)
                .ok_or(LedgerError::Overflow)?
        } else {
            0
        };
        let prospective = self.prospective_rate(caller, delta)?;
        self.ensure_solvent(caller, prospective, deposit, at)?;

        if !deposit.is_zero() {
            self.deposit(caller, deposit, at)?;
        }

        let mut affected = BTreeSet::new();
        affected.insert(caller.clone());
        for op in old_operators.iter().chain(operators.iter()) {
            affected.insert(self.registry.operator_owner(*op)?.clone());
        }
        self.settle_all(&affected, at)?;
        self.registry.update_validator_operators(caller, id, operators)?;
        self.refresh_rates(&affected, at)
    }

    /// Deactivate a validator: its fees stop pricing into anyone's rate
    /// from `at` forward.
    pub fn deactivate_validator(
        &mut self,
        caller: &AccountAddress,
        id: ValidatorId,
        at: BlockNumber,
    ) -> Result<(), NetworkError> {
        if self.registry.validator_owner(id)? != caller {
            return Err(RegistryError::NotValidatorOwner(id).into());
        }
        let affected = self.validator_stakeholders(id)?;
        self.settle_all(&affected, at)?;
        self.registry.set_validator_active(id, false)?;
        self.refresh_rates(&affected, at)
    }

    /// Reactivate a validator, optionally depositing alongside. The owner
    /// must be solvent under the restored rate.
    pub fn activate_validator(
        &mut self,
        caller: &AccountAddress,
        id: ValidatorId,
        deposit: Amount,
        at: BlockNumber,
    ) -> Result<(), NetworkError> {
        if self.registry.validator_owner(id)? != caller {
            return Err(RegistryError::NotValidatorOwner(id).into());
        }
        let delta = if self.registry.is_validator_active(id)? {
            0
        } else {
            let operators: Vec<OperatorId> = self.registry.validator_operators(id)?.to_vec();
            self.operator_fee_sum(&operators)?
        };
        let prospective = self.prospective_rate(caller, delta)?;
        self.ensure_solvent(caller, prospective, deposit, at)?;

        if !deposit.is_zero() {
            self.deposit(caller, deposit, at)?;
        }

        let affected = self.validator_stakeholders(id)?;
        self.settle_all(&affected, at)?;
        self.registry.set_validator_active(id, true)?;
        self.refresh_rates(&affected, at)
    }

    /// Remove a validator record entirely.
    pub fn remove_validator(
        &mut self,
        caller: &AccountAddress,
        id: ValidatorId,
        at: BlockNumber,
    ) -> Result<(), NetworkError> {
        if self.registry.validator_owner(id)? != caller {
            return Err(RegistryError::NotValidatorOwner(id).into());
        }
        let affected = self.validator_stakeholders(id)?;
        self.settle_all(&affected, at)?;
        self.registry.remove_validator(caller, id)?;
        self.refresh_rates(&affected, at)
    }

    // ── Liquidation ──────────────────────────────────────────────────────

    /// Liquidate `target`, awarding its remaining balance to `caller`.
    pub fn liquidate(
        &mut self,
        target: &AccountAddress,
        caller: &AccountAddress,
        at: BlockNumber,
    ) -> Result<Amount, NetworkError> {
        let reward = shoal_ledger::liquidate(
            &mut self.registry,
            &mut self.ledger,
            target,
            caller,
            at,
            &self.params,
        )?;
        tracing::info!(
            account = %target,
            liquidator = %caller,
            reward = reward.raw(),
            block = at.as_u64(),
            "account liquidated"
        );
        Ok(reward)
    }

    /// Batch liquidation in caller-supplied order; ineligible targets are
    /// skipped without error. Returns the targets actually liquidated.
    pub fn liquidate_all(
        &mut self,
        targets: &[AccountAddress],
        caller: &AccountAddress,
        at: BlockNumber,
    ) -> Result<Vec<(AccountAddress, Amount)>, NetworkError> {
        let executed = shoal_ledger::liquidate_all(
            &mut self.registry,
            &mut self.ledger,
            targets,
            caller,
            at,
            &self.params,
        )?;
        for (target, reward) in &executed {
            tracing::info!(
                account = %target,
                liquidator = %caller,
                reward = reward.raw(),
                block = at.as_u64(),
                "account liquidated"
            );
        }
        tracing::debug!(
            requested = targets.len(),
            executed = executed.len(),
            block = at.as_u64(),
            "batch liquidation pass complete"
        );
        Ok(executed)
    }

    // ── Internals ────────────────────────────────────────────────────────

    fn operator_fee_sum(&self, operators: &[OperatorId]) -> Result<i128, NetworkError> {
        let mut sum: i128 = 0;
        for op in operators {
            let fee = self.registry.operator_fee(*op)?.raw();
            let fee = i128::try_from(fee).map_err(|_| LedgerError::Overflow)?;
            sum = sum.checked_add(fee).ok_or(LedgerError::Overflow)?;
        }
        Ok(sum)
    }

    fn prospective_rate(
        &self,
        account: &AccountAddress,
        delta: i128,
    ) -> Result<BurnRate, NetworkError> {
        let current = burn_rate_of(&self.registry, account)?.net();
        let net = current.checked_add(delta).ok_or(LedgerError::Overflow)?;
        Ok(BurnRate::new(net))
    }

    /// The post-operation balance (`incoming` rides along) must cover the
    /// prospective rate across the safety window.
    fn ensure_solvent(
        &self,
        account: &AccountAddress,
        rate: BurnRate,
        incoming: Amount,
        at: BlockNumber,
    ) -> Result<(), NetworkError> {
        if !rate.is_draining() {
            return Ok(());
        }
        let threshold = rate
            .liquidation_threshold(self.params.minimum_blocks_before_liquidation)
            .ok_or(LedgerError::Overflow)?;
        let available = self
            .ledger
            .balance_of(account, at)?
            .checked_add(incoming)
            .ok_or(LedgerError::Overflow)?;
        if available < threshold {
            return Err(LedgerError::InsufficientBalance {
                needed: threshold.raw(),
                available: available.raw(),
            }
            .into());
        }
        Ok(())
    }

    /// Validator owner plus the owner of every assigned operator.
    fn validator_stakeholders(
        &self,
        id: ValidatorId,
    ) -> Result<BTreeSet<AccountAddress>, NetworkError> {
        let mut stakeholders = BTreeSet::new();
        stakeholders.insert(self.registry.validator_owner(id)?.clone());
        for op in self.registry.validator_operators(id)? {
            stakeholders.insert(self.registry.operator_owner(*op)?.clone());
        }
        Ok(stakeholders)
    }

    /// Operator owner plus the owner of every validator assigning it.
    fn operator_stakeholders(
        &self,
        id: OperatorId,
    ) -> Result<BTreeSet<AccountAddress>, NetworkError> {
        let mut stakeholders = BTreeSet::new();
        stakeholders.insert(self.registry.operator_owner(id)?.clone());
        let validators: Vec<ValidatorId> = self.registry.validators_assigning(id).collect();
        for v in validators {
            stakeholders.insert(self.registry.validator_owner(v)?.clone());
        }
        Ok(stakeholders)
    }

    fn settle_all(
        &mut self,
        accounts: &BTreeSet<AccountAddress>,
        at: BlockNumber,
    ) -> Result<(), NetworkError> {
        for account in accounts {
            self.ledger.settle(account, at)?;
        }
        Ok(())
    }

    fn refresh_rates(
        &mut self,
        accounts: &BTreeSet<AccountAddress>,
        at: BlockNumber,
    ) -> Result<(), NetworkError> {
        for account in accounts {
            let rate = burn_rate_of(&self.registry, account)?;
            self.ledger.set_burn_rate(account, rate, at)?;
        }
        Ok(())
    }
}
