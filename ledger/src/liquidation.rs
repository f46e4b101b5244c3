//! Liquidation: eligibility predicate and execution.
//!
//! Eligibility is derived, never stored. "Liquidated" is really "no active
//! owned validators": the owner-side rate drops to zero with the validator
//! set, so the `rate > 0` guard alone makes a second liquidation fail.

use std::collections::BTreeSet;

use crate::error::LedgerError;
use crate::ledger::BalanceLedger;
use crate::rate::burn_rate_of;
use shoal_registry::FeeRegistry;
use shoal_types::{AccountAddress, Amount, BlockNumber, NetworkParams, ValidatorId};

/// The eligibility predicate, recomputed from current balance and rate:
///
/// `rate > 0 ∧ balance(at) < rate × minimum_blocks_before_liquidation`
pub fn liquidatable(
    registry: &FeeRegistry,
    ledger: &BalanceLedger,
    account: &AccountAddress,
    at: BlockNumber,
    params: &NetworkParams,
) -> Result<bool, LedgerError> {
    let rate = burn_rate_of(registry, account)?;
    if !rate.is_draining() {
        return Ok(false);
    }
    let threshold = rate
        .liquidation_threshold(params.minimum_blocks_before_liquidation)
        .ok_or(LedgerError::Overflow)?;
    Ok(ledger.balance_of(account, at)? < threshold)
}

/// Liquidate `target`, awarding its remaining balance to `caller`.
///
/// Fails with `NotLiquidatable` (and mutates nothing) unless the predicate
/// holds. Otherwise: every account whose rate the deactivation touches is
/// settled at `at` before the rate inputs change, the target's validators
/// are deactivated through the registry, rates are recomputed, and the
/// whole settled target balance moves to `caller` — a closed transfer.
///
/// Returns the transferred reward.
pub fn liquidate(
    registry: &mut FeeRegistry,
    ledger: &mut BalanceLedger,
    target: &AccountAddress,
    caller: &AccountAddress,
    at: BlockNumber,
    params: &NetworkParams,
) -> Result<Amount, LedgerError> {
    if !liquidatable(registry, ledger, target, at, params)? {
        return Err(LedgerError::NotLiquidatable(target.clone()));
    }
    execute(registry, ledger, target, caller, at)
}

/// Batch liquidation over a caller-supplied, order-preserving target list.
///
/// Targets for which the predicate is false at their turn — already
/// liquidated, or never eligible — are skipped without error, which makes
/// repeated batch calls safe. An operator-earner appearing late in the
/// list may see its balance grow from earlier targets' fees before its own
/// predicate is evaluated; the caller-supplied order is authoritative.
///
/// Returns the targets actually liquidated with their rewards.
pub fn liquidate_all(
    registry: &mut FeeRegistry,
    ledger: &mut BalanceLedger,
    targets: &[AccountAddress],
    caller: &AccountAddress,
    at: BlockNumber,
    params: &NetworkParams,
) -> Result<Vec<(AccountAddress, Amount)>, LedgerError> {
    let mut executed = Vec::new();
    for target in targets {
        if !liquidatable(registry, ledger, target, at, params)? {
            continue;
        }
        let reward = execute(registry, ledger, target, caller, at)?;
        executed.push((target.clone(), reward));
    }
    Ok(executed)
}

/// The liquidation state transition. Guards have already passed; from here
/// every step is infallible short of fatal overflow.
fn execute(
    registry: &mut FeeRegistry,
    ledger: &mut BalanceLedger,
    target: &AccountAddress,
    caller: &AccountAddress,
    at: BlockNumber,
) -> Result<Amount, LedgerError> {
    let doomed: Vec<ValidatorId> = registry
        .validators_owned_by(target)
        .filter(|v| matches!(registry.is_validator_active(*v), Ok(true)))
        .collect();

    // Everyone whose rate changes when these validators go dark: the target
    // and the owner of every assigned operator.
    let mut affected: BTreeSet<AccountAddress> = BTreeSet::new();
    affected.insert(target.clone());
    for validator in &doomed {
        for operator in registry.validator_operators(*validator)? {
            affected.insert(registry.operator_owner(*operator)?.clone());
        }
    }

    // Settle under the old rates, then mutate the registry, then refresh.
    for account in &affected {
        ledger.settle(account, at)?;
    }
    for validator in doomed {
        registry.set_validator_active(validator, false)?;
    }
    for account in &affected {
        let rate = burn_rate_of(registry, account)?;
        ledger.set_burn_rate(account, rate, at)?;
    }

    ledger.transfer_all(target, caller, at)
}
