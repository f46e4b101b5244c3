//! Burn-rate derivation from registry state.

use crate::error::LedgerError;
use shoal_registry::FeeRegistry;
use shoal_types::{AccountAddress, BurnRate};

/// Compute an account's net per-block burn rate from current registry
/// state.
///
/// Outgoing: the fee of every operator assigned to each active validator
/// the account owns. Incoming: the account's own operator fees, each
/// multiplied by the number of active validators assigning that operator.
/// Net = outgoing − incoming.
///
/// Pure read of the registry — no caching. Callers recompute whenever a
/// validator's active flag, an operator assignment, or an operator fee
/// changes; stale rates silently misprice the elapsed interval.
pub fn burn_rate_of(
    registry: &FeeRegistry,
    account: &AccountAddress,
) -> Result<BurnRate, LedgerError> {
    let mut net: i128 = 0;

    for validator in registry.validators_owned_by(account) {
        if !registry.is_validator_active(validator)? {
            continue;
        }
        for operator in registry.validator_operators(validator)? {
            let fee = registry.operator_fee(*operator)?.raw();
            let fee = i128::try_from(fee).map_err(|_| LedgerError::Overflow)?;
            net = net.checked_add(fee).ok_or(LedgerError::Overflow)?;
        }
    }

    for operator in registry.operators_owned_by(account) {
        let active_assignments = registry
            .validators_assigning(operator.id)
            .filter(|v| matches!(registry.is_validator_active(*v), Ok(true)))
            .count();
        let fee = i128::try_from(operator.fee_per_block.raw()).map_err(|_| LedgerError::Overflow)?;
        let earned = fee
            .checked_mul(active_assignments as i128)
            .ok_or(LedgerError::Overflow)?;
        net = net.checked_sub(earned).ok_or(LedgerError::Overflow)?;
    }

    Ok(BurnRate::new(net))
}
