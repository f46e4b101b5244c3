//! The fee registry store.

use std::collections::{BTreeSet, HashMap};

use crate::error::RegistryError;
use crate::operator::Operator;
use crate::validator::Validator;
use serde::{Deserialize, Serialize};
use shoal_types::{AccountAddress, Amount, OperatorId, ValidatorId};

/// Operator and validator records plus the index maps the burn-rate
/// calculator queries.
///
/// Index sets are `BTreeSet` so iteration order is deterministic across
/// runs; the engine's batch operations rely on stable ordering.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FeeRegistry {
    next_operator_id: u64,
    next_validator_id: u64,
    operators: HashMap<OperatorId, Operator>,
    validators: HashMap<ValidatorId, Validator>,
    /// Account → validators it owns (active and inactive).
    owned_validators: HashMap<AccountAddress, BTreeSet<ValidatorId>>,
    /// Operator → validators assigning it (active and inactive).
    assigning_validators: HashMap<OperatorId, BTreeSet<ValidatorId>>,
}

impl FeeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Registration ─────────────────────────────────────────────────────

    /// Register a new operator owned by `owner` charging `fee_per_block`.
    pub fn register_operator(&mut self, owner: AccountAddress, fee_per_block: Amount) -> OperatorId {
        let id = OperatorId::new(self.next_operator_id);
        self.next_operator_id += 1;
        self.operators.insert(
            id,
            Operator {
                id,
                owner,
                fee_per_block,
            },
        );
        self.assigning_validators.entry(id).or_default();
        id
    }

    /// Validate a fee update without applying it: the caller must own the
    /// operator, and a single update may not raise the fee by more than
    /// `max_increase` raw units. Callers that need to settle accounts
    /// before the fee changes run this first.
    pub fn authorize_fee_update(
        &self,
        caller: &AccountAddress,
        id: OperatorId,
        new_fee: Amount,
        max_increase: u128,
    ) -> Result<(), RegistryError> {
        let op = self
            .operators
            .get(&id)
            .ok_or(RegistryError::UnknownOperator(id))?;
        if op.owner != *caller {
            return Err(RegistryError::NotOperatorOwner(id));
        }
        let increase = new_fee.raw().saturating_sub(op.fee_per_block.raw());
        if increase > max_increase {
            return Err(RegistryError::FeeIncreaseTooLarge {
                current: op.fee_per_block.raw(),
                requested: new_fee.raw(),
                max_increase,
            });
        }
        Ok(())
    }

    /// Update an operator's fee, enforcing the [`authorize_fee_update`]
    /// rules.
    ///
    /// [`authorize_fee_update`]: FeeRegistry::authorize_fee_update
    pub fn update_operator_fee(
        &mut self,
        caller: &AccountAddress,
        id: OperatorId,
        new_fee: Amount,
        max_increase: u128,
    ) -> Result<(), RegistryError> {
        self.authorize_fee_update(caller, id, new_fee, max_increase)?;
        self.operators
            .get_mut(&id)
            .expect("authorization checked existence")
            .fee_per_block = new_fee;
        Ok(())
    }

    /// Register a new validator owned by `owner`, serviced by `operators`,
    /// initially active. Every operator id must already be registered.
    pub fn register_validator(
        &mut self,
        owner: AccountAddress,
        operators: Vec<OperatorId>,
    ) -> Result<ValidatorId, RegistryError> {
        if operators.is_empty() {
            return Err(RegistryError::EmptyOperatorSet);
        }
        for op in &operators {
            if !self.operators.contains_key(op) {
                return Err(RegistryError::UnknownOperator(*op));
            }
        }
        let id = ValidatorId::new(self.next_validator_id);
        self.next_validator_id += 1;
        for op in &operators {
            self.assigning_validators.entry(*op).or_default().insert(id);
        }
        self.owned_validators
            .entry(owner.clone())
            .or_default()
            .insert(id);
        self.validators.insert(
            id,
            Validator {
                id,
                owner,
                operators,
                active: true,
            },
        );
        Ok(id)
    }

    /// Replace a validator's operator assignment. Owner-only.
    pub fn update_validator_operators(
        &mut self,
        caller: &AccountAddress,
        id: ValidatorId,
        operators: Vec<OperatorId>,
    ) -> Result<(), RegistryError> {
        if operators.is_empty() {
            return Err(RegistryError::EmptyOperatorSet);
        }
        for op in &operators {
            if !self.operators.contains_key(op) {
                return Err(RegistryError::UnknownOperator(*op));
            }
        }
        let validator = self
            .validators
            .get(&id)
            .ok_or(RegistryError::UnknownValidator(id))?;
        if validator.owner != *caller {
            return Err(RegistryError::NotValidatorOwner(id));
        }
        let old = validator.operators.clone();
        for op in &old {
            if let Some(set) = self.assigning_validators.get_mut(op) {
                set.remove(&id);
            }
        }
        for op in &operators {
            self.assigning_validators.entry(*op).or_default().insert(id);
        }
        self.validators
            .get_mut(&id)
            .expect("validator existence checked above")
            .operators = operators;
        Ok(())
    }

    /// Remove a validator entirely, dropping its index entries. Owner-only.
    pub fn remove_validator(
        &mut self,
        caller: &AccountAddress,
        id: ValidatorId,
    ) -> Result<(), RegistryError> {
        let validator = self
            .validators
            .get(&id)
            .ok_or(RegistryError::UnknownValidator(id))?;
        if validator.owner != *caller {
            return Err(RegistryError::NotValidatorOwner(id));
        }
        let validator = self.validators.remove(&id).expect("checked above");
        for op in &validator.operators {
            if let Some(set) = self.assigning_validators.get_mut(op) {
                set.remove(&id);
            }
        }
        if let Some(set) = self.owned_validators.get_mut(&validator.owner) {
            set.remove(&id);
        }
        Ok(())
    }

    /// Flip a validator's active flag. Idempotent: setting the current
    /// state again is a no-op.
    pub fn set_validator_active(
        &mut self,
        id: ValidatorId,
        active: bool,
    ) -> Result<(), RegistryError> {
        let validator = self
            .validators
            .get_mut(&id)
            .ok_or(RegistryError::UnknownValidator(id))?;
        validator.active = active;
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub fn operator_fee(&self, id: OperatorId) -> Result<Amount, RegistryError> {
        self.operators
            .get(&id)
            .map(|op| op.fee_per_block)
            .ok_or(RegistryError::UnknownOperator(id))
    }

    pub fn operator_owner(&self, id: OperatorId) -> Result<&AccountAddress, RegistryError> {
        self.operators
            .get(&id)
            .map(|op| &op.owner)
            .ok_or(RegistryError::UnknownOperator(id))
    }

    pub fn validator_operators(&self, id: ValidatorId) -> Result<&[OperatorId], RegistryError> {
        self.validators
            .get(&id)
            .map(|v| v.operators.as_slice())
            .ok_or(RegistryError::UnknownValidator(id))
    }

    pub fn validator_owner(&self, id: ValidatorId) -> Result<&AccountAddress, RegistryError> {
        self.validators
            .get(&id)
            .map(|v| &v.owner)
            .ok_or(RegistryError::UnknownValidator(id))
    }

    pub fn is_validator_active(&self, id: ValidatorId) -> Result<bool, RegistryError> {
        self.validators
            .get(&id)
            .map(|v| v.active)
            .ok_or(RegistryError::UnknownValidator(id))
    }

    /// All validators owned by `account`, active or not. Empty for unknown
    /// accounts — ownership is implicit, there is no account registration.
    pub fn validators_owned_by(
        &self,
        account: &AccountAddress,
    ) -> impl Iterator<Item = ValidatorId> + '_ {
        self.owned_validators
            .get(account)
            .into_iter()
            .flatten()
            .copied()
    }

    /// All validators assigning `operator`, active or not.
    pub fn validators_assigning(
        &self,
        operator: OperatorId,
    ) -> impl Iterator<Item = ValidatorId> + '_ {
        self.assigning_validators
            .get(&operator)
            .into_iter()
            .flatten()
            .copied()
    }

    /// All operators owned by `account`.
    pub fn operators_owned_by(
        &self,
        account: &AccountAddress,
    ) -> impl Iterator<Item = &Operator> + '_ {
        let account = account.clone();
        self.operators.values().filter(move |op| op.owner == account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> AccountAddress {
        AccountAddress::new(format!("shl_{:0>40}", n))
    }

    fn registry_with_operators(fees: &[u128]) -> (FeeRegistry, Vec<OperatorId>) {
        let mut reg = FeeRegistry::new();
        let ids = fees
            .iter()
            .enumerate()
            .map(|(i, fee)| reg.register_operator(addr(100 + i as u8), Amount::new(*fee)))
            .collect();
        (reg, ids)
    }

    #[test]
    fn register_and_query_operator() {
        let (reg, ids) = registry_with_operators(&[1, 2, 3]);
        assert_eq!(reg.operator_fee(ids[1]), Ok(Amount::new(2)));
        assert_eq!(reg.operator_owner(ids[0]), Ok(&addr(100)));
    }

    #[test]
    fn unknown_operator_is_an_error() {
        let reg = FeeRegistry::new();
        let missing = OperatorId::new(42);
        assert_eq!(
            reg.operator_fee(missing),
            Err(RegistryError::UnknownOperator(missing))
        );
    }

    #[test]
    fn register_validator_builds_indexes() {
        let (mut reg, ops) = registry_with_operators(&[1, 2]);
        let owner = addr(1);
        let v = reg.register_validator(owner.clone(), ops.clone()).unwrap();

        assert!(reg.is_validator_active(v).unwrap());
        assert_eq!(reg.validator_operators(v).unwrap(), ops.as_slice());
        assert_eq!(reg.validators_owned_by(&owner).collect::<Vec<_>>(), vec![v]);
        assert_eq!(reg.validators_assigning(ops[0]).collect::<Vec<_>>(), vec![v]);
        assert_eq!(reg.validators_assigning(ops[1]).collect::<Vec<_>>(), vec![v]);
    }

    #[test]
    fn register_validator_rejects_unknown_operator() {
        let mut reg = FeeRegistry::new();
        let missing = OperatorId::new(7);
        assert_eq!(
            reg.register_validator(addr(1), vec![missing]),
            Err(RegistryError::UnknownOperator(missing))
        );
    }

    #[test]
    fn register_validator_rejects_empty_set() {
        let mut reg = FeeRegistry::new();
        assert_eq!(
            reg.register_validator(addr(1), vec![]),
            Err(RegistryError::EmptyOperatorSet)
        );
    }

    #[test]
    fn update_operators_reindexes() {
        let (mut reg, ops) = registry_with_operators(&[1, 2, 3]);
        let owner = addr(1);
        let v = reg
            .register_validator(owner.clone(), vec![ops[0], ops[1]])
            .unwrap();

        reg.update_validator_operators(&owner, v, vec![ops[1], ops[2]])
            .unwrap();

        assert_eq!(reg.validators_assigning(ops[0]).count(), 0);
        assert_eq!(reg.validators_assigning(ops[1]).collect::<Vec<_>>(), vec![v]);
        assert_eq!(reg.validators_assigning(ops[2]).collect::<Vec<_>>(), vec![v]);
    }

    #[test]
    fn update_operators_owner_only() {
        let (mut reg, ops) = registry_with_operators(&[1]);
        let v = reg.register_validator(addr(1), ops.clone()).unwrap();
        assert_eq!(
            reg.update_validator_operators(&addr(2), v, ops),
            Err(RegistryError::NotValidatorOwner(v))
        );
    }

    #[test]
    fn remove_validator_drops_indexes() {
        let (mut reg, ops) = registry_with_operators(&[1, 2]);
        let owner = addr(1);
        let v = reg.register_validator(owner.clone(), ops.clone()).unwrap();

        reg.remove_validator(&owner, v).unwrap();

        assert_eq!(
            reg.is_validator_active(v),
            Err(RegistryError::UnknownValidator(v))
        );
        assert_eq!(reg.validators_owned_by(&owner).count(), 0);
        assert_eq!(reg.validators_assigning(ops[0]).count(), 0);
    }

    #[test]
    fn deactivate_flips_flag_and_keeps_record() {
        let (mut reg, ops) = registry_with_operators(&[1]);
        let owner = addr(1);
        let v = reg.register_validator(owner.clone(), ops).unwrap();

        reg.set_validator_active(v, false).unwrap();
        assert!(!reg.is_validator_active(v).unwrap());
        // Record and indexes survive deactivation.
        assert_eq!(reg.validators_owned_by(&owner).collect::<Vec<_>>(), vec![v]);

        // Idempotent.
        reg.set_validator_active(v, false).unwrap();
        assert!(!reg.is_validator_active(v).unwrap());
    }

    #[test]
    fn fee_update_respects_max_increase() {
        let mut reg = FeeRegistry::new();
        let owner = addr(1);
        let id = reg.register_operator(owner.clone(), Amount::new(5));

        // +10 is allowed, +11 is not.
        reg.update_operator_fee(&owner, id, Amount::new(15), 10).unwrap();
        assert_eq!(
            reg.update_operator_fee(&owner, id, Amount::new(26), 10),
            Err(RegistryError::FeeIncreaseTooLarge {
                current: 15,
                requested: 26,
                max_increase: 10,
            })
        );
        // Decreases are unrestricted.
        reg.update_operator_fee(&owner, id, Amount::new(1), 10).unwrap();
        assert_eq!(reg.operator_fee(id), Ok(Amount::new(1)));
    }

    #[test]
    fn authorize_fee_update_is_check_only() {
        let mut reg = FeeRegistry::new();
        let owner = addr(1);
        let id = reg.register_operator(owner.clone(), Amount::new(5));

        reg.authorize_fee_update(&owner, id, Amount::new(15), 10).unwrap();
        // Authorization alone changes nothing.
        assert_eq!(reg.operator_fee(id), Ok(Amount::new(5)));

        assert_eq!(
            reg.authorize_fee_update(&owner, id, Amount::new(16), 10),
            Err(RegistryError::FeeIncreaseTooLarge {
                current: 5,
                requested: 16,
                max_increase: 10,
            })
        );
        assert_eq!(
            reg.authorize_fee_update(&addr(2), id, Amount::new(6), 10),
            Err(RegistryError::NotOperatorOwner(id))
        );
    }

    #[test]
    fn fee_update_owner_only() {
        let mut reg = FeeRegistry::new();
        let id = reg.register_operator(addr(1), Amount::new(5));
        assert_eq!(
            reg.update_operator_fee(&addr(2), id, Amount::new(6), 10),
            Err(RegistryError::NotOperatorOwner(id))
        );
    }

    #[test]
    fn operators_owned_by_filters_on_owner() {
        let mut reg = FeeRegistry::new();
        let a = addr(1);
        let b = addr(2);
        reg.register_operator(a.clone(), Amount::new(1));
        reg.register_operator(b.clone(), Amount::new(2));
        reg.register_operator(a.clone(), Amount::new(3));

        let mut fees: Vec<u128> = reg.operators_owned_by(&a).map(|o| o.fee_per_block.raw()).collect();
        fees.sort_unstable();
        assert_eq!(fees, vec![1, 3]);
    }
}
