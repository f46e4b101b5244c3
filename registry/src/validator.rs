//! Validator records.

use serde::{Deserialize, Serialize};
use shoal_types::{AccountAddress, OperatorId, ValidatorId};

/// A registered validator: owned by a paying account, serviced by an
/// ordered set of operators.
///
/// Only active validators contribute to burn-rate computation. Liquidation
/// deactivates every validator the target owns; the record itself persists.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Validator {
    pub id: ValidatorId,
    pub owner: AccountAddress,
    /// Assigned operators, in registration order.
    pub operators: Vec<OperatorId>,
    pub active: bool,
}
