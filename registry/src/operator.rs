//! Operator records.

use serde::{Deserialize, Serialize};
use shoal_types::{AccountAddress, Amount, OperatorId};

/// A registered operator: services validators for a per-block fee.
///
/// Earnings accrue to the owner's ledger account; the registry only stores
/// the rate and the ownership link.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Operator {
    pub id: OperatorId,
    pub owner: AccountAddress,
    /// Fee charged per serviced validator per block, in raw units.
    pub fee_per_block: Amount,
}
