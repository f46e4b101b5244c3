//! Network parameters shared by every node.

use serde::{Deserialize, Serialize};

/// Network-wide accounting parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NetworkParams {
    /// The safety window, in blocks, that every net payer must keep prepaid.
    /// An account becomes liquidatable once its balance is projected to run
    /// out within this many blocks.
    pub minimum_blocks_before_liquidation: u64,

    /// Maximum raw-unit increase an operator may apply to its fee in a
    /// single update.
    pub operator_max_fee_increase: u128,
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self {
            minimum_blocks_before_liquidation: 50,
            operator_max_fee_increase: 10,
        }
    }
}
