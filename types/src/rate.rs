//! Net per-block burn rate.

use crate::amount::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An account's net per-block balance delta.
///
/// Positive = net payer (balance drains), negative or zero = net earner or
/// neutral (balance grows or holds). The rate is the difference of two
/// roles: fees owed for the account's active validators, minus fees earned
/// as an operator across the validators assigning it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BurnRate(i128);

impl BurnRate {
    pub const ZERO: Self = Self(0);

    pub fn new(net: i128) -> Self {
        Self(net)
    }

    pub fn net(&self) -> i128 {
        self.0
    }

    /// Whether the account is a net payer (balance shrinks as blocks pass).
    pub fn is_draining(&self) -> bool {
        self.0 > 0
    }

    /// Raw units drained per block, zero for net earners.
    pub fn drain_per_block(&self) -> u128 {
        if self.0 > 0 {
            self.0 as u128
        } else {
            0
        }
    }

    /// Raw units earned per block, zero for net payers.
    pub fn earn_per_block(&self) -> u128 {
        if self.0 < 0 {
            self.0.unsigned_abs()
        } else {
            0
        }
    }

    /// The minimum balance a draining account must hold to stay solvent:
    /// `rate × window` blocks of prepaid fees. `None` on multiply overflow;
    /// zero for non-draining accounts.
    pub fn liquidation_threshold(&self, window_blocks: u64) -> Option<Amount> {
        if !self.is_draining() {
            return Some(Amount::ZERO);
        }
        self.drain_per_block()
            .checked_mul(window_blocks as u128)
            .map(Amount::new)
    }
}

impl fmt::Display for BurnRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/block", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payer_rate_drains() {
        let r = BurnRate::new(10);
        assert!(r.is_draining());
        assert_eq!(r.drain_per_block(), 10);
        assert_eq!(r.earn_per_block(), 0);
    }

    #[test]
    fn earner_rate_grows() {
        let r = BurnRate::new(-7);
        assert!(!r.is_draining());
        assert_eq!(r.drain_per_block(), 0);
        assert_eq!(r.earn_per_block(), 7);
    }

    #[test]
    fn threshold_is_rate_times_window() {
        let r = BurnRate::new(10);
        assert_eq!(r.liquidation_threshold(50), Some(Amount::new(500)));
    }

    #[test]
    fn threshold_zero_for_non_payer() {
        assert_eq!(BurnRate::ZERO.liquidation_threshold(50), Some(Amount::ZERO));
        assert_eq!(BurnRate::new(-3).liquidation_threshold(50), Some(Amount::ZERO));
    }

    #[test]
    fn threshold_overflow_is_none() {
        let r = BurnRate::new(i128::MAX);
        assert_eq!(r.liquidation_threshold(u64::MAX), None);
    }
}
