//! Block number type used throughout the protocol.
//!
//! All accounting is block-driven: balances are a pure function of a
//! checkpoint plus the number of blocks elapsed since it. Nothing in the
//! engine ever iterates blocks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A chain block number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockNumber(u64);

impl BlockNumber {
    /// Block zero.
    pub const GENESIS: Self = Self(0);

    pub fn new(n: u64) -> Self {
        Self(n)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Blocks elapsed since this block (relative to `now`).
    /// Saturates to zero if `now` is earlier.
    pub fn elapsed_since(&self, now: BlockNumber) -> u64 {
        now.0.saturating_sub(self.0)
    }
}

impl fmt::Display for BlockNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
