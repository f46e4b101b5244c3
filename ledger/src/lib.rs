//! The balance accounting engine.
//!
//! Balances are a deterministic function of block numbers, not of per-block
//! updates: `balance(a, n) = checkpoint(a) − rate(a) × (n − checkpoint_block(a))`,
//! clamped at zero for a net payer.
//!
//! This crate handles:
//! - Checkpointed balance computation and settlement
//! - Burn-rate derivation from current registry state
//! - Deposit/withdraw with the liquidation safety margin
//! - Single and batch liquidation

pub mod account;
pub mod error;
pub mod ledger;
pub mod liquidation;
pub mod rate;

pub use account::AccountState;
pub use error::LedgerError;
pub use ledger::BalanceLedger;
pub use liquidation::{liquidatable, liquidate, liquidate_all};
pub use rate::burn_rate_of;
