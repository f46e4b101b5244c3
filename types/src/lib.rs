//! Fundamental types for the Shoal fee network.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: account addresses, amounts, block numbers, burn rates, opaque
//! operator/validator identifiers, and network parameters.

pub mod address;
pub mod amount;
pub mod block;
pub mod id;
pub mod params;
pub mod rate;

pub use address::AccountAddress;
pub use amount::Amount;
pub use block::BlockNumber;
pub use id::{OperatorId, ValidatorId};
pub use params::NetworkParams;
pub use rate::BurnRate;
