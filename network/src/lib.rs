//! The network facade: every public operation of the fee network as one
//! indivisible transition over the registry + ledger pair.
//!
//! The facade owns the settle-before-rate-change discipline: any operation
//! that changes a rate input (registration, assignment update, fee update,
//! activation, liquidation) first settles every account whose rate the
//! change touches, then mutates the registry, then refreshes the settled
//! accounts' rates from the mutated registry. Validation runs before the
//! first write, so a failed operation leaves no partial state.

pub mod error;
pub mod network;
pub mod token;

pub use error::NetworkError;
pub use network::FeeNetwork;
pub use token::{NullToken, TokenAdapter, TokenError};
