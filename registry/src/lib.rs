//! Fee registry — the record store the accounting engine reads and drives.
//!
//! Holds operator records (fee rate per block, owning account) and validator
//! records (owning account, ordered operator assignment, active flag), plus
//! the index maps the burn-rate calculator needs: who owns which validators
//! and which validators assign a given operator.
//!
//! The registry knows nothing about balances. Rate-affecting mutations are
//! expected to be funneled through the network facade so affected accounts
//! are settled before the rate inputs change.

pub mod error;
pub mod operator;
pub mod registry;
pub mod validator;

pub use error::RegistryError;
pub use operator::Operator;
pub use registry::FeeRegistry;
pub use validator::Validator;
