//! Account address type with `shl_` prefix.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A Shoal account address, always prefixed with `shl_`.
///
/// An account may simultaneously own validators (paying fees) and operators
/// (earning fees); the address is the ledger key for both roles.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountAddress(String);

impl AccountAddress {
    /// The standard prefix for all Shoal account addresses.
    pub const PREFIX: &'static str = "shl_";

    /// Create a new account address from a raw string.
    ///
    /// # Panics
    /// Panics if the string does not start with `shl_`.
    pub fn new(raw: impl Into<String>) -> Self {
        let s = raw.into();
        assert!(s.starts_with(Self::PREFIX), "address must start with shl_");
        Self(s)
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate that this address is well-formed.
    pub fn is_valid(&self) -> bool {
        self.0.starts_with(Self::PREFIX) && self.0.len() > Self::PREFIX.len()
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AccountAddress {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_address_roundtrip() {
        let a = AccountAddress::new("shl_alice");
        assert_eq!(a.as_str(), "shl_alice");
        assert!(a.is_valid());
    }

    #[test]
    #[should_panic(expected = "address must start with shl_")]
    fn rejects_missing_prefix() {
        AccountAddress::new("alice");
    }

    #[test]
    fn bare_prefix_is_not_valid() {
        let a = AccountAddress::new("shl_");
        assert!(!a.is_valid());
    }
}
