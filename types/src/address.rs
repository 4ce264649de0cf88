//! Member address type with `lmn_` prefix.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A Lumen member address, always prefixed with `lmn_`.
///
/// Derived from the member's Ed25519 public key via Blake2b hashing
/// (see `lumen_crypto::derive_address`). The address is the principal
/// identifier everywhere in the engine: identity records, delegation
/// edges, nonce counters, and proposals are all keyed by it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberAddress(String);

impl MemberAddress {
    /// The standard prefix for all Lumen member addresses.
    pub const PREFIX: &'static str = "lmn_";

    /// Create a member address from a raw string.
    ///
    /// # Panics
    /// Panics if the string does not start with `lmn_`.
    pub fn new(raw: impl Into<String>) -> Self {
        let s = raw.into();
        assert!(s.starts_with(Self::PREFIX), "address must start with lmn_");
        Self(s)
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this address is well-formed at the surface level.
    ///
    /// Checksum validation lives in `lumen_crypto::validate_address`.
    pub fn is_well_formed(&self) -> bool {
        self.0.starts_with(Self::PREFIX) && self.0.len() > Self::PREFIX.len()
    }
}

impl fmt::Display for MemberAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MemberAddress {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
