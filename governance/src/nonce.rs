//! Per-member replay protection.
//!
//! One strictly increasing counter per member, starting at 0, never reset.
//! A vote payload must present the exact next expected nonce, not merely an
//! unused one: this rejects both replays and out-of-order gaps that would
//! desynchronize signer and settlement state. The counter is global per
//! member, not per proposal: wallets track a single counter across all
//! proposals, and existing signers depend on that wire semantic.

use crate::error::GovernanceError;
use lumen_types::MemberAddress;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Ledger of per-member nonce counters.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NonceLedger {
    nonces: HashMap<MemberAddress, u64>,
}

impl NonceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next expected nonce for a member. Unknown members start at 0.
    pub fn current_nonce(&self, address: &MemberAddress) -> u64 {
        self.nonces.get(address).copied().unwrap_or(0)
    }

    /// Read-only check that `presented` is the exact next expected nonce.
    pub fn check(&self, address: &MemberAddress, presented: u64) -> Result<(), GovernanceError> {
        let expected = self.current_nonce(address);
        if presented != expected {
            return Err(GovernanceError::NonceMismatch { expected, presented });
        }
        Ok(())
    }

    /// Consume the presented nonce, incrementing the counter by exactly 1.
    pub fn consume(&mut self, address: &MemberAddress, presented: u64) -> Result<(), GovernanceError> {
        self.check(address, presented)?;
        self.nonces.insert(address.clone(), presented + 1);
        Ok(())
    }
}
