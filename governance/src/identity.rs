//! Identity registry — the authoritative set of verified members.
//!
//! Verification is binary: a member is either verified or not, and every
//! downstream eligibility check (proposal creation, delegation, voting
//! weight) consults this registry and only this registry. Records are
//! created on first verification and never deleted; revocation flips the
//! flag but keeps the history.

use crate::error::GovernanceError;
use lumen_types::{MemberAddress, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A member's verification record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub address: MemberAddress,
    pub verified: bool,
    /// When verification was first granted. Survives revocation.
    pub verified_at: Option<Timestamp>,
}

/// Registry of verified identities, mutated only by a single authority.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IdentityRegistry {
    /// The only address allowed to verify or revoke members.
    authority: MemberAddress,
    identities: HashMap<MemberAddress, IdentityRecord>,
}

impl IdentityRegistry {
    pub fn new(authority: MemberAddress) -> Self {
        Self {
            authority,
            identities: HashMap::new(),
        }
    }

    pub fn authority(&self) -> &MemberAddress {
        &self.authority
    }

    /// Mark a member as verified. Idempotent: re-verifying an already
    /// verified member succeeds without changing `verified_at`. Also used
    /// to restore a previously revoked member.
    pub fn verify(
        &mut self,
        caller: &MemberAddress,
        address: &MemberAddress,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        if caller != &self.authority {
            return Err(GovernanceError::Unauthorized);
        }
        let record = self
            .identities
            .entry(address.clone())
            .or_insert_with(|| IdentityRecord {
                address: address.clone(),
                verified: false,
                verified_at: None,
            });
        record.verified = true;
        if record.verified_at.is_none() {
            record.verified_at = Some(now);
        }
        tracing::info!(member = %address, at = %now, "identity verified");
        Ok(())
    }

    /// Revoke a member's verification. History is kept; the record stays.
    pub fn revoke(
        &mut self,
        caller: &MemberAddress,
        address: &MemberAddress,
    ) -> Result<(), GovernanceError> {
        if caller != &self.authority {
            return Err(GovernanceError::Unauthorized);
        }
        if let Some(record) = self.identities.get_mut(address) {
            record.verified = false;
            tracing::info!(member = %address, "identity revoked");
        }
        Ok(())
    }

    /// Pure lookup, no side effects. Unknown addresses are unverified.
    pub fn is_verified(&self, address: &MemberAddress) -> bool {
        self.identities
            .get(address)
            .map(|r| r.verified)
            .unwrap_or(false)
    }

    /// The record for a member, if one exists.
    pub fn get(&self, address: &MemberAddress) -> Option<&IdentityRecord> {
        self.identities.get(address)
    }

    /// Number of currently verified members.
    pub fn verified_count(&self) -> usize {
        self.identities.values().filter(|r| r.verified).count()
    }
}
