//! Vote delegation — entrust voting power to a representative.
//!
//! Delegation is strictly single-hop: a delegator's own base weight moves
//! to its delegatee, but weight received from others is never forwarded.
//! This keeps `weight_of` at O(in-degree) with no graph traversal, which
//! matters because weight is recomputed on every settled vote. The only
//! possible cycle under single-hop semantics is the two-cycle (`A→B` while
//! `B→A`), rejected at write time.

use crate::error::GovernanceError;
use crate::identity::IdentityRegistry;
use lumen_types::MemberAddress;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// The delegation graph: at most one outgoing edge per member.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DelegationGraph {
    /// delegator → delegatee.
    edges: HashMap<MemberAddress, MemberAddress>,
    /// Reverse index: delegatee → set of direct delegators.
    #[serde(skip)]
    reverse: HashMap<MemberAddress, HashSet<MemberAddress>>,
}

impl DelegationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or replace the outgoing edge for `from`.
    ///
    /// Only verified members may delegate, and only to verified delegatees.
    pub fn delegate(
        &mut self,
        registry: &IdentityRegistry,
        from: &MemberAddress,
        to: &MemberAddress,
    ) -> Result<(), GovernanceError> {
        if !registry.is_verified(from) {
            return Err(GovernanceError::Unverified(from.to_string()));
        }
        if from == to {
            return Err(GovernanceError::SelfDelegation);
        }
        if !registry.is_verified(to) {
            return Err(GovernanceError::UnverifiedDelegatee(to.to_string()));
        }
        if self.edges.get(to) == Some(from) {
            return Err(GovernanceError::DelegationCycle);
        }

        self.remove_edge(from);
        self.edges.insert(from.clone(), to.clone());
        self.reverse
            .entry(to.clone())
            .or_default()
            .insert(from.clone());
        tracing::info!(delegator = %from, delegatee = %to, "delegation set");
        Ok(())
    }

    /// Remove the outgoing edge for `from`, restoring it to self-voting.
    pub fn clear_delegation(&mut self, from: &MemberAddress) {
        if self.remove_edge(from) {
            tracing::info!(delegator = %from, "delegation cleared");
        }
    }

    /// The direct delegatee for a member, if any.
    pub fn delegate_of(&self, from: &MemberAddress) -> Option<&MemberAddress> {
        self.edges.get(from)
    }

    /// Effective voting weight for a member.
    ///
    /// A member that has delegated away retains no base weight; weight
    /// received from delegators stays put regardless.
    pub fn weight_of(&self, registry: &IdentityRegistry, address: &MemberAddress) -> u64 {
        let own = if registry.is_verified(address) && !self.edges.contains_key(address) {
            1
        } else {
            0
        };
        let received = self
            .reverse
            .get(address)
            .map(|delegators| {
                delegators
                    .iter()
                    .filter(|d| registry.is_verified(d))
                    .count() as u64
            })
            .unwrap_or(0);
        own + received
    }

    /// All members that directly delegated to `delegatee`.
    pub fn delegators_of(&self, delegatee: &MemberAddress) -> Vec<&MemberAddress> {
        self.reverse
            .get(delegatee)
            .map(|s| s.iter().collect())
            .unwrap_or_default()
    }

    /// Rebuild the reverse index from the forward edges.
    ///
    /// The reverse index is skipped during serialization; snapshot loading
    /// calls this after deserializing the forward map.
    pub(crate) fn rebuild_reverse_index(&mut self) {
        self.reverse.clear();
        for (from, to) in &self.edges {
            self.reverse
                .entry(to.clone())
                .or_default()
                .insert(from.clone());
        }
    }

    fn remove_edge(&mut self, from: &MemberAddress) -> bool {
        if let Some(old_to) = self.edges.remove(from) {
            if let Some(set) = self.reverse.get_mut(&old_to) {
                set.remove(from);
                if set.is_empty() {
                    self.reverse.remove(&old_to);
                }
            }
            true
        } else {
            false
        }
    }
}
