//! Bincode persistence snapshot of the full engine state.
//!
//! The durable layout mirrors the logical one: three member-keyed maps
//! (identity, delegation, nonce) and one proposal-keyed map, plus the
//! domain and the activity log. The delegation reverse index is derived
//! state and is rebuilt on load rather than persisted.

use crate::delegation::DelegationGraph;
use crate::identity::IdentityRegistry;
use crate::nonce::NonceLedger;
use crate::proposal::ProposalStore;
use crate::settlement::{SettlementEngine, VoteDomain, VoteRecord};
use serde::{Deserialize, Serialize};

/// Serializable image of a settlement engine.
#[derive(Serialize, Deserialize)]
pub struct GovernanceSnapshot {
    pub domain: VoteDomain,
    pub identities: IdentityRegistry,
    pub delegations: DelegationGraph,
    pub proposals: ProposalStore,
    pub nonces: NonceLedger,
    pub activity: Vec<VoteRecord>,
}

impl SettlementEngine {
    /// Serialize the engine state to bytes.
    pub fn save_state(&self) -> Result<Vec<u8>, bincode::Error> {
        let (domain, identities, delegations, proposals, nonces, activity) = self.parts();
        let snapshot = GovernanceSnapshot {
            domain: domain.clone(),
            identities: identities.clone(),
            delegations: delegations.clone(),
            proposals: proposals.clone(),
            nonces: nonces.clone(),
            activity: activity.to_vec(),
        };
        bincode::serialize(&snapshot)
    }

    /// Restore an engine from serialized bytes.
    pub fn load_state(data: &[u8]) -> Result<Self, bincode::Error> {
        let snapshot: GovernanceSnapshot = bincode::deserialize(data)?;
        Ok(Self::from_parts(
            snapshot.domain,
            snapshot.identities,
            snapshot.delegations,
            snapshot.proposals,
            snapshot.nonces,
            snapshot.activity,
        ))
    }
}
