//! Proposals, vote options, and the proposal store.

use crate::error::GovernanceError;
use crate::identity::IdentityRegistry;
use lumen_types::{MemberAddress, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Monotonic proposal identifier, assigned at creation starting from 1.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ProposalId(pub u64);

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of vote options.
///
/// A closed enum rather than an open integer: an unknown option is a
/// compile-time-checked illegal state, not a silently accepted tally bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteOption {
    For,
    Against,
    Abstain,
}

impl VoteOption {
    /// Stable wire tag for canonical digest encoding.
    pub fn wire_tag(&self) -> u8 {
        match self {
            Self::For => 0,
            Self::Against => 1,
            Self::Abstain => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::For => "for",
            Self::Against => "against",
            Self::Abstain => "abstain",
        }
    }
}

/// A governance proposal with its per-option tallies.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub proposer: MemberAddress,
    pub description: String,
    /// Opaque content-addressed reference (e.g. an IPFS CID) to the full
    /// proposal artifact. Never resolved or validated by the engine.
    pub artifact_ref: String,
    pub votes_for: u64,
    pub votes_against: u64,
    pub votes_abstain: u64,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub executed: bool,
}

impl Proposal {
    /// Current tally for one option.
    pub fn tally(&self, option: VoteOption) -> u64 {
        match option {
            VoteOption::For => self.votes_for,
            VoteOption::Against => self.votes_against,
            VoteOption::Abstain => self.votes_abstain,
        }
    }

    /// Whether the voting window is open at `now`.
    pub fn is_open(&self, now: Timestamp) -> bool {
        !self.executed && now < self.end_time
    }

    fn add_weight(&mut self, option: VoteOption, weight: u64) {
        let slot = match option {
            VoteOption::For => &mut self.votes_for,
            VoteOption::Against => &mut self.votes_against,
            VoteOption::Abstain => &mut self.votes_abstain,
        };
        *slot = slot.saturating_add(weight);
    }
}

/// Owner of all proposal records and their tallies. Proposals are never
/// deleted; ids are assigned monotonically.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProposalStore {
    proposals: BTreeMap<ProposalId, Proposal>,
    next_id: u64,
}

impl Default for ProposalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProposalStore {
    pub fn new() -> Self {
        Self {
            proposals: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Create a proposal. The creator must be verified and the voting
    /// window non-empty.
    pub fn create(
        &mut self,
        registry: &IdentityRegistry,
        creator: &MemberAddress,
        description: String,
        artifact_ref: String,
        duration_secs: u64,
        now: Timestamp,
    ) -> Result<ProposalId, GovernanceError> {
        if !registry.is_verified(creator) {
            return Err(GovernanceError::Unverified(creator.to_string()));
        }
        if duration_secs == 0 {
            return Err(GovernanceError::InvalidDuration);
        }

        let id = ProposalId(self.next_id);
        self.next_id += 1;
        self.proposals.insert(
            id,
            Proposal {
                id,
                proposer: creator.clone(),
                description,
                artifact_ref,
                votes_for: 0,
                votes_against: 0,
                votes_abstain: 0,
                start_time: now,
                end_time: now.plus_secs(duration_secs),
                executed: false,
            },
        );
        tracing::info!(proposal = %id, proposer = %creator, duration_secs, "proposal created");
        Ok(id)
    }

    /// Read-only guard: the proposal exists and its window is open at `now`.
    ///
    /// Split out from `record_vote` so the settlement engine can validate
    /// before consuming a nonce.
    pub fn ensure_open(&self, id: ProposalId, now: Timestamp) -> Result<(), GovernanceError> {
        let proposal = self.proposals.get(&id).ok_or(GovernanceError::NotFound(id))?;
        if !proposal.is_open(now) {
            return Err(GovernanceError::ProposalClosed);
        }
        Ok(())
    }

    /// Add `weight` to one option's tally. Fails if the window is closed.
    pub fn record_vote(
        &mut self,
        id: ProposalId,
        option: VoteOption,
        weight: u64,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        self.ensure_open(id, now)?;
        let proposal = self.proposals.get_mut(&id).expect("checked by ensure_open");
        proposal.add_weight(option, weight);
        Ok(())
    }

    pub fn get(&self, id: ProposalId) -> Result<&Proposal, GovernanceError> {
        self.proposals.get(&id).ok_or(GovernanceError::NotFound(id))
    }

    pub(crate) fn get_mut(&mut self, id: ProposalId) -> Result<&mut Proposal, GovernanceError> {
        self.proposals
            .get_mut(&id)
            .ok_or(GovernanceError::NotFound(id))
    }

    /// Set the executed flag. Exactly-once guard.
    pub fn mark_executed(&mut self, id: ProposalId) -> Result<(), GovernanceError> {
        let proposal = self.get_mut(id)?;
        if proposal.executed {
            return Err(GovernanceError::AlreadyExecuted);
        }
        proposal.executed = true;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    /// All proposals in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.values()
    }
}
