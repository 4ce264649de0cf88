//! Vote settlement — validates signed vote payloads and applies them to
//! the ledger as a single serialized state machine.
//!
//! Payloads are signed offline and can be submitted by any untrusted
//! relayer; everything the engine needs to authenticate a vote travels in
//! the payload itself. Every mutating entry point takes `&mut self`, so
//! application order is total and nonce consumption plus tally updates are
//! linearizable by construction. Each submission either fully applies or
//! is fully rejected: all checks run before the first write.

use crate::delegation::DelegationGraph;
use crate::error::GovernanceError;
use crate::execution::{ExecutionEngine, ExecutionOutcome};
use crate::identity::{IdentityRecord, IdentityRegistry};
use crate::nonce::NonceLedger;
use crate::proposal::{Proposal, ProposalId, ProposalStore, VoteOption};
use lumen_crypto::{blake2b_256_multi, derive_address, sign_message, verify_signature};
use lumen_types::{KeyPair, MemberAddress, PublicKey, Signature, Timestamp};
use serde::{Deserialize, Serialize};

/// Signature domain separator identifying one deployment instance.
///
/// Binds `{name, version, instance_id, verifying_address}` into every vote
/// digest, so a payload signed for one instance can never settle on
/// another.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteDomain {
    pub name: String,
    pub version: String,
    pub instance_id: u64,
    pub verifying_address: MemberAddress,
}

impl VoteDomain {
    /// The 32-byte domain separator.
    ///
    /// Variable-length fields are length-prefixed so no two domains can
    /// encode to the same byte stream.
    pub fn separator(&self) -> [u8; 32] {
        blake2b_256_multi(&[
            &(self.name.len() as u64).to_be_bytes(),
            self.name.as_bytes(),
            &(self.version.len() as u64).to_be_bytes(),
            self.version.as_bytes(),
            &self.instance_id.to_be_bytes(),
            self.verifying_address.as_str().as_bytes(),
        ])
    }
}

/// A signed vote, self-contained for settlement by an untrusted relayer.
///
/// The address commits to the public key by hash, so the payload carries
/// the key itself; the engine re-derives the address from it before
/// verifying the signature.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VotePayload {
    pub voter: MemberAddress,
    pub public_key: PublicKey,
    pub proposal_id: ProposalId,
    pub option: VoteOption,
    pub nonce: u64,
    pub deadline: Timestamp,
    pub signature: Signature,
}

impl VotePayload {
    /// Build and sign a payload (wallet-side helper).
    pub fn sign(
        domain: &VoteDomain,
        keypair: &KeyPair,
        proposal_id: ProposalId,
        option: VoteOption,
        nonce: u64,
        deadline: Timestamp,
    ) -> Self {
        let voter = derive_address(&keypair.public);
        let digest = vote_digest(domain, &voter, proposal_id, option, nonce, deadline);
        let signature = sign_message(&digest, &keypair.private);
        Self {
            voter,
            public_key: PublicKey(keypair.public.0),
            proposal_id,
            option,
            nonce,
            deadline,
            signature,
        }
    }

    /// The digest this payload's signature must cover under `domain`.
    pub fn digest(&self, domain: &VoteDomain) -> [u8; 32] {
        vote_digest(
            domain,
            &self.voter,
            self.proposal_id,
            self.option,
            self.nonce,
            self.deadline,
        )
    }
}

/// Canonical vote digest: domain separator plus the five vote fields in
/// fixed big-endian order. Changing any field invalidates the signature.
pub fn vote_digest(
    domain: &VoteDomain,
    voter: &MemberAddress,
    proposal_id: ProposalId,
    option: VoteOption,
    nonce: u64,
    deadline: Timestamp,
) -> [u8; 32] {
    let separator = domain.separator();
    blake2b_256_multi(&[
        &separator,
        voter.as_str().as_bytes(),
        &proposal_id.0.to_be_bytes(),
        &[option.wire_tag()],
        &nonce.to_be_bytes(),
        &deadline.as_secs().to_be_bytes(),
    ])
}

/// Audit record of one settled vote, appended to the activity log and
/// returned to the relayer. Derived state: the tally is authoritative.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub voter: MemberAddress,
    pub proposal_id: ProposalId,
    pub option: VoteOption,
    pub weight: u64,
    pub nonce: u64,
    pub timestamp: Timestamp,
}

/// The settlement engine: owns the four stores and orchestrates every
/// state transition. Instantiable per deployment (and per test case) —
/// nothing is ambient.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SettlementEngine {
    domain: VoteDomain,
    identities: IdentityRegistry,
    delegations: DelegationGraph,
    proposals: ProposalStore,
    nonces: NonceLedger,
    activity: Vec<VoteRecord>,
}

impl SettlementEngine {
    pub fn new(domain: VoteDomain, authority: MemberAddress) -> Self {
        Self {
            domain,
            identities: IdentityRegistry::new(authority),
            delegations: DelegationGraph::new(),
            proposals: ProposalStore::new(),
            nonces: NonceLedger::new(),
            activity: Vec::new(),
        }
    }

    // ── Settlement ───────────────────────────────────────────────────────

    /// Settle one signed vote payload.
    ///
    /// Checks run in a fixed order, each short-circuiting on failure with
    /// zero mutation: deadline, signature, verification status, nonce,
    /// weight, proposal window. Only when all pass does the engine consume
    /// the nonce, mutate the tally, and append the audit record.
    pub fn submit_vote(
        &mut self,
        payload: &VotePayload,
        now: Timestamp,
    ) -> Result<VoteRecord, GovernanceError> {
        if now > payload.deadline {
            tracing::debug!(voter = %payload.voter, deadline = %payload.deadline, "vote expired");
            return Err(GovernanceError::Expired);
        }

        if derive_address(&payload.public_key) != payload.voter {
            return Err(GovernanceError::BadSignature);
        }
        let digest = payload.digest(&self.domain);
        if !verify_signature(&digest, &payload.signature, &payload.public_key) {
            tracing::warn!(voter = %payload.voter, "vote signature rejected");
            return Err(GovernanceError::BadSignature);
        }

        if !self.identities.is_verified(&payload.voter) {
            return Err(GovernanceError::Unverified(payload.voter.to_string()));
        }

        // Validated read-only here; consumed only after every later check
        // passes, so a rejected vote never moves the counter.
        self.nonces.check(&payload.voter, payload.nonce)?;

        let weight = self.delegations.weight_of(&self.identities, &payload.voter);
        if weight == 0 {
            return Err(GovernanceError::ZeroWeight);
        }

        self.proposals.ensure_open(payload.proposal_id, now)?;

        // All checks passed; apply.
        self.nonces
            .consume(&payload.voter, payload.nonce)
            .expect("nonce checked above");
        self.proposals
            .record_vote(payload.proposal_id, payload.option, weight, now)
            .expect("window checked above");

        let record = VoteRecord {
            voter: payload.voter.clone(),
            proposal_id: payload.proposal_id,
            option: payload.option,
            weight,
            nonce: payload.nonce,
            timestamp: now,
        };
        self.activity.push(record.clone());
        tracing::info!(
            voter = %record.voter,
            proposal = %record.proposal_id,
            option = record.option.name(),
            weight,
            nonce = record.nonce,
            "vote settled"
        );
        Ok(record)
    }

    // ── Identity ─────────────────────────────────────────────────────────

    pub fn verify_member(
        &mut self,
        caller: &MemberAddress,
        address: &MemberAddress,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        self.identities.verify(caller, address, now)
    }

    pub fn revoke_member(
        &mut self,
        caller: &MemberAddress,
        address: &MemberAddress,
    ) -> Result<(), GovernanceError> {
        self.identities.revoke(caller, address)
    }

    // ── Proposals ────────────────────────────────────────────────────────

    pub fn create_proposal(
        &mut self,
        creator: &MemberAddress,
        description: String,
        artifact_ref: String,
        duration_secs: u64,
        now: Timestamp,
    ) -> Result<ProposalId, GovernanceError> {
        self.proposals.create(
            &self.identities,
            creator,
            description,
            artifact_ref,
            duration_secs,
            now,
        )
    }

    /// Finalize a proposal whose window has closed and return the outcome.
    pub fn finalize_proposal(
        &mut self,
        id: ProposalId,
        now: Timestamp,
    ) -> Result<ExecutionOutcome, GovernanceError> {
        ExecutionEngine.finalize(&mut self.proposals, id, now)
    }

    // ── Delegation ───────────────────────────────────────────────────────

    pub fn set_delegate(
        &mut self,
        delegator: &MemberAddress,
        delegatee: &MemberAddress,
    ) -> Result<(), GovernanceError> {
        self.delegations.delegate(&self.identities, delegator, delegatee)
    }

    pub fn clear_delegate(&mut self, delegator: &MemberAddress) {
        self.delegations.clear_delegation(delegator);
    }

    // ── Queries (side-effect free) ───────────────────────────────────────

    pub fn domain(&self) -> &VoteDomain {
        &self.domain
    }

    pub fn is_verified(&self, address: &MemberAddress) -> bool {
        self.identities.is_verified(address)
    }

    pub fn identity(&self, address: &MemberAddress) -> Option<&IdentityRecord> {
        self.identities.get(address)
    }

    pub fn weight_of(&self, address: &MemberAddress) -> u64 {
        self.delegations.weight_of(&self.identities, address)
    }

    pub fn delegate_of(&self, address: &MemberAddress) -> Option<&MemberAddress> {
        self.delegations.delegate_of(address)
    }

    pub fn get_proposal(&self, id: ProposalId) -> Result<&Proposal, GovernanceError> {
        self.proposals.get(id)
    }

    /// All proposals in id order.
    pub fn proposals(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.iter()
    }

    pub fn current_nonce(&self, address: &MemberAddress) -> u64 {
        self.nonces.current_nonce(address)
    }

    /// Settled votes in application order.
    pub fn activity_log(&self) -> &[VoteRecord] {
        &self.activity
    }

    // Snapshot accessors (crate-internal; see `snapshot`).

    pub(crate) fn parts(
        &self,
    ) -> (
        &VoteDomain,
        &IdentityRegistry,
        &DelegationGraph,
        &ProposalStore,
        &NonceLedger,
        &[VoteRecord],
    ) {
        (
            &self.domain,
            &self.identities,
            &self.delegations,
            &self.proposals,
            &self.nonces,
            &self.activity,
        )
    }

    pub(crate) fn from_parts(
        domain: VoteDomain,
        identities: IdentityRegistry,
        mut delegations: DelegationGraph,
        proposals: ProposalStore,
        nonces: NonceLedger,
        activity: Vec<VoteRecord>,
    ) -> Self {
        delegations.rebuild_reverse_index();
        Self {
            domain,
            identities,
            delegations,
            proposals,
            nonces,
            activity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_crypto::keypair_from_seed;

    fn test_domain() -> VoteDomain {
        VoteDomain {
            name: "LumenDAO".into(),
            version: "1".into(),
            instance_id: 31337,
            verifying_address: MemberAddress::new(format!("lmn_{:0>48}", "dao")),
        }
    }

    fn guardian() -> MemberAddress {
        MemberAddress::new(format!("lmn_{:0>48}", "guardian"))
    }

    fn engine() -> SettlementEngine {
        SettlementEngine::new(test_domain(), guardian())
    }

    /// Engine with one verified voter (seed 1) and one open proposal.
    fn engine_with_proposal() -> (SettlementEngine, KeyPair, MemberAddress, ProposalId) {
        let mut engine = engine();
        let kp = keypair_from_seed(&[1u8; 32]);
        let voter = derive_address(&kp.public);
        engine
            .verify_member(&guardian(), &voter, Timestamp::new(10))
            .unwrap();
        let id = engine
            .create_proposal(&voter, "p".into(), "ref".into(), 3600, Timestamp::new(100))
            .unwrap();
        (engine, kp, voter, id)
    }

    #[test]
    fn valid_vote_settles() {
        let (mut engine, kp, voter, id) = engine_with_proposal();
        let payload = VotePayload::sign(
            engine.domain(),
            &kp,
            id,
            VoteOption::For,
            0,
            Timestamp::new(200),
        );

        let record = engine.submit_vote(&payload, Timestamp::new(150)).unwrap();
        assert_eq!(record.voter, voter);
        assert_eq!(record.weight, 1);
        assert_eq!(record.nonce, 0);
        assert_eq!(engine.get_proposal(id).unwrap().votes_for, 1);
        assert_eq!(engine.current_nonce(&voter), 1);
        assert_eq!(engine.activity_log(), &[record]);
    }

    #[test]
    fn expired_payload_rejected_even_with_valid_signature() {
        let (mut engine, kp, voter, id) = engine_with_proposal();
        let payload = VotePayload::sign(
            engine.domain(),
            &kp,
            id,
            VoteOption::For,
            0,
            Timestamp::new(120),
        );

        assert_eq!(
            engine.submit_vote(&payload, Timestamp::new(121)),
            Err(GovernanceError::Expired)
        );
        assert_eq!(engine.current_nonce(&voter), 0);
    }

    #[test]
    fn deadline_is_inclusive() {
        let (mut engine, kp, _, id) = engine_with_proposal();
        let payload = VotePayload::sign(
            engine.domain(),
            &kp,
            id,
            VoteOption::For,
            0,
            Timestamp::new(150),
        );
        assert!(engine.submit_vote(&payload, Timestamp::new(150)).is_ok());
    }

    #[test]
    fn tampered_field_invalidates_signature() {
        let (mut engine, kp, _, id) = engine_with_proposal();
        let mut payload = VotePayload::sign(
            engine.domain(),
            &kp,
            id,
            VoteOption::For,
            0,
            Timestamp::new(200),
        );
        payload.option = VoteOption::Against;

        assert_eq!(
            engine.submit_vote(&payload, Timestamp::new(150)),
            Err(GovernanceError::BadSignature)
        );
    }

    #[test]
    fn foreign_key_cannot_claim_voter_address() {
        let (mut engine, _, voter, id) = engine_with_proposal();
        let other = keypair_from_seed(&[2u8; 32]);
        let mut payload = VotePayload::sign(
            engine.domain(),
            &other,
            id,
            VoteOption::For,
            0,
            Timestamp::new(200),
        );
        // Claim someone else's address with a signature from another key.
        payload.voter = voter;

        assert_eq!(
            engine.submit_vote(&payload, Timestamp::new(150)),
            Err(GovernanceError::BadSignature)
        );
    }

    #[test]
    fn wrong_domain_invalidates_signature() {
        let (mut engine, kp, _, id) = engine_with_proposal();
        let foreign = VoteDomain {
            instance_id: 1,
            ..test_domain()
        };
        let payload =
            VotePayload::sign(&foreign, &kp, id, VoteOption::For, 0, Timestamp::new(200));

        assert_eq!(
            engine.submit_vote(&payload, Timestamp::new(150)),
            Err(GovernanceError::BadSignature)
        );
    }

    #[test]
    fn unverified_voter_rejected() {
        let (mut engine, _, _, id) = engine_with_proposal();
        let stranger = keypair_from_seed(&[9u8; 32]);
        let payload = VotePayload::sign(
            engine.domain(),
            &stranger,
            id,
            VoteOption::For,
            0,
            Timestamp::new(200),
        );

        assert!(matches!(
            engine.submit_vote(&payload, Timestamp::new(150)),
            Err(GovernanceError::Unverified(_))
        ));
    }

    #[test]
    fn replay_yields_success_then_nonce_mismatch() {
        let (mut engine, kp, voter, id) = engine_with_proposal();
        let payload = VotePayload::sign(
            engine.domain(),
            &kp,
            id,
            VoteOption::For,
            0,
            Timestamp::new(200),
        );

        engine.submit_vote(&payload, Timestamp::new(150)).unwrap();
        assert_eq!(
            engine.submit_vote(&payload, Timestamp::new(151)),
            Err(GovernanceError::NonceMismatch {
                expected: 1,
                presented: 0
            })
        );
        assert_eq!(engine.current_nonce(&voter), 1);
        assert_eq!(engine.get_proposal(id).unwrap().votes_for, 1);
    }

    #[test]
    fn delegated_voter_fails_zero_weight() {
        let (mut engine, kp, voter, id) = engine_with_proposal();
        let delegatee_kp = keypair_from_seed(&[3u8; 32]);
        let delegatee = derive_address(&delegatee_kp.public);
        engine
            .verify_member(&guardian(), &delegatee, Timestamp::new(10))
            .unwrap();
        engine.set_delegate(&voter, &delegatee).unwrap();

        assert_eq!(engine.weight_of(&voter), 0);
        assert_eq!(engine.weight_of(&delegatee), 2);

        let payload = VotePayload::sign(
            engine.domain(),
            &kp,
            id,
            VoteOption::For,
            0,
            Timestamp::new(200),
        );
        assert_eq!(
            engine.submit_vote(&payload, Timestamp::new(150)),
            Err(GovernanceError::ZeroWeight)
        );
        // Rejection left the nonce untouched.
        assert_eq!(engine.current_nonce(&voter), 0);

        let payload = VotePayload::sign(
            engine.domain(),
            &delegatee_kp,
            id,
            VoteOption::For,
            0,
            Timestamp::new(200),
        );
        let record = engine.submit_vote(&payload, Timestamp::new(150)).unwrap();
        assert_eq!(record.weight, 2);
        assert_eq!(engine.get_proposal(id).unwrap().votes_for, 2);
    }

    #[test]
    fn closed_proposal_rejected_without_nonce_consumption() {
        let (mut engine, kp, voter, id) = engine_with_proposal();
        let end = engine.get_proposal(id).unwrap().end_time;
        let payload = VotePayload::sign(
            engine.domain(),
            &kp,
            id,
            VoteOption::For,
            0,
            end.plus_secs(100),
        );

        assert_eq!(
            engine.submit_vote(&payload, end),
            Err(GovernanceError::ProposalClosed)
        );
        // Step-6 rejection after the nonce check: counter still untouched.
        assert_eq!(engine.current_nonce(&voter), 0);
        assert!(engine.activity_log().is_empty());
    }

    #[test]
    fn unknown_proposal_not_found() {
        let (mut engine, kp, _, _) = engine_with_proposal();
        let payload = VotePayload::sign(
            engine.domain(),
            &kp,
            ProposalId(42),
            VoteOption::For,
            0,
            Timestamp::new(200),
        );
        assert_eq!(
            engine.submit_vote(&payload, Timestamp::new(150)),
            Err(GovernanceError::NotFound(ProposalId(42)))
        );
    }

    #[test]
    fn global_nonce_spans_proposals() {
        let (mut engine, kp, voter, p1) = engine_with_proposal();
        let p2 = engine
            .create_proposal(&voter, "second".into(), "ref2".into(), 3600, Timestamp::new(100))
            .unwrap();

        let v1 = VotePayload::sign(
            engine.domain(),
            &kp,
            p1,
            VoteOption::For,
            0,
            Timestamp::new(200),
        );
        engine.submit_vote(&v1, Timestamp::new(150)).unwrap();

        // The counter is per member, not per proposal: the next vote on a
        // different proposal must present nonce 1.
        let stale = VotePayload::sign(
            engine.domain(),
            &kp,
            p2,
            VoteOption::Against,
            0,
            Timestamp::new(200),
        );
        assert!(matches!(
            engine.submit_vote(&stale, Timestamp::new(151)),
            Err(GovernanceError::NonceMismatch { .. })
        ));

        let v2 = VotePayload::sign(
            engine.domain(),
            &kp,
            p2,
            VoteOption::Against,
            1,
            Timestamp::new(200),
        );
        engine.submit_vote(&v2, Timestamp::new(151)).unwrap();
        assert_eq!(engine.current_nonce(&voter), 2);
    }

    #[test]
    fn digest_changes_with_every_field() {
        let domain = test_domain();
        let voter = MemberAddress::new(format!("lmn_{:0>48}", "v"));
        let base = vote_digest(
            &domain,
            &voter,
            ProposalId(1),
            VoteOption::For,
            0,
            Timestamp::new(100),
        );

        let other_voter = MemberAddress::new(format!("lmn_{:0>48}", "w"));
        assert_ne!(
            base,
            vote_digest(&domain, &other_voter, ProposalId(1), VoteOption::For, 0, Timestamp::new(100))
        );
        assert_ne!(
            base,
            vote_digest(&domain, &voter, ProposalId(2), VoteOption::For, 0, Timestamp::new(100))
        );
        assert_ne!(
            base,
            vote_digest(&domain, &voter, ProposalId(1), VoteOption::Against, 0, Timestamp::new(100))
        );
        assert_ne!(
            base,
            vote_digest(&domain, &voter, ProposalId(1), VoteOption::For, 1, Timestamp::new(100))
        );
        assert_ne!(
            base,
            vote_digest(&domain, &voter, ProposalId(1), VoteOption::For, 0, Timestamp::new(101))
        );
    }

    #[test]
    fn domain_separator_length_prefixing_disambiguates() {
        let d1 = VoteDomain {
            name: "ab".into(),
            version: "c".into(),
            ..test_domain()
        };
        let d2 = VoteDomain {
            name: "a".into(),
            version: "bc".into(),
            ..test_domain()
        };
        assert_ne!(d1.separator(), d2.separator());
    }
}
