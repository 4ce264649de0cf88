//! Membership-gated, delegation-weighted vote settlement for Lumen.
//!
//! Verified members create proposals, accumulate voting weight through
//! single-hop delegation, and cast votes via offline-signed payloads that
//! any untrusted relayer can settle. The engine is one serialized state
//! machine: mutating entry points take `&mut self` and every submitted
//! vote either fully applies or is fully rejected with a typed error.
//!
//! Key principle: one verified member = one base vote, movable exactly one
//! delegation hop. Proposal content lives off-core behind an opaque
//! artifact reference the engine never resolves.

pub mod delegation;
pub mod error;
pub mod execution;
pub mod identity;
pub mod nonce;
pub mod proposal;
pub mod settlement;
pub mod snapshot;

pub use delegation::DelegationGraph;
pub use error::GovernanceError;
pub use execution::{ExecutionEngine, ExecutionOutcome};
pub use identity::{IdentityRecord, IdentityRegistry};
pub use nonce::NonceLedger;
pub use proposal::{Proposal, ProposalId, ProposalStore, VoteOption};
pub use settlement::{vote_digest, SettlementEngine, VoteDomain, VotePayload, VoteRecord};
pub use snapshot::GovernanceSnapshot;
