use crate::proposal::ProposalId;
use thiserror::Error;

/// Every failure the engine can surface to a relayer or caller.
///
/// No error is retried internally; resubmission (e.g. a fresh deadline after
/// `Expired`) is the transport's decision, so each variant carries enough
/// context to make that call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GovernanceError {
    #[error("caller is not the registry authority")]
    Unauthorized,

    #[error("member {0} is not verified")]
    Unverified(String),

    #[error("signature does not authenticate the claimed voter")]
    BadSignature,

    #[error("vote payload deadline has passed")]
    Expired,

    #[error("nonce mismatch: expected {expected}, presented {presented}")]
    NonceMismatch { expected: u64, presented: u64 },

    #[error("voter has zero voting weight")]
    ZeroWeight,

    #[error("proposal voting window has closed")]
    ProposalClosed,

    #[error("proposal {0} not found")]
    NotFound(ProposalId),

    #[error("proposal has already been executed")]
    AlreadyExecuted,

    #[error("proposal voting window is still open")]
    StillOpen,

    #[error("cannot delegate to self")]
    SelfDelegation,

    #[error("delegatee {0} is not verified")]
    UnverifiedDelegatee(String),

    #[error("delegation would form a cycle")]
    DelegationCycle,

    #[error("proposal duration must be non-zero")]
    InvalidDuration,
}
