//! Proposal finalization — applies the pass/fail rule once the voting
//! window closes.
//!
//! State machine per proposal: open → (end_time reached) → tallied →
//! executed. Finalization changes state once; repeat calls fail cleanly
//! with `AlreadyExecuted`.

use crate::error::GovernanceError;
use crate::proposal::{ProposalId, ProposalStore, VoteOption};
use lumen_types::Timestamp;
use serde::{Deserialize, Serialize};

/// The outcome of finalizing a proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionOutcome {
    /// One option holds a strict plurality. Acting on it (treasury
    /// transfer, parameter change, ...) is the caller's concern.
    Decided(VoteOption),
    /// No strict winner — any tie for the highest tally, including an
    /// entirely empty tally, resolves to no action.
    NoAction,
}

/// Finalizes proposals against the proposal store.
pub struct ExecutionEngine;

impl ExecutionEngine {
    /// Finalize a proposal whose voting window has closed.
    ///
    /// Computes the plurality outcome, sets the executed flag, and returns
    /// the outcome for the caller to act upon.
    pub fn finalize(
        &self,
        proposals: &mut ProposalStore,
        id: ProposalId,
        now: Timestamp,
    ) -> Result<ExecutionOutcome, GovernanceError> {
        let proposal = proposals.get(id)?;
        if now < proposal.end_time {
            return Err(GovernanceError::StillOpen);
        }
        let outcome = Self::plurality(
            proposal.votes_for,
            proposal.votes_against,
            proposal.votes_abstain,
        );
        proposals.mark_executed(id)?;
        tracing::info!(proposal = %id, ?outcome, "proposal finalized");
        Ok(outcome)
    }

    fn plurality(votes_for: u64, votes_against: u64, votes_abstain: u64) -> ExecutionOutcome {
        let tallies = [
            (VoteOption::For, votes_for),
            (VoteOption::Against, votes_against),
            (VoteOption::Abstain, votes_abstain),
        ];
        let top = tallies.iter().map(|(_, t)| *t).max().unwrap_or(0);
        let mut winners = tallies.iter().filter(|(_, t)| *t == top);
        match (winners.next(), winners.next()) {
            (Some((option, _)), None) => ExecutionOutcome::Decided(*option),
            _ => ExecutionOutcome::NoAction,
        }
    }
}
