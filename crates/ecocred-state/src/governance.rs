//! Token-weighted proposals executing an encoded ledger call.
//!
//!   Open ──(deadline passed, quorum met, for > against)──► Executed
//!   Open ──(deadline passed, never executed)─────────────► Expired

use ecocred_core::constants::MAX_PROPOSAL_DESCRIPTION_BYTES;
use ecocred_core::error::EcoCredError;
use ecocred_core::event::Event;
use ecocred_core::records::{Proposal, VoteRecord};
use ecocred_core::transaction::Action;
use ecocred_core::types::{Address, Module, ProposalId};
use tracing::{info, warn};

use crate::engine::StateEngine;
use crate::staged::{Counter, StagedState};
use crate::view::LedgerView;

fn load(st: &StagedState<'_>, id: ProposalId) -> Result<Proposal, EcoCredError> {
    st.proposal(id)?.ok_or_else(|| EcoCredError::not_found("proposal", id))
}

pub fn create_proposal(
    st: &mut StagedState<'_>,
    proposer: &Address,
    description: &str,
    target: Module,
    payload: &[u8],
) -> Result<ProposalId, EcoCredError> {
    if description.len() > MAX_PROPOSAL_DESCRIPTION_BYTES {
        return Err(EcoCredError::InvalidArgument(format!(
            "description exceeds {MAX_PROPOSAL_DESCRIPTION_BYTES} bytes"
        )));
    }
    let config = st.config()?;
    let power = st.balance_of(proposer)?;
    if power < config.proposal_threshold {
        return Err(EcoCredError::InsufficientPower { need: config.proposal_threshold, have: power });
    }

    let id = st.next_id(Counter::Proposal)?;
    let deadline = st.now() + config.voting_period_secs;
    st.put_proposal(&Proposal {
        id,
        proposer: *proposer,
        description: description.to_string(),
        target,
        payload: payload.to_vec(),
        votes_for: 0,
        votes_against: 0,
        deadline,
        executed: false,
        created_at: st.now(),
    })?;
    st.emit(Event::ProposalCreated {
        proposal_id: id,
        proposer: *proposer,
        description: description.to_string(),
        deadline,
    });
    Ok(id)
}

/// Cast a ballot weighted by the voter's current credit balance.
pub fn vote(st: &mut StagedState<'_>, voter: &Address, id: ProposalId, support: bool) -> Result<(), EcoCredError> {
    let mut proposal = load(st, id)?;
    if st.vote_of(id, voter)?.is_some() {
        return Err(EcoCredError::AlreadyVoted(id));
    }
    if st.now() >= proposal.deadline {
        return Err(EcoCredError::VotingClosed { deadline: proposal.deadline });
    }
    let power = st.balance_of(voter)?;
    if power == 0 {
        return Err(EcoCredError::InsufficientPower { need: 1, have: 0 });
    }

    let tally = if support { &mut proposal.votes_for } else { &mut proposal.votes_against };
    *tally = tally.checked_add(power).ok_or(EcoCredError::ArithmeticOverflow)?;
    st.put_proposal(&proposal)?;
    st.put_vote(&VoteRecord { proposal_id: id, voter: *voter, support, power, cast_at: st.now() })?;
    st.emit(Event::VoteCast { proposal_id: id, voter: *voter, support, power });
    Ok(())
}

/// Decode the payload and dispatch it as the governance principal inside
/// the current transaction. Any payload failure surfaces as
/// `ExecutionFailed` and reverts the whole transaction.
pub fn execute_proposal(engine: &StateEngine, st: &mut StagedState<'_>, id: ProposalId) -> Result<(), EcoCredError> {
    let mut proposal = load(st, id)?;
    if st.now() < proposal.deadline {
        return Err(EcoCredError::VotingStillOpen { deadline: proposal.deadline });
    }
    if proposal.executed {
        return Err(EcoCredError::AlreadyExecuted(id));
    }
    let config = st.config()?;
    let turnout = proposal
        .votes_for
        .checked_add(proposal.votes_against)
        .ok_or(EcoCredError::ArithmeticOverflow)?;
    if turnout < config.quorum {
        return Err(EcoCredError::QuorumNotMet { need: config.quorum, got: turnout });
    }
    if proposal.votes_for <= proposal.votes_against {
        return Err(EcoCredError::ProposalRejected {
            votes_for: proposal.votes_for,
            votes_against: proposal.votes_against,
        });
    }

    let action = decode_payload(&proposal)?;
    if let Err(e) = engine.dispatch(st, &Module::Governance.address(), &action) {
        warn!(proposal_id = id, error = %e, "proposal payload failed");
        return Err(EcoCredError::ExecutionFailed(e.to_string()));
    }

    proposal.executed = true;
    st.put_proposal(&proposal)?;
    info!(proposal_id = id, target = %proposal.target, "proposal executed");
    st.emit(Event::ProposalExecuted { proposal_id: id });
    Ok(())
}

fn decode_payload(proposal: &Proposal) -> Result<Action, EcoCredError> {
    if proposal.payload.is_empty() {
        return Err(EcoCredError::ExecutionFailed("empty payload".into()));
    }
    if proposal.target == Module::Governance {
        return Err(EcoCredError::ExecutionFailed("governance cannot target itself".into()));
    }
    let action = Action::decode(&proposal.payload)
        .map_err(|e| EcoCredError::ExecutionFailed(format!("undecodable payload: {e}")))?;
    if action.module() != proposal.target {
        return Err(EcoCredError::ExecutionFailed(format!(
            "payload belongs to {}, proposal targets {}",
            action.module(),
            proposal.target
        )));
    }
    Ok(action)
}
