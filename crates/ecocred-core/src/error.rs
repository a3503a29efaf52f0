use thiserror::Error;

use crate::types::{ActionId, Amount, ProposalId, StakeId, Timestamp};

#[derive(Debug, Error)]
pub enum EcoCredError {
    // ── Authorization ────────────────────────────────────────────────────────
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    // ── Lookup / arguments ───────────────────────────────────────────────────
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("recipient must not be the null address")]
    InvalidRecipient,

    #[error("approved verification must award a positive credit amount")]
    InvalidCredits,

    // ── Numeric preconditions ────────────────────────────────────────────────
    #[error("insufficient balance: need {need}, have {have}")]
    InsufficientBalance { need: Amount, have: Amount },

    #[error("insufficient allowance: need {need}, have {have}")]
    InsufficientAllowance { need: Amount, have: Amount },

    #[error("insufficient payment: need {need}, got {got}")]
    InsufficientPayment { need: Amount, got: Amount },

    #[error("insufficient voting power: need {need}, have {have}")]
    InsufficientPower { need: Amount, have: Amount },

    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    // ── One-shot transitions ─────────────────────────────────────────────────
    #[error("action {0} is already finalized")]
    AlreadyFinalized(ActionId),

    #[error("verifier {verifier} already recorded a verdict on action {action_id}")]
    AlreadyRecorded { action_id: ActionId, verifier: String },

    #[error("already voted on proposal {0}")]
    AlreadyVoted(ProposalId),

    #[error("stake {0} already claimed")]
    AlreadyClaimed(StakeId),

    #[error("proposal {0} already executed")]
    AlreadyExecuted(ProposalId),

    #[error("listing {0} is not active")]
    NotActive(u64),

    // ── Temporal preconditions ───────────────────────────────────────────────
    #[error("stake still locked (unlocks at {unlock_at})")]
    StillLocked { unlock_at: Timestamp },

    #[error("voting still open (closes at {deadline})")]
    VotingStillOpen { deadline: Timestamp },

    #[error("voting closed at {deadline}")]
    VotingClosed { deadline: Timestamp },

    // ── Governance execution ─────────────────────────────────────────────────
    #[error("quorum not met: need {need}, got {got}")]
    QuorumNotMet { need: Amount, got: Amount },

    #[error("proposal rejected: {votes_for} for, {votes_against} against")]
    ProposalRejected { votes_for: Amount, votes_against: Amount },

    #[error("proposal execution failed: {0}")]
    ExecutionFailed(String),

    // ── Serialization / storage ──────────────────────────────────────────────
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("{0}")]
    Other(String),
}

impl EcoCredError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        EcoCredError::NotFound { entity, id: id.to_string() }
    }

    /// Stable JSON-RPC error code for this failure kind.
    ///
    /// Ledger rejections use the -32000..-32099 server range; infrastructure
    /// failures map to the JSON-RPC internal error.
    pub fn code(&self) -> i32 {
        match self {
            EcoCredError::Unauthorized(_) => -32001,
            EcoCredError::NotFound { .. } => -32002,
            EcoCredError::InvalidArgument(_)
            | EcoCredError::InvalidRecipient
            | EcoCredError::InvalidCredits => -32003,
            EcoCredError::InsufficientBalance { .. }
            | EcoCredError::InsufficientAllowance { .. }
            | EcoCredError::InsufficientPayment { .. }
            | EcoCredError::InsufficientPower { .. }
            | EcoCredError::ArithmeticOverflow => -32004,
            EcoCredError::AlreadyFinalized(_)
            | EcoCredError::AlreadyRecorded { .. }
            | EcoCredError::AlreadyVoted(_)
            | EcoCredError::AlreadyClaimed(_)
            | EcoCredError::AlreadyExecuted(_)
            | EcoCredError::NotActive(_) => -32005,
            EcoCredError::StillLocked { .. }
            | EcoCredError::VotingStillOpen { .. }
            | EcoCredError::VotingClosed { .. } => -32006,
            EcoCredError::QuorumNotMet { .. }
            | EcoCredError::ProposalRejected { .. }
            | EcoCredError::ExecutionFailed(_) => -32007,
            EcoCredError::Serialization(_) | EcoCredError::Storage(_) | EcoCredError::Other(_) => {
                -32603
            }
        }
    }
}
