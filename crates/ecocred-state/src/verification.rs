//! Eco-action submission and the verdict state machine.
//!
//!   Submitted ──(k-th distinct verdict)──► Verified | Rejected
//!
//! `k` is the configured verification threshold. Verdicts commute: the
//! action finalizes on whichever verdict brings the count to `k`, rejected
//! if any contributing verdict rejected it.

use ecocred_core::constants::{
    BPS_DENOMINATOR, CREDIT_UNIT, MAX_CATEGORY_BYTES, MAX_COMMENTS_BYTES, MAX_DESCRIPTION_BYTES,
    MAX_LOCATION_BYTES, MAX_TITLE_BYTES,
};
use ecocred_core::error::EcoCredError;
use ecocred_core::event::Event;
use ecocred_core::records::{ActionStatus, CompanyProfile, EcoAction, VerificationRecord};
use ecocred_core::types::{ActionId, Address, Amount, Module, Role};
use tracing::info;

use crate::access::require_any_role;
use crate::reputation::{score_for, ReputationStrategy};
use crate::staged::{Counter, StagedState};
use crate::view::LedgerView;
use crate::{analytics, badges, token};

/// Fields of a new submission.
pub struct Submission<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub estimated_credits: u64,
    pub location: &'a str,
    pub category: &'a str,
}

fn check_len(field: &str, value: &str, max: usize) -> Result<(), EcoCredError> {
    if value.len() > max {
        return Err(EcoCredError::InvalidArgument(format!("{field} exceeds {max} bytes")));
    }
    Ok(())
}

fn load_profile(st: &StagedState<'_>, company: &Address) -> Result<CompanyProfile, EcoCredError> {
    Ok(st.profile(company)?.unwrap_or_else(|| CompanyProfile::new(*company, st.now())))
}

pub fn log_eco_action(
    st: &mut StagedState<'_>,
    company: &Address,
    sub: &Submission<'_>,
) -> Result<ActionId, EcoCredError> {
    if sub.title.trim().is_empty() {
        return Err(EcoCredError::InvalidArgument("title must not be empty".into()));
    }
    check_len("title", sub.title, MAX_TITLE_BYTES)?;
    check_len("description", sub.description, MAX_DESCRIPTION_BYTES)?;
    check_len("location", sub.location, MAX_LOCATION_BYTES)?;
    check_len("category", sub.category, MAX_CATEGORY_BYTES)?;
    if sub.estimated_credits == 0 {
        return Err(EcoCredError::InvalidArgument("estimated credits must be positive".into()));
    }

    let id = st.next_id(Counter::Action)?;
    let action = EcoAction {
        id,
        company: *company,
        title: sub.title.to_string(),
        description: sub.description.to_string(),
        category: sub.category.to_string(),
        estimated_credits: sub.estimated_credits,
        location: sub.location.to_string(),
        status: ActionStatus::Submitted,
        approval_count: 0,
        rejection_count: 0,
        awarded_credits: 0,
        created_at: st.now(),
        finalized_at: None,
    };
    st.put_action(&action)?;

    let mut profile = load_profile(st, company)?;
    profile.actions_submitted += 1;
    st.put_profile(&profile)?;

    st.emit(Event::EcoActionLogged {
        action_id: id,
        company: *company,
        title: action.title.clone(),
        category: action.category.clone(),
    });
    Ok(id)
}

/// Record `verifier`'s verdict and finalize the action if this verdict
/// reaches the threshold.
pub fn verify_action(
    st: &mut StagedState<'_>,
    reputation: &dyn ReputationStrategy,
    verifier: &Address,
    action_id: ActionId,
    approved: bool,
    actual_credits: u64,
    comments: Option<&str>,
) -> Result<(), EcoCredError> {
    require_any_role(st, verifier, &[Role::Verifier, Role::Admin], "verification")?;
    let mut action = st.action(action_id)?.ok_or_else(|| EcoCredError::not_found("action", action_id))?;
    if action.status.is_final() {
        return Err(EcoCredError::AlreadyFinalized(action_id));
    }
    if approved && actual_credits == 0 {
        return Err(EcoCredError::InvalidCredits);
    }
    if st.verification(action_id, verifier)?.is_some() {
        return Err(EcoCredError::AlreadyRecorded { action_id, verifier: verifier.to_hex() });
    }
    if let Some(c) = comments {
        check_len("comments", c, MAX_COMMENTS_BYTES)?;
    }

    st.put_verification(&VerificationRecord {
        action_id,
        verifier: *verifier,
        approved,
        actual_credits,
        comments: comments.map(str::to_string),
        recorded_at: st.now(),
    })?;
    if approved {
        action.approval_count += 1;
    } else {
        action.rejection_count += 1;
    }
    st.emit(Event::ActionVerified { action_id, verifier: *verifier, approved, actual_credits });

    if action.verdict_count() >= st.config()?.verification_threshold {
        finalize(st, reputation, &mut action, actual_credits)?;
    }
    st.put_action(&action)
}

fn finalize(
    st: &mut StagedState<'_>,
    reputation: &dyn ReputationStrategy,
    action: &mut EcoAction,
    deciding_credits: u64,
) -> Result<(), EcoCredError> {
    let config = st.config()?;
    let mut profile = load_profile(st, &action.company)?;
    action.finalized_at = Some(st.now());

    if action.rejection_count > 0 {
        action.status = ActionStatus::Rejected;
        action.awarded_credits = 0;
        profile.actions_rejected += 1;
        st.put_profile(&profile)?;
        info!(action_id = action.id, company = %action.company, "action rejected");
        st.emit(Event::ActionFullyVerified { action_id: action.id, actual_credits: 0 });
        return Ok(());
    }

    let base: Amount = (deciding_credits as Amount)
        .checked_mul(CREDIT_UNIT)
        .ok_or(EcoCredError::ArithmeticOverflow)?;
    let awarded = base
        .checked_mul(reputation.score(&profile) as Amount)
        .ok_or(EcoCredError::ArithmeticOverflow)?
        / BPS_DENOMINATOR;

    action.status = ActionStatus::Verified;
    action.awarded_credits = awarded;

    let principal = Module::Verification.address();
    token::mint(st, &principal, &action.company, awarded)?;
    if awarded >= config.badge_threshold {
        badges::issue(st, &principal, &action.company, Some(action.id))?;
    }

    profile.actions_verified += 1;
    profile.total_credits_earned = profile
        .total_credits_earned
        .checked_add(awarded)
        .ok_or(EcoCredError::ArithmeticOverflow)?;
    profile.reputation_score = score_for(profile.total_credits_earned);
    st.put_profile(&profile)?;

    info!(action_id = action.id, company = %action.company, awarded = %awarded, "action verified");
    st.emit(Event::ActionFullyVerified { action_id: action.id, actual_credits: awarded });

    let rank = analytics::rank_of(st, &action.company)?.unwrap_or(0);
    st.emit(Event::LeaderboardUpdated {
        company: action.company,
        rank,
        credits: profile.total_credits_earned,
    });
    Ok(())
}
