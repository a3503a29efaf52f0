use std::sync::{Arc, Mutex};

use ecocred_core::error::EcoCredError;
use ecocred_core::transaction::{Action, Output, Receipt, Transaction};
use ecocred_core::types::{Address, Module, Timestamp};
use tracing::{debug, info};

use crate::db::StateDb;
use crate::reputation::{strategy_for, ReputationStrategy};
use crate::staged::StagedState;
use crate::verification::Submission;
use crate::view::LedgerView;
use crate::{access, badges, governance, marketplace, retirement, staking, token, verification};

// ── StateEngine ───────────────────────────────────────────────────────────────

/// The state transition engine.
///
/// Applies one transaction at a time to the persistent ledger. Each `apply`
/// call is atomic: every write, id, receipt and event of the transaction is
/// committed together, or nothing is.
pub struct StateEngine {
    pub db: Arc<StateDb>,
    reputation: Option<Arc<dyn ReputationStrategy>>,
    apply_lock: Mutex<()>,
}

impl StateEngine {
    pub fn new(db: Arc<StateDb>) -> Self {
        Self { db, reputation: None, apply_lock: Mutex::new(()) }
    }

    /// Use `strategy` instead of the model named in the ledger config.
    pub fn with_reputation(mut self, strategy: Arc<dyn ReputationStrategy>) -> Self {
        self.reputation = Some(strategy);
        self
    }

    /// Validate and apply a transaction at block time `now`.
    pub fn apply(&self, tx: &Transaction, now: Timestamp) -> Result<Receipt, EcoCredError> {
        let _guard = self
            .apply_lock
            .lock()
            .map_err(|_| EcoCredError::Other("apply lock poisoned".into()))?;

        if !self.db.is_initialized()? {
            return Err(EcoCredError::Other("ledger has no genesis state".into()));
        }
        // module principals act only through internal dispatch
        if let Some(module) = Module::of_address(&tx.caller) {
            debug!(caller = %tx.caller, %module, "transaction names a module principal");
            return Err(EcoCredError::Unauthorized(format!("{module} principal cannot submit transactions")));
        }

        let mut staged = StagedState::new(&self.db, now);
        let output = match self.dispatch(&mut staged, &tx.caller, &tx.action) {
            Ok(output) => output,
            Err(e) => {
                debug!(caller = %tx.caller, module = %tx.action.module(), error = %e, "transaction reverted");
                return Err(e);
            }
        };

        let receipt = self.db.commit(staged, Some(tx), output)?;
        info!(
            tx_id = %receipt.tx_id,
            seq = receipt.seq,
            caller = %receipt.caller,
            module = %tx.action.module(),
            events = receipt.events.len(),
            "transaction applied"
        );
        Ok(receipt)
    }

    fn reputation_for(&self, st: &StagedState<'_>) -> Result<Arc<dyn ReputationStrategy>, EcoCredError> {
        match &self.reputation {
            Some(strategy) => Ok(strategy.clone()),
            None => Ok(strategy_for(st.config()?.reputation)),
        }
    }

    /// Route one action to its module. Governance re-enters here with its
    /// own principal as `caller`, sharing the overlay of the outer call.
    pub(crate) fn dispatch(
        &self,
        st: &mut StagedState<'_>,
        caller: &Address,
        action: &Action,
    ) -> Result<Output, EcoCredError> {
        match action {
            // ── Credit ledger ────────────────────────────────────────────────
            Action::Mint { to, amount } => token::mint(st, caller, to, *amount).map(|_| Output::None),
            Action::Transfer { to, amount } => token::transfer(st, caller, to, *amount).map(|_| Output::None),
            Action::TransferFrom { owner, to, amount } => {
                token::transfer_from(st, caller, owner, to, *amount).map(|_| Output::None)
            }
            Action::Approve { spender, amount } => token::approve(st, caller, spender, *amount).map(|_| Output::None),
            Action::Burn { amount } => token::burn(st, caller, *amount).map(|_| Output::None),
            Action::BurnFrom { owner, amount } => token::burn_from(st, caller, owner, *amount).map(|_| Output::None),
            Action::SetMinter { minter } => token::set_minter(st, caller, minter).map(|_| Output::None),
            Action::AddMinter { minter } => token::add_minter(st, caller, minter).map(|_| Output::None),
            Action::RemoveMinter { minter } => token::remove_minter(st, caller, minter).map(|_| Output::None),
            Action::TransferOwnership { new_owner } => {
                token::transfer_ownership(st, caller, new_owner).map(|_| Output::None)
            }
            Action::TransferNative { to, amount } => {
                token::transfer_native(st, caller, to, *amount).map(|_| Output::None)
            }
            Action::UpdateConfig { update } => token::update_config(st, caller, update).map(|_| Output::None),

            // ── Access control ───────────────────────────────────────────────
            Action::GrantRole { account, role } => {
                access::grant_role(st, caller, account, *role).map(|_| Output::None)
            }
            Action::RevokeRole { account } => access::revoke_role(st, caller, account).map(|_| Output::None),

            // ── Badges ───────────────────────────────────────────────────────
            Action::IssueBadge { to } => badges::issue(st, caller, to, None).map(Output::Id),
            Action::TransferBadge { from, to, badge_id } => {
                badges::transfer(st, caller, from, to, *badge_id).map(|_| Output::None)
            }
            Action::ApproveBadge { approved, badge_id } => {
                badges::approve(st, caller, *approved, *badge_id).map(|_| Output::None)
            }
            Action::SetBadgeBaseUri { base_uri } => badges::set_base_uri(st, caller, base_uri).map(|_| Output::None),
            Action::AddBadgeIssuer { issuer } => badges::add_issuer(st, caller, issuer).map(|_| Output::None),
            Action::RemoveBadgeIssuer { issuer } => badges::remove_issuer(st, caller, issuer).map(|_| Output::None),

            // ── Verification ─────────────────────────────────────────────────
            Action::LogEcoAction { title, description, estimated_credits, location, category } => {
                let sub = Submission {
                    title,
                    description,
                    estimated_credits: *estimated_credits,
                    location,
                    category,
                };
                verification::log_eco_action(st, caller, &sub).map(Output::Id)
            }
            Action::VerifyAction { action_id, approved, actual_credits, comments } => {
                let strategy = self.reputation_for(st)?;
                verification::verify_action(
                    st,
                    strategy.as_ref(),
                    caller,
                    *action_id,
                    *approved,
                    *actual_credits,
                    comments.as_deref(),
                )
                .map(|_| Output::None)
            }

            // ── Marketplace ──────────────────────────────────────────────────
            Action::CreateListing { amount, price_per_credit } => {
                marketplace::create_listing(st, caller, *amount, *price_per_credit).map(Output::Id)
            }
            Action::Purchase { listing_id, amount, payment } => {
                marketplace::purchase(st, caller, *listing_id, *amount, *payment).map(|_| Output::None)
            }
            Action::CancelListing { listing_id } => {
                marketplace::cancel_listing(st, caller, *listing_id).map(|_| Output::None)
            }

            // ── Staking ──────────────────────────────────────────────────────
            Action::Stake { amount, lock_days } => staking::stake(st, caller, *amount, *lock_days).map(Output::Id),
            Action::Unstake { stake_index } => staking::unstake(st, caller, *stake_index).map(Output::Id),

            // ── Retirement ───────────────────────────────────────────────────
            Action::RetireCredits { amount, reason, certificate_id } => {
                retirement::retire_credits(st, caller, *amount, reason, certificate_id).map(Output::Id)
            }

            // ── Governance ───────────────────────────────────────────────────
            Action::CreateProposal { description, target, payload } => {
                governance::create_proposal(st, caller, description, *target, payload).map(Output::Id)
            }
            Action::Vote { proposal_id, support } => {
                governance::vote(st, caller, *proposal_id, *support).map(|_| Output::None)
            }
            Action::ExecuteProposal { proposal_id } => {
                governance::execute_proposal(self, st, *proposal_id).map(|_| Output::None)
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
