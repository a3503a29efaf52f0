//! Time-locked credit staking with rewards minted at unstake.

use ecocred_core::constants::{BPS_DENOMINATOR, SECONDS_PER_DAY, SECONDS_PER_YEAR};
use ecocred_core::error::EcoCredError;
use ecocred_core::event::Event;
use ecocred_core::records::Stake;
use ecocred_core::types::{Address, Amount, Module, StakeId, Timestamp};
use tracing::info;

use crate::staged::{Counter, StagedState};
use crate::token;
use crate::view::LedgerView;

/// `amount × rate × min(elapsed, lock) / (10 000 × year)`, floored.
pub fn calculate_reward(
    amount: Amount,
    rate_bps: u32,
    start: Timestamp,
    end: Timestamp,
    now: Timestamp,
) -> Result<Amount, EcoCredError> {
    let lock = (end - start).max(0);
    let elapsed = (now - start).clamp(0, lock);
    let denom = BPS_DENOMINATOR * SECONDS_PER_YEAR as u128;
    amount
        .checked_mul(rate_bps as u128)
        .and_then(|v| v.checked_mul(elapsed as u128))
        .map(|v| v / denom)
        .ok_or(EcoCredError::ArithmeticOverflow)
}

pub fn reward_of(stake: &Stake, now: Timestamp) -> Result<Amount, EcoCredError> {
    calculate_reward(stake.amount, stake.reward_rate_bps, stake.start_time, stake.end_time, now)
}

pub fn stake(st: &mut StagedState<'_>, user: &Address, amount: Amount, lock_days: u32) -> Result<StakeId, EcoCredError> {
    if amount == 0 {
        return Err(EcoCredError::InvalidArgument("stake amount must be positive".into()));
    }
    let config = st.config()?;
    if lock_days < config.min_lock_days || lock_days > config.max_lock_days {
        return Err(EcoCredError::InvalidArgument(format!(
            "lock period must be between {} and {} days",
            config.min_lock_days, config.max_lock_days
        )));
    }

    let custody = Module::Staking.address();
    token::transfer_from(st, &custody, user, &custody, amount)?;

    let id = st.next_id(Counter::Stake)?;
    let start = st.now();
    let stake = Stake {
        id,
        staker: *user,
        amount,
        start_time: start,
        end_time: start + lock_days as i64 * SECONDS_PER_DAY,
        lock_days,
        reward_rate_bps: config.reward_rate_bps,
        claimed: false,
        reward_paid: 0,
    };
    st.put_stake(&stake)?;
    let mut ids = st.stake_ids_of(user)?;
    ids.push(id);
    st.put_stake_ids(user, &ids)?;

    st.emit(Event::Staked { user: *user, stake_id: id, amount, lock_period_days: lock_days });
    Ok(id)
}

/// Claim the `index`-th stake of `user`: principal back from custody plus the
/// reward minted by the staking principal.
pub fn unstake(st: &mut StagedState<'_>, user: &Address, index: u32) -> Result<StakeId, EcoCredError> {
    let ids = st.stake_ids_of(user)?;
    let id = *ids
        .get(index as usize)
        .ok_or_else(|| EcoCredError::not_found("stake index", index))?;
    let mut stake = st.stake(id)?.ok_or_else(|| EcoCredError::not_found("stake", id))?;
    if stake.claimed {
        return Err(EcoCredError::AlreadyClaimed(id));
    }
    let now = st.now();
    if now < stake.end_time {
        return Err(EcoCredError::StillLocked { unlock_at: stake.end_time });
    }

    let custody = Module::Staking.address();
    let reward = reward_of(&stake, now)?;
    token::transfer(st, &custody, user, stake.amount)?;
    if reward > 0 {
        token::mint(st, &custody, user, reward)?;
    }

    stake.claimed = true;
    stake.reward_paid = reward;
    st.put_stake(&stake)?;
    info!(stake_id = id, %user, reward = %reward, "stake claimed");
    st.emit(Event::Unstaked { user: *user, stake_id: id, amount: stake.amount, reward });
    Ok(id)
}

#[cfg(test)]
mod tests {
    use ecocred_core::config::ConfigUpdate;
    use ecocred_core::transaction::Action;

    use super::*;
    use crate::testutil::{credits, Fixture, NOW};

    fn staked(f: &Fixture, amount: Amount, days: u32) {
        f.fund(f.company, amount);
        f.apply(f.company, Action::Approve { spender: Module::Staking.address(), amount }).unwrap();
        f.apply(f.company, Action::Stake { amount, lock_days: days }).unwrap();
    }

    #[test]
    fn one_year_at_five_percent() {
        assert_eq!(
            calculate_reward(credits(1_000), 500, 0, SECONDS_PER_YEAR, SECONDS_PER_YEAR).unwrap(),
            credits(50)
        );
        // capped at the lock period
        assert_eq!(
            calculate_reward(credits(1_000), 500, 0, SECONDS_PER_YEAR, 3 * SECONDS_PER_YEAR).unwrap(),
            credits(50)
        );
        assert_eq!(calculate_reward(credits(1_000), 500, 100, 200, 50).unwrap(), 0);
    }

    #[test]
    fn oversized_reward_overflows_instead_of_capping() {
        let huge = credits(100_000_000_000);
        let err = calculate_reward(huge, 500, 0, SECONDS_PER_YEAR, SECONDS_PER_YEAR).unwrap_err();
        assert!(matches!(err, EcoCredError::ArithmeticOverflow));

        let f = Fixture::new("stake_overflow");
        staked(&f, huge, 365);
        let err = f
            .apply_at(f.company, Action::Unstake { stake_index: 0 }, NOW + SECONDS_PER_YEAR)
            .unwrap_err();
        assert!(matches!(err, EcoCredError::ArithmeticOverflow));
        assert!(!f.engine.db.stakes_of(&f.company).unwrap()[0].claimed);
        assert_eq!(f.engine.db.balance_of(&Module::Staking.address()).unwrap(), huge);
    }

    #[test]
    fn unstake_returns_principal_and_reward() {
        let f = Fixture::new("stake_full");
        staked(&f, credits(1_000), 365);
        assert_eq!(f.engine.db.balance_of(&f.company).unwrap(), 0);
        assert_eq!(f.engine.db.balance_of(&Module::Staking.address()).unwrap(), credits(1_000));

        let err = f.apply_at(f.company, Action::Unstake { stake_index: 0 }, NOW + 10).unwrap_err();
        assert!(matches!(err, EcoCredError::StillLocked { .. }));

        let later = NOW + SECONDS_PER_YEAR;
        f.apply_at(f.company, Action::Unstake { stake_index: 0 }, later).unwrap();
        assert_eq!(f.engine.db.balance_of(&f.company).unwrap(), credits(1_050));
        assert_eq!(f.engine.db.stakes_of(&f.company).unwrap()[0].reward_paid, credits(50));

        let err = f.apply_at(f.company, Action::Unstake { stake_index: 0 }, later).unwrap_err();
        assert!(matches!(err, EcoCredError::AlreadyClaimed(_)));
        let err = f.apply_at(f.company, Action::Unstake { stake_index: 1 }, later).unwrap_err();
        assert!(matches!(err, EcoCredError::NotFound { .. }));
    }

    #[test]
    fn lock_bounds_enforced() {
        let f = Fixture::new("stake_bounds");
        f.fund(f.company, credits(10));
        f.apply(f.company, Action::Approve { spender: Module::Staking.address(), amount: credits(10) }).unwrap();
        let err = f.apply(f.company, Action::Stake { amount: credits(1), lock_days: 0 }).unwrap_err();
        assert!(matches!(err, EcoCredError::InvalidArgument(_)));
        let err = f.apply(f.company, Action::Stake { amount: credits(1), lock_days: 5_000 }).unwrap_err();
        assert!(matches!(err, EcoCredError::InvalidArgument(_)));
    }

    #[test]
    fn rate_is_snapshotted_at_stake_time() {
        let f = Fixture::new("stake_snapshot");
        staked(&f, credits(1_000), 365);
        f.apply(f.admin, Action::UpdateConfig { update: ConfigUpdate::RewardRateBps(1_000) }).unwrap();
        f.apply_at(f.company, Action::Unstake { stake_index: 0 }, NOW + SECONDS_PER_YEAR).unwrap();
        assert_eq!(f.engine.db.balance_of(&f.company).unwrap(), credits(1_050));
    }

    #[test]
    fn collapsed_minter_set_reverts_unstake() {
        let f = Fixture::new("stake_contention");
        staked(&f, credits(100), 1);
        f.apply(f.owner, Action::SetMinter { minter: Module::Verification.address() }).unwrap();

        let err = f
            .apply_at(f.company, Action::Unstake { stake_index: 0 }, NOW + SECONDS_PER_DAY)
            .unwrap_err();
        assert!(matches!(err, EcoCredError::Unauthorized(_)));
        // principal still in custody, stake still open
        assert_eq!(f.engine.db.balance_of(&Module::Staking.address()).unwrap(), credits(100));
        assert!(!f.engine.db.stakes_of(&f.company).unwrap()[0].claimed);
    }
}
