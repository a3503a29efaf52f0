//! Read-only rankings and platform statistics.

use ecocred_core::error::EcoCredError;
use ecocred_core::records::{ActionStatus, CompanyProfile, LeaderboardEntry, ListingStatus, PlatformStats};
use ecocred_core::types::Address;

use crate::keys;
use crate::staged::Counter;
use crate::view::LedgerView;

/// Companies ordered by credits earned (descending), ties broken by address.
fn ranked<V: LedgerView + ?Sized>(view: &V) -> Result<Vec<CompanyProfile>, EcoCredError> {
    let mut profiles = view.profiles()?;
    profiles.sort_by(|a, b| {
        b.total_credits_earned
            .cmp(&a.total_credits_earned)
            .then_with(|| a.company.cmp(&b.company))
    });
    Ok(profiles)
}

/// Top `limit` companies with 1-based ranks.
pub fn leaderboard<V: LedgerView + ?Sized>(view: &V, limit: usize) -> Result<Vec<LeaderboardEntry>, EcoCredError> {
    Ok(ranked(view)?
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, p)| LeaderboardEntry {
            rank: i as u32 + 1,
            company: p.company,
            credits: p.total_credits_earned,
            reputation_score: p.reputation_score,
            actions_verified: p.actions_verified,
        })
        .collect())
}

pub fn rank_of<V: LedgerView + ?Sized>(view: &V, company: &Address) -> Result<Option<u32>, EcoCredError> {
    Ok(ranked(view)?
        .iter()
        .position(|p| p.company == *company)
        .map(|i| i as u32 + 1))
}

pub fn platform_stats<V: LedgerView + ?Sized>(view: &V) -> Result<PlatformStats, EcoCredError> {
    let token = view.token_info()?;
    let mut stats = PlatformStats {
        total_supply: token.total_supply,
        total_burned: token.total_burned,
        total_retired: view.retired_total()?,
        retirements: view.counter(Counter::Retirement)?,
        badges_issued: view.counter(Counter::Badge)?,
        proposals: view.counter(Counter::Proposal)?,
        ..Default::default()
    };

    for action in view.load_all::<ecocred_core::records::EcoAction>(keys::ACTION)? {
        stats.actions_submitted += 1;
        match action.status {
            ActionStatus::Verified => stats.actions_verified += 1,
            ActionStatus::Rejected => stats.actions_rejected += 1,
            ActionStatus::Submitted => {}
        }
    }
    stats.companies = view.profiles()?.len() as u64;

    for listing in view.listings()? {
        if listing.status == ListingStatus::Active {
            stats.active_listings += 1;
            stats.credits_listed += listing.remaining;
        }
    }
    stats.total_staked = view
        .stakes()?
        .iter()
        .filter(|s| !s.claimed)
        .map(|s| s.amount)
        .sum();
    Ok(stats)
}
