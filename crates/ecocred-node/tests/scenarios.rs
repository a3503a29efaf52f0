//! End-to-end ledger scenarios driven through the public engine API.
//!
//! Each test seeds its own sled database through `apply_genesis` and submits
//! transactions the way the node's apply loop does.
//!
//! Run with:
//!   cargo test -p ecocred-node --test scenarios

use std::path::PathBuf;
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;

use ecocred_core::config::LedgerConfig;
use ecocred_core::constants::{CREDIT_UNIT, NATIVE_UNIT, SECONDS_PER_DAY};
use ecocred_core::error::EcoCredError;
use ecocred_core::records::{ActionStatus, ListingStatus};
use ecocred_core::transaction::{Action, Receipt, Transaction};
use ecocred_core::types::{Address, Amount, Module, Timestamp};
use ecocred_genesis::{apply_genesis, Allocation, GenesisParams};
use ecocred_state::{Counter, LedgerView, StateDb, StateEngine};

const NOW: Timestamp = 1_700_000_000;

fn credits(n: u128) -> Amount {
    n * CREDIT_UNIT
}

// ── Ledger lifecycle ──────────────────────────────────────────────────────────

struct Ledger {
    engine: StateEngine,
    path: PathBuf,
    remove_on_drop: bool,
    owner: Address,
    verifiers: Vec<Address>,
}

impl Ledger {
    fn open(path: &PathBuf) -> StateEngine {
        StateEngine::new(Arc::new(StateDb::open(path).expect("open state db")))
    }

    /// Fresh ledger with `verifier_count` verifiers and the given allocations.
    fn new(name: &str, config: LedgerConfig, verifier_count: usize, credit: &[(Address, Amount)], native: &[(Address, Amount)]) -> Self {
        let path = std::env::temp_dir().join(format!("ecocred_scenario_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&path);

        let owner = Address::derive(b"owner");
        let verifiers: Vec<Address> =
            (0..verifier_count).map(|i| Address::derive(format!("verifier-{i}").as_bytes())).collect();
        let mut params = GenesisParams::new(owner);
        params.config = config;
        params.admins.push(Address::derive(b"admin"));
        params.verifiers = verifiers.clone();
        params.credit_allocations =
            credit.iter().map(|(address, amount)| Allocation { address: *address, amount: *amount }).collect();
        params.native_allocations =
            native.iter().map(|(address, amount)| Allocation { address: *address, amount: *amount }).collect();

        let engine = Self::open(&path);
        apply_genesis(&engine.db, &params, NOW - 10).expect("genesis");
        Self { engine, path, remove_on_drop: true, owner, verifiers }
    }

    /// Release the database but keep its directory; returns the path.
    fn close(mut self) -> PathBuf {
        self.remove_on_drop = false;
        self.engine.db.flush().expect("flush");
        self.path.clone()
    }

    fn db(&self) -> &StateDb {
        &self.engine.db
    }

    fn apply(&self, caller: Address, action: Action) -> Result<Receipt, EcoCredError> {
        self.apply_at(caller, action, NOW)
    }

    fn apply_at(&self, caller: Address, action: Action, now: Timestamp) -> Result<Receipt, EcoCredError> {
        self.engine.apply(&Transaction::new(caller, action), now)
    }

    fn log_action(&self, company: Address, estimated: u64) -> u64 {
        self.apply(
            company,
            Action::LogEcoAction {
                title: "Reforestation, 12 ha".into(),
                description: "Native species planting along the river bank".into(),
                estimated_credits: estimated,
                location: "Minas Gerais".into(),
                category: "forestry".into(),
            },
        )
        .expect("log action")
        .output
        .id()
        .expect("action id")
    }

    fn verify(&self, verifier: Address, action_id: u64, approved: bool, credits: u64) -> Result<Receipt, EcoCredError> {
        self.apply(verifier, Action::VerifyAction { action_id, approved, actual_credits: credits, comments: None })
    }

    fn event_kinds(&self) -> Vec<&'static str> {
        self.db()
            .events_from(1, 100_000)
            .expect("events")
            .into_iter()
            .map(|e| e.event.kind())
            .collect()
    }
}

impl Drop for Ledger {
    fn drop(&mut self) {
        if self.remove_on_drop {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }
}

fn threshold(k: u32) -> LedgerConfig {
    LedgerConfig { verification_threshold: k, ..Default::default() }
}

// ── Scenario 1: two-verifier approval ─────────────────────────────────────────

#[test]
fn two_verifier_approval_mints_and_issues_badge() {
    let company = Address::derive(b"company");
    let ledger = Ledger::new("approval", threshold(2), 2, &[], &[]);
    let id = ledger.log_action(company, 500);

    ledger.verify(ledger.verifiers[0], id, true, 480).unwrap();
    assert_eq!(ledger.db().action(id).unwrap().unwrap().status, ActionStatus::Submitted);
    assert_eq!(ledger.db().balance_of(&company).unwrap(), 0);

    ledger.verify(ledger.verifiers[1], id, true, 480).unwrap();
    let action = ledger.db().action(id).unwrap().unwrap();
    assert_eq!(action.status, ActionStatus::Verified);
    assert_eq!(action.awarded_credits, credits(480));
    assert_eq!(ledger.db().balance_of(&company).unwrap(), credits(480));
    assert_eq!(ledger.db().token_info().unwrap().total_supply, credits(480));
    assert_eq!(ledger.db().badge_count(&company).unwrap(), 1);
    assert_eq!(ledger.db().badge(1).unwrap().unwrap().action_id, Some(id));

    let err = ledger.verify(ledger.verifiers[0], id, true, 480).unwrap_err();
    assert!(matches!(err, EcoCredError::AlreadyFinalized(_)));

    let kinds = ledger.event_kinds();
    assert_eq!(kinds.iter().filter(|k| **k == "ActionFullyVerified").count(), 1);
    assert_eq!(kinds.iter().filter(|k| **k == "ActionVerified").count(), 2);

    let profile = ledger.db().profile(&company).unwrap().unwrap();
    assert_eq!(profile.actions_verified, 1);
    assert_eq!(profile.reputation_score, 48);
}

#[test]
fn single_rejection_rejects_action() {
    let company = Address::derive(b"company");
    let ledger = Ledger::new("rejection", threshold(2), 2, &[], &[]);
    let id = ledger.log_action(company, 500);

    ledger.verify(ledger.verifiers[0], id, true, 480).unwrap();
    ledger.verify(ledger.verifiers[1], id, false, 0).unwrap();

    let action = ledger.db().action(id).unwrap().unwrap();
    assert_eq!(action.status, ActionStatus::Rejected);
    assert_eq!(ledger.db().balance_of(&company).unwrap(), 0);
    assert_eq!(ledger.db().badge_count(&company).unwrap(), 0);
    assert_eq!(ledger.db().profile(&company).unwrap().unwrap().actions_rejected, 1);
}

#[test]
fn verification_is_order_independent() {
    let company = Address::derive(b"company");
    let mut rng = rand::thread_rng();
    for round in 0..5 {
        let ledger = Ledger::new(&format!("order_{round}"), threshold(3), 5, &[], &[]);
        let id = ledger.log_action(company, 200);

        let mut order = ledger.verifiers.clone();
        order.shuffle(&mut rng);
        for (i, verifier) in order.iter().take(3).enumerate() {
            // a repeated verdict never counts twice
            if i == 1 {
                let err = ledger.verify(order[0], id, true, 150).unwrap_err();
                assert!(matches!(err, EcoCredError::AlreadyRecorded { .. }));
            }
            let status_before = ledger.db().action(id).unwrap().unwrap().status;
            assert_eq!(status_before, ActionStatus::Submitted, "finalized before verdict {}", i + 1);
            ledger.verify(*verifier, id, true, 150).unwrap();
        }

        let action = ledger.db().action(id).unwrap().unwrap();
        assert_eq!(action.status, ActionStatus::Verified);
        assert_eq!(action.approval_count, 3);
        assert_eq!(ledger.db().balance_of(&company).unwrap(), credits(150));
        let err = ledger.verify(order[3], id, true, 150).unwrap_err();
        assert!(matches!(err, EcoCredError::AlreadyFinalized(_)));
    }
}

#[test]
fn badge_threshold_is_inclusive() {
    let at = Address::derive(b"at-threshold");
    let below = Address::derive(b"below-threshold");
    let ledger = Ledger::new("badge_boundary", threshold(1), 1, &[], &[]);

    let a = ledger.log_action(at, 100);
    ledger.verify(ledger.verifiers[0], a, true, 100).unwrap();
    let b = ledger.log_action(below, 99);
    ledger.verify(ledger.verifiers[0], b, true, 99).unwrap();

    assert_eq!(ledger.db().badge_count(&at).unwrap(), 1);
    assert_eq!(ledger.db().badge_count(&below).unwrap(), 0);
    assert_eq!(ledger.db().counter(Counter::Badge).unwrap(), 1);
}

// ── Scenario 2: partial marketplace purchase ──────────────────────────────────

#[test]
fn partial_purchase_keeps_listing_active() {
    let seller = Address::derive(b"seller");
    let buyer = Address::derive(b"buyer");
    let ledger = Ledger::new("market", LedgerConfig::default(), 1, &[(seller, credits(100))], &[(buyer, 10 * NATIVE_UNIT)]);
    let price = NATIVE_UNIT / 1_000;

    ledger.apply(seller, Action::Approve { spender: Module::Marketplace.address(), amount: credits(100) }).unwrap();
    let listing = ledger
        .apply(seller, Action::CreateListing { amount: credits(100), price_per_credit: price })
        .unwrap()
        .output
        .id()
        .unwrap();

    let total = 50 * NATIVE_UNIT / 1_000;
    let fee = total * 250 / 10_000;
    ledger.apply(buyer, Action::Purchase { listing_id: listing, amount: credits(50), payment: total }).unwrap();

    assert_eq!(ledger.db().balance_of(&buyer).unwrap(), credits(50));
    assert_eq!(ledger.db().balance_of(&seller).unwrap(), credits(50));
    let l = ledger.db().listing(listing).unwrap().unwrap();
    assert_eq!(l.remaining, credits(50));
    assert_eq!(l.status, ListingStatus::Active);
    assert_eq!(ledger.db().native_balance_of(&seller).unwrap(), total - fee);
    assert_eq!(ledger.db().native_balance_of(&ledger.owner).unwrap(), fee);
    assert_eq!(ledger.db().native_balance_of(&buyer).unwrap(), 10 * NATIVE_UNIT - total);

    // overpaying charges only the computed price
    ledger.apply(buyer, Action::Purchase { listing_id: listing, amount: credits(50), payment: NATIVE_UNIT }).unwrap();
    assert_eq!(ledger.db().listing(listing).unwrap().unwrap().status, ListingStatus::Sold);
    assert_eq!(ledger.db().native_balance_of(&buyer).unwrap(), 10 * NATIVE_UNIT - 2 * total);

    let err = ledger.apply(buyer, Action::Purchase { listing_id: listing, amount: 1, payment: NATIVE_UNIT }).unwrap_err();
    assert!(matches!(err, EcoCredError::NotActive(_)));
}

// ── Scenario 3: staking lock and reward ───────────────────────────────────────

#[test]
fn stake_locks_until_end_and_pays_reward() {
    let staker = Address::derive(b"staker");
    let ledger = Ledger::new("staking", LedgerConfig::default(), 1, &[(staker, credits(30))], &[]);

    ledger.apply(staker, Action::Approve { spender: Module::Staking.address(), amount: credits(30) }).unwrap();
    ledger.apply(staker, Action::Stake { amount: credits(30), lock_days: 30 }).unwrap();
    assert_eq!(ledger.db().balance_of(&staker).unwrap(), 0);

    let err = ledger
        .apply_at(staker, Action::Unstake { stake_index: 0 }, NOW + 29 * SECONDS_PER_DAY)
        .unwrap_err();
    assert!(matches!(err, EcoCredError::StillLocked { .. }));

    ledger.apply_at(staker, Action::Unstake { stake_index: 0 }, NOW + 31 * SECONDS_PER_DAY).unwrap();
    // reward accrues over the 30-day lock only
    let reward = credits(30) * 500 * 30 / (10_000 * 365);
    assert_eq!(ledger.db().balance_of(&staker).unwrap(), credits(30) + reward);
    assert_eq!(ledger.db().token_info().unwrap().total_supply, credits(30) + reward);

    let err = ledger
        .apply_at(staker, Action::Unstake { stake_index: 0 }, NOW + 32 * SECONDS_PER_DAY)
        .unwrap_err();
    assert!(matches!(err, EcoCredError::AlreadyClaimed(_)));
}

#[test]
fn collapsing_minters_starves_staking_rewards() {
    let staker = Address::derive(b"staker");
    let company = Address::derive(b"company");
    let ledger = Ledger::new("contention", threshold(1), 1, &[(staker, credits(30))], &[]);
    ledger.apply(staker, Action::Approve { spender: Module::Staking.address(), amount: credits(30) }).unwrap();
    ledger.apply(staker, Action::Stake { amount: credits(30), lock_days: 30 }).unwrap();

    ledger.apply(ledger.owner, Action::SetMinter { minter: Module::Verification.address() }).unwrap();

    let err = ledger
        .apply_at(staker, Action::Unstake { stake_index: 0 }, NOW + 30 * SECONDS_PER_DAY)
        .unwrap_err();
    assert!(matches!(err, EcoCredError::Unauthorized(_)));
    assert!(!ledger.db().stakes_of(&staker).unwrap()[0].claimed);

    // verification still mints
    let id = ledger.log_action(company, 10);
    ledger.verify(ledger.verifiers[0], id, true, 10).unwrap();
    assert_eq!(ledger.db().balance_of(&company).unwrap(), credits(10));
}

// ── Ledger invariants ─────────────────────────────────────────────────────────

#[test]
fn mint_and_transfer_conserve_value() {
    let alice = Address::derive(b"alice");
    let bob = Address::derive(b"bob");
    let ledger = Ledger::new("conservation", threshold(1), 1, &[], &[]);
    let verifier = ledger.verifiers[0];
    let mut rng = rand::thread_rng();

    let mut supply = 0u128;
    for _ in 0..20 {
        // credits only enter through verification
        let awarded: u64 = rng.gen_range(1..=1_000);
        let id = ledger.log_action(alice, awarded);
        ledger.verify(verifier, id, true, awarded).unwrap();
        supply += credits(awarded as u128);
        assert_eq!(ledger.db().token_info().unwrap().total_supply, supply);

        let before = ledger.db().balance_of(&alice).unwrap() + ledger.db().balance_of(&bob).unwrap();
        let t = rng.gen_range(0..=ledger.db().balance_of(&alice).unwrap());
        if t > 0 {
            ledger.apply(alice, Action::Transfer { to: bob, amount: t }).unwrap();
        }
        let after = ledger.db().balance_of(&alice).unwrap() + ledger.db().balance_of(&bob).unwrap();
        assert_eq!(before, after);
    }
    assert_eq!(ledger.db().balance_of(&alice).unwrap() + ledger.db().balance_of(&bob).unwrap(), supply);

    // the minting principal cannot be borrowed by an outside caller
    let err = ledger
        .apply(Module::Verification.address(), Action::Mint { to: alice, amount: 1 })
        .unwrap_err();
    assert!(matches!(err, EcoCredError::Unauthorized(_)));
    let err = ledger.apply(alice, Action::Mint { to: alice, amount: 1 }).unwrap_err();
    assert!(matches!(err, EcoCredError::Unauthorized(_)));
    assert_eq!(ledger.db().token_info().unwrap().total_supply, supply);
}

#[test]
fn allowance_is_spent_exactly() {
    let owner = Address::derive(b"holder");
    let spender = Address::derive(b"spender");
    let ledger = Ledger::new("allowance", LedgerConfig::default(), 1, &[(owner, credits(10))], &[]);

    ledger.apply(owner, Action::Approve { spender, amount: credits(6) }).unwrap();
    ledger.apply(spender, Action::TransferFrom { owner, to: spender, amount: credits(4) }).unwrap();
    assert_eq!(ledger.db().allowance(&owner, &spender).unwrap(), credits(2));

    let err = ledger
        .apply(spender, Action::TransferFrom { owner, to: spender, amount: credits(3) })
        .unwrap_err();
    assert!(matches!(err, EcoCredError::InsufficientAllowance { .. }));
}

#[test]
fn rejected_transaction_consumes_nothing() {
    let company = Address::derive(b"company");
    let ledger = Ledger::new("rollback", LedgerConfig::default(), 1, &[(company, credits(5))], &[]);
    let txs = ledger.db().tx_count().unwrap();
    let events = ledger.db().event_count().unwrap();

    let err = ledger
        .apply(company, Action::RetireCredits { amount: credits(6), reason: "offset".into(), certificate_id: "C-1".into() })
        .unwrap_err();
    assert!(matches!(err, EcoCredError::InsufficientBalance { .. }));
    assert_eq!(ledger.db().tx_count().unwrap(), txs);
    assert_eq!(ledger.db().event_count().unwrap(), events);
    assert_eq!(ledger.db().counter(Counter::Retirement).unwrap(), 0);

    let r = ledger
        .apply(company, Action::RetireCredits { amount: credits(5), reason: "offset".into(), certificate_id: "C-1".into() })
        .unwrap();
    assert_eq!(r.output.id(), Some(1));
    assert_eq!(r.seq, txs + 1);
    assert_eq!(r.events[0].seq, events + 1);
}

#[test]
fn counters_and_events_survive_reopen() {
    let company = Address::derive(b"company");
    let ledger = Ledger::new("reopen", threshold(1), 1, &[], &[]);
    let verifier = ledger.verifiers[0];
    let first = ledger.log_action(company, 10);
    ledger.verify(verifier, first, true, 10).unwrap();
    let events = ledger.db().event_count().unwrap();
    let txs = ledger.db().tx_count().unwrap();
    let path = ledger.close();

    let engine = Ledger::open(&path);
    assert_eq!(engine.db.tx_count().unwrap(), txs);
    assert_eq!(engine.db.event_count().unwrap(), events);
    assert_eq!(engine.db.balance_of(&company).unwrap(), credits(10));

    let tx = Transaction::new(
        company,
        Action::LogEcoAction {
            title: "Heat pumps".into(),
            description: String::new(),
            estimated_credits: 5,
            location: String::new(),
            category: "energy".into(),
        },
    );
    let receipt = engine.apply(&tx, NOW + 60).unwrap();
    assert_eq!(receipt.output.id(), Some(first + 1));
    assert_eq!(receipt.seq, txs + 1);
    assert_eq!(receipt.events[0].seq, events + 1);
    assert_eq!(engine.db.receipt_by_tx(&receipt.tx_id).unwrap().unwrap(), receipt);

    drop(engine);
    let _ = std::fs::remove_dir_all(&path);
}
