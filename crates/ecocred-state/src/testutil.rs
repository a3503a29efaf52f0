//! Shared fixtures for the subsystem tests.

use std::collections::BTreeSet;
use std::sync::Arc;

use ecocred_core::config::LedgerConfig;
use ecocred_core::constants::CREDIT_UNIT;
use ecocred_core::error::EcoCredError;
use ecocred_core::records::TokenInfo;
use ecocred_core::transaction::{Action, Output, Receipt, Transaction};
use ecocred_core::types::{Address, Amount, Module, Role, Timestamp};

use crate::db::StateDb;
use crate::engine::StateEngine;
use crate::staged::StagedState;

pub const NOW: Timestamp = 1_700_000_000;

pub fn temp_db(name: &str) -> StateDb {
    let dir = std::env::temp_dir().join(format!("ecocred_engine_test_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    StateDb::open(&dir).expect("open temp db")
}

pub fn credits(n: u128) -> Amount {
    n * CREDIT_UNIT
}

pub struct Fixture {
    pub engine: StateEngine,
    pub owner: Address,
    pub admin: Address,
    pub verifiers: [Address; 3],
    pub company: Address,
    pub buyer: Address,
}

impl Fixture {
    pub fn new(name: &str) -> Self {
        Self::with_config(name, LedgerConfig::default())
    }

    /// Owner, one admin, three verifiers; verification and staking principals
    /// mint; governance holds ADMIN; the buyer owns 1 000 native units.
    pub fn with_config(name: &str, config: LedgerConfig) -> Self {
        let db = temp_db(name);
        let owner = Address::derive(b"owner");
        let admin = Address::derive(b"admin");
        let verifiers = [Address::derive(b"v1"), Address::derive(b"v2"), Address::derive(b"v3")];
        let company = Address::derive(b"company");
        let buyer = Address::derive(b"buyer");

        let mut st = StagedState::new(&db, NOW - 1);
        st.put_token_info(&TokenInfo { owner, ..Default::default() }).unwrap();
        let minters: BTreeSet<Address> =
            [Module::Verification.address(), Module::Staking.address()].into_iter().collect();
        st.put_minters(&minters).unwrap();
        let issuers: BTreeSet<Address> = [Module::Verification.address()].into_iter().collect();
        st.put_badge_issuers(&issuers).unwrap();
        st.put_badge_base_uri("ipfs://badges/").unwrap();
        st.put_config(&config).unwrap();
        st.put_role(&admin, Role::Admin).unwrap();
        st.put_role(&Module::Governance.address(), Role::Admin).unwrap();
        for v in &verifiers {
            st.put_role(v, Role::Verifier).unwrap();
        }
        st.put_native_balance(&buyer, credits(1_000)).unwrap();
        st.mark_initialized().unwrap();
        db.commit(st, None, Output::None).unwrap();

        Self { engine: StateEngine::new(Arc::new(db)), owner, admin, verifiers, company, buyer }
    }

    pub fn apply(&self, caller: Address, action: Action) -> Result<Receipt, EcoCredError> {
        self.apply_at(caller, action, NOW)
    }

    pub fn apply_at(&self, caller: Address, action: Action, now: Timestamp) -> Result<Receipt, EcoCredError> {
        self.engine.apply(&Transaction::new(caller, action), now)
    }

    /// Run `action` as `module`'s principal through internal dispatch, the
    /// way finalization, unstaking and governance reach other modules.
    pub fn apply_as(&self, module: Module, action: Action) -> Result<Receipt, EcoCredError> {
        let mut st = StagedState::new(&self.engine.db, NOW);
        let output = self.engine.dispatch(&mut st, &module.address(), &action)?;
        self.engine.db.commit(st, None, output)
    }

    /// Seed `to` with `amount` credits by minting as the verification principal.
    pub fn fund(&self, to: Address, amount: Amount) {
        self.apply_as(Module::Verification, Action::Mint { to, amount }).unwrap();
    }

    /// Submit an action as the fixture company; returns its id.
    pub fn log_action(&self, estimated: u64) -> u64 {
        self.apply(
            self.company,
            Action::LogEcoAction {
                title: "Solar retrofit".into(),
                description: "Rooftop panels on the main plant".into(),
                estimated_credits: estimated,
                location: "Lisbon".into(),
                category: "renewable".into(),
            },
        )
        .unwrap()
        .output
        .id()
        .unwrap()
    }
}
