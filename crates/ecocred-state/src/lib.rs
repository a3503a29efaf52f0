//! ecocred-state
//!
//! Persistent ledger state and the transition engine. Every subsystem
//! (credit ledger, access control, badges, verification, marketplace,
//! staking, retirement, governance) is a module operating on a
//! `StagedState` overlay; the engine commits the overlay atomically.

pub mod access;
pub mod analytics;
pub mod badges;
pub mod db;
pub mod engine;
pub mod governance;
pub mod keys;
pub mod marketplace;
pub mod reputation;
pub mod retirement;
pub mod staged;
pub mod staking;
pub mod token;
pub mod verification;
pub mod view;

#[cfg(test)]
mod testutil;

pub use db::StateDb;
pub use engine::StateEngine;
pub use reputation::{FlatMultiplier, ReputationStrategy, TieredMultiplier};
pub use staged::{Counter, StagedState};
pub use view::{LedgerView, StateRead};
