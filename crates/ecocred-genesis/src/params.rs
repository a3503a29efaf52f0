use ecocred_core::config::LedgerConfig;
use ecocred_core::types::{Address, Amount, Module};
use ecocred_core::units::amount_string;
use serde::{Deserialize, Serialize};

/// An initial balance. `amount` is a base-unit decimal string in JSON.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Allocation {
    pub address: Address,
    #[serde(with = "amount_string")]
    pub amount: Amount,
}

/// Founding state of a ledger, read from the `--genesis-params` JSON file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenesisParams {
    /// Token owner: manages minters, badge settings and configuration.
    pub owner: Address,
    #[serde(default)]
    pub admins: Vec<Address>,
    #[serde(default)]
    pub verifiers: Vec<Address>,
    #[serde(default)]
    pub moderators: Vec<Address>,
    /// Native currency balances, e.g. marketplace buyers.
    #[serde(default)]
    pub native_allocations: Vec<Allocation>,
    /// Credits minted at genesis.
    #[serde(default)]
    pub credit_allocations: Vec<Allocation>,
    #[serde(default)]
    pub config: LedgerConfig,
    /// Authorized minters. Defaults to the verification and staking principals.
    #[serde(default = "default_minters")]
    pub minters: Vec<Address>,
    /// Grant ADMIN to the governance principal so that passed proposals can
    /// change roles and configuration.
    #[serde(default = "default_true")]
    pub governance_admin: bool,
    #[serde(default)]
    pub badge_base_uri: String,
}

fn default_minters() -> Vec<Address> {
    vec![Module::Verification.address(), Module::Staking.address()]
}

fn default_true() -> bool {
    true
}

impl GenesisParams {
    /// Defaults around a single owner.
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            admins: Vec::new(),
            verifiers: Vec::new(),
            moderators: Vec::new(),
            native_allocations: Vec::new(),
            credit_allocations: Vec::new(),
            config: LedgerConfig::default(),
            minters: default_minters(),
            governance_admin: true,
            badge_base_uri: String::new(),
        }
    }
}
