use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObject;
use tokio::sync::{mpsc, oneshot};
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

use ecocred_core::constants::EVENT_SCHEMA_VERSION;
use ecocred_core::error::EcoCredError;
use ecocred_core::event::EventEnvelope;
use ecocred_core::records::{ListingStatus, VerificationRecord};
use ecocred_core::transaction::{Receipt, Transaction};
use ecocred_core::types::{Address, Module};
use ecocred_genesis::GENESIS_HASH_META;
use ecocred_state::{analytics, badges, staking, LedgerView, StateDb};

use crate::api::EcoCredApiServer;
use crate::types::{
    RpcAction, RpcBadge, RpcCompany, RpcConfig, RpcInfo, RpcLeaderboardEntry, RpcListing,
    RpcPlatformStats, RpcProposal, RpcReceipt, RpcRetirement, RpcStake, RpcSupply,
};

/// Default and maximum page size for list queries.
const DEFAULT_PAGE: usize = 100;
const MAX_PAGE: usize = 1_000;

/// Reply channel for a submitted transaction.
pub type TxReply = oneshot::Sender<Result<Receipt, EcoCredError>>;

/// A transaction queued for the node's apply loop.
pub type TxSubmission = (Transaction, TxReply);

fn rpc_err(code: i32, msg: impl Into<String>) -> ErrorObject<'static> {
    ErrorObject::owned(code, msg.into(), None::<()>)
}

fn ledger_err(e: EcoCredError) -> ErrorObject<'static> {
    rpc_err(e.code(), e.to_string())
}

fn parse_address(s: &str) -> RpcResult<Address> {
    Address::from_str(s).map_err(|e| rpc_err(-32602, format!("invalid address {s:?}: {e}")))
}

fn page(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_PAGE).clamp(1, MAX_PAGE)
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Shared state passed to the RPC server.
pub struct RpcServerState {
    pub db: Arc<StateDb>,
    /// Forwards submitted transactions to the node's apply loop. `None`
    /// makes the server read-only.
    pub tx_sender: Option<mpsc::Sender<TxSubmission>>,
}

/// The RPC server implementation.
pub struct RpcServer {
    state: Arc<RpcServerState>,
}

impl RpcServer {
    pub fn new(state: Arc<RpcServerState>) -> Self {
        Self { state }
    }

    /// Start the JSON-RPC server on `addr`. Returns a handle to stop it.
    pub async fn start(self, addr: SocketAddr) -> anyhow::Result<ServerHandle> {
        let cors = tower::ServiceBuilder::new().layer(CorsLayer::permissive());
        let server = Server::builder().set_http_middleware(cors).build(addr).await?;
        let module = self.into_rpc();
        let handle = server.start(module);
        info!(%addr, "RPC server started");
        Ok(handle)
    }

    fn db(&self) -> &StateDb {
        &self.state.db
    }
}

#[async_trait]
impl EcoCredApiServer for RpcServer {
    async fn send_transaction(&self, tx_hex: String) -> RpcResult<RpcReceipt> {
        let bytes = hex::decode(tx_hex.trim_start_matches("0x"))
            .map_err(|e| rpc_err(-32602, format!("invalid hex: {e}")))?;
        let tx: Transaction = bincode::deserialize(&bytes)
            .map_err(|e| rpc_err(-32602, format!("invalid transaction encoding: {e}")))?;

        let sender = self
            .state
            .tx_sender
            .as_ref()
            .ok_or_else(|| rpc_err(-32603, "node does not accept transactions"))?;

        debug!(caller = %tx.caller, module = %tx.action.module(), "transaction submitted");
        let (reply, outcome) = oneshot::channel();
        sender
            .send((tx, reply))
            .await
            .map_err(|_| rpc_err(-32603, "apply loop has shut down"))?;
        let receipt = outcome
            .await
            .map_err(|_| rpc_err(-32603, "apply loop dropped the transaction"))?
            .map_err(ledger_err)?;
        Ok(receipt.into())
    }

    async fn get_receipt(&self, seq: u64) -> RpcResult<Option<RpcReceipt>> {
        Ok(self.db().receipt(seq).map_err(ledger_err)?.map(RpcReceipt::from))
    }

    async fn get_balance(&self, address: String) -> RpcResult<String> {
        let a = parse_address(&address)?;
        Ok(self.db().balance_of(&a).map_err(ledger_err)?.to_string())
    }

    async fn get_allowance(&self, owner: String, spender: String) -> RpcResult<String> {
        let owner = parse_address(&owner)?;
        let spender = parse_address(&spender)?;
        Ok(self.db().allowance(&owner, &spender).map_err(ledger_err)?.to_string())
    }

    async fn get_native_balance(&self, address: String) -> RpcResult<String> {
        let a = parse_address(&address)?;
        Ok(self.db().native_balance_of(&a).map_err(ledger_err)?.to_string())
    }

    async fn get_total_supply(&self) -> RpcResult<RpcSupply> {
        let info = self.db().token_info().map_err(ledger_err)?;
        let retired = self.db().retired_total().map_err(ledger_err)?;
        Ok(RpcSupply {
            total_supply: info.total_supply.to_string(),
            total_burned: info.total_burned.to_string(),
            total_retired: retired.to_string(),
        })
    }

    async fn get_minters(&self) -> RpcResult<Vec<String>> {
        let minters = self.db().minters().map_err(ledger_err)?;
        Ok(minters.into_iter().map(|m| m.to_hex()).collect())
    }

    async fn get_role(&self, address: String) -> RpcResult<String> {
        let a = parse_address(&address)?;
        Ok(self.db().role_of(&a).map_err(ledger_err)?.to_string())
    }

    async fn get_action(&self, action_id: u64) -> RpcResult<Option<RpcAction>> {
        Ok(self.db().action(action_id).map_err(ledger_err)?.map(RpcAction::from))
    }

    async fn get_verifications(&self, action_id: u64) -> RpcResult<Vec<VerificationRecord>> {
        self.db().verifications(action_id).map_err(ledger_err)
    }

    async fn get_company(&self, address: String) -> RpcResult<Option<RpcCompany>> {
        let a = parse_address(&address)?;
        let db = self.db();
        let Some(profile) = db.profile(&a).map_err(ledger_err)? else {
            return Ok(None);
        };
        let balance = db.balance_of(&a).map_err(ledger_err)?;
        let badges = db.badge_count(&a).map_err(ledger_err)?;
        let rank = analytics::rank_of(db, &a).map_err(ledger_err)?;
        Ok(Some(RpcCompany::new(profile, balance, badges, rank)))
    }

    async fn get_badge(&self, badge_id: u64) -> RpcResult<Option<RpcBadge>> {
        let Some(badge) = self.db().badge(badge_id).map_err(ledger_err)? else {
            return Ok(None);
        };
        let uri = badges::token_uri(self.db(), badge_id).map_err(ledger_err)?;
        Ok(Some(RpcBadge::new(badge, uri)))
    }

    async fn get_listing(&self, listing_id: u64) -> RpcResult<Option<RpcListing>> {
        Ok(self.db().listing(listing_id).map_err(ledger_err)?.map(RpcListing::from))
    }

    async fn get_active_listings(&self) -> RpcResult<Vec<RpcListing>> {
        let listings = self.db().listings().map_err(ledger_err)?;
        Ok(listings
            .into_iter()
            .filter(|l| l.status == ListingStatus::Active)
            .map(RpcListing::from)
            .collect())
    }

    async fn get_stakes(&self, address: String) -> RpcResult<Vec<RpcStake>> {
        let a = parse_address(&address)?;
        let now = now();
        let stakes = self.db().stakes_of(&a).map_err(ledger_err)?;
        stakes
            .into_iter()
            .enumerate()
            .map(|(i, s)| -> RpcResult<RpcStake> {
                let reward = if s.claimed {
                    s.reward_paid
                } else {
                    staking::reward_of(&s, now).map_err(ledger_err)?
                };
                Ok(RpcStake::new(i as u32, s, reward))
            })
            .collect()
    }

    async fn get_retirement(&self, retirement_id: u64) -> RpcResult<Option<RpcRetirement>> {
        Ok(self.db().retirement(retirement_id).map_err(ledger_err)?.map(RpcRetirement::from))
    }

    async fn get_proposal(&self, proposal_id: u64) -> RpcResult<Option<RpcProposal>> {
        let now = now();
        Ok(self
            .db()
            .proposal(proposal_id)
            .map_err(ledger_err)?
            .map(|p| RpcProposal::new(p, now)))
    }

    async fn get_leaderboard(&self, limit: Option<usize>) -> RpcResult<Vec<RpcLeaderboardEntry>> {
        let board = analytics::leaderboard(self.db(), page(limit)).map_err(ledger_err)?;
        Ok(board.into_iter().map(RpcLeaderboardEntry::from).collect())
    }

    async fn get_platform_stats(&self) -> RpcResult<RpcPlatformStats> {
        Ok(analytics::platform_stats(self.db()).map_err(ledger_err)?.into())
    }

    async fn get_events(&self, from_seq: u64, limit: Option<usize>) -> RpcResult<Vec<EventEnvelope>> {
        self.db().events_from(from_seq, page(limit)).map_err(ledger_err)
    }

    async fn get_config(&self) -> RpcResult<RpcConfig> {
        Ok(self.db().config().map_err(ledger_err)?.into())
    }

    async fn get_info(&self) -> RpcResult<RpcInfo> {
        let db = self.db();
        let genesis_hash = db
            .get_meta(GENESIS_HASH_META)
            .map_err(ledger_err)?
            .map(|b| String::from_utf8_lossy(&b).into_owned());
        Ok(RpcInfo {
            node_version: env!("CARGO_PKG_VERSION").to_string(),
            event_schema_version: EVENT_SCHEMA_VERSION,
            genesis_time: db.genesis_time().map_err(ledger_err)?,
            genesis_hash,
            tx_count: db.tx_count().map_err(ledger_err)?,
            event_count: db.event_count().map_err(ledger_err)?,
            token_owner: db.token_info().map_err(ledger_err)?.owner,
            modules: Module::ALL.iter().map(|m| (*m, m.address())).collect(),
            accepts_transactions: self.state.tx_sender.is_some(),
        })
    }
}
