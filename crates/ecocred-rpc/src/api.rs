use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;

use ecocred_core::event::EventEnvelope;
use ecocred_core::records::VerificationRecord;

use crate::types::{
    RpcAction, RpcBadge, RpcCompany, RpcConfig, RpcInfo, RpcLeaderboardEntry, RpcListing,
    RpcPlatformStats, RpcProposal, RpcReceipt, RpcRetirement, RpcStake, RpcSupply,
};

/// EcoCred JSON-RPC 2.0 API definition.
///
/// All method names are prefixed with "ecocred_" via `namespace = "ecocred"`.
/// Addresses are `0x`-prefixed hex; amounts are base-unit decimal strings.
#[rpc(server, namespace = "ecocred")]
pub trait EcoCredApi {
    /// Submit a transaction. `tx_hex` is hex-encoded bincode(Transaction).
    /// Resolves once the transaction is applied; a rejected transaction
    /// surfaces as an error whose code identifies the failure kind.
    #[method(name = "sendTransaction")]
    async fn send_transaction(&self, tx_hex: String) -> RpcResult<RpcReceipt>;

    /// Receipt of the transaction at ledger position `seq`.
    #[method(name = "getReceipt")]
    async fn get_receipt(&self, seq: u64) -> RpcResult<Option<RpcReceipt>>;

    // ── Credit ledger ─────────────────────────────────────────────────────────

    #[method(name = "getBalance")]
    async fn get_balance(&self, address: String) -> RpcResult<String>;

    #[method(name = "getAllowance")]
    async fn get_allowance(&self, owner: String, spender: String) -> RpcResult<String>;

    #[method(name = "getNativeBalance")]
    async fn get_native_balance(&self, address: String) -> RpcResult<String>;

    #[method(name = "getTotalSupply")]
    async fn get_total_supply(&self) -> RpcResult<RpcSupply>;

    #[method(name = "getMinters")]
    async fn get_minters(&self) -> RpcResult<Vec<String>>;

    /// "none", "admin", "verifier" or "moderator".
    #[method(name = "getRole")]
    async fn get_role(&self, address: String) -> RpcResult<String>;

    // ── Entities ──────────────────────────────────────────────────────────────

    #[method(name = "getAction")]
    async fn get_action(&self, action_id: u64) -> RpcResult<Option<RpcAction>>;

    #[method(name = "getVerifications")]
    async fn get_verifications(&self, action_id: u64) -> RpcResult<Vec<VerificationRecord>>;

    #[method(name = "getCompany")]
    async fn get_company(&self, address: String) -> RpcResult<Option<RpcCompany>>;

    #[method(name = "getBadge")]
    async fn get_badge(&self, badge_id: u64) -> RpcResult<Option<RpcBadge>>;

    #[method(name = "getListing")]
    async fn get_listing(&self, listing_id: u64) -> RpcResult<Option<RpcListing>>;

    #[method(name = "getActiveListings")]
    async fn get_active_listings(&self) -> RpcResult<Vec<RpcListing>>;

    /// Stakes of `address` in creation order; the position is the unstake index.
    #[method(name = "getStakes")]
    async fn get_stakes(&self, address: String) -> RpcResult<Vec<RpcStake>>;

    #[method(name = "getRetirement")]
    async fn get_retirement(&self, retirement_id: u64) -> RpcResult<Option<RpcRetirement>>;

    #[method(name = "getProposal")]
    async fn get_proposal(&self, proposal_id: u64) -> RpcResult<Option<RpcProposal>>;

    // ── Analytics ─────────────────────────────────────────────────────────────

    #[method(name = "getLeaderboard")]
    async fn get_leaderboard(&self, limit: Option<usize>) -> RpcResult<Vec<RpcLeaderboardEntry>>;

    #[method(name = "getPlatformStats")]
    async fn get_platform_stats(&self) -> RpcResult<RpcPlatformStats>;

    /// Committed events with `seq >= from_seq`, oldest first.
    #[method(name = "getEvents")]
    async fn get_events(&self, from_seq: u64, limit: Option<usize>) -> RpcResult<Vec<EventEnvelope>>;

    // ── Node ──────────────────────────────────────────────────────────────────

    #[method(name = "getConfig")]
    async fn get_config(&self) -> RpcResult<RpcConfig>;

    #[method(name = "getInfo")]
    async fn get_info(&self) -> RpcResult<RpcInfo>;
}
