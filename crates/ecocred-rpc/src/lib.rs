//! ecocred-rpc
//!
//! JSON-RPC 2.0 server for EcoCred ledger nodes.
//!
//! Namespace: "ecocred"
//! Methods:
//!   ecocred_sendTransaction    submit a transaction (hex-encoded bincode), returns the receipt
//!   ecocred_getReceipt         receipt by ledger sequence
//!   ecocred_getBalance         credit balance (base units)
//!   ecocred_getAllowance       credit allowance owner → spender
//!   ecocred_getNativeBalance   native currency balance
//!   ecocred_getTotalSupply     supply, burned and retired totals
//!   ecocred_getMinters         authorized minter set
//!   ecocred_getRole            role held by an address
//!   ecocred_getAction          eco action by id
//!   ecocred_getVerifications   verdicts recorded on an action
//!   ecocred_getCompany         company profile and leaderboard rank
//!   ecocred_getBadge           badge by id, with token URI
//!   ecocred_getListing         marketplace listing by id
//!   ecocred_getActiveListings  all active listings
//!   ecocred_getStakes          stakes of a user, with pending reward
//!   ecocred_getRetirement      retirement record by id
//!   ecocred_getProposal        governance proposal by id
//!   ecocred_getLeaderboard     companies ranked by earned credits
//!   ecocred_getPlatformStats   ledger-wide aggregates
//!   ecocred_getEvents          committed events from a sequence number
//!   ecocred_getConfig          current ledger configuration
//!   ecocred_getInfo            node and ledger summary

pub mod api;
pub mod server;
pub mod types;

pub use server::{RpcServer, RpcServerState, TxReply, TxSubmission};
pub use types::{
    RpcAction, RpcBadge, RpcCompany, RpcConfig, RpcInfo, RpcLeaderboardEntry, RpcListing,
    RpcPlatformStats, RpcProposal, RpcReceipt, RpcRetirement, RpcStake, RpcSupply,
};
