use anyhow::{bail, Context};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use ecocred_core::event::EventEnvelope;
use ecocred_core::transaction::Transaction;
use ecocred_core::types::{Address, Amount};
use ecocred_rpc::{
    RpcAction, RpcConfig, RpcInfo, RpcLeaderboardEntry, RpcListing, RpcPlatformStats, RpcProposal,
    RpcReceipt, RpcStake,
};

/// JSON-RPC 2.0 client used by the CLI to talk to a running node.
///
/// Uses raw HTTP POST with serde_json rather than the full jsonrpsee client.
pub struct CliRpcClient {
    url: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct Request<'a, P: Serialize> {
    jsonrpc: &'static str,
    method: &'a str,
    params: P,
    id: u64,
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    result: serde_json::Value,
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: i32,
    message: String,
}

fn parse_amount_str(s: &str) -> anyhow::Result<Amount> {
    s.parse().with_context(|| format!("parsing amount {s:?}"))
}

impl CliRpcClient {
    pub fn new(url: &str) -> Self {
        Self { url: url.to_string(), client: reqwest::Client::new() }
    }

    /// Call a JSON-RPC method and decode the `result` field.
    async fn call<P: Serialize, T: DeserializeOwned>(&self, method: &str, params: P) -> anyhow::Result<T> {
        let body = Request { jsonrpc: "2.0", method, params, id: 1 };
        debug!(method, url = %self.url, "rpc call");

        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("connecting to node at {}", self.url))?;

        let resp: Response = resp.json().await.context("parsing RPC response")?;
        if let Some(err) = resp.error {
            bail!("RPC error {}: {}", err.code, err.message);
        }
        serde_json::from_value(resp.result).with_context(|| format!("decoding {method} result"))
    }

    /// Submit a transaction and wait for its receipt.
    pub async fn send_transaction(&self, tx: &Transaction) -> anyhow::Result<RpcReceipt> {
        let bytes = bincode::serialize(tx).context("serializing transaction")?;
        self.call("ecocred_sendTransaction", [hex::encode(bytes)]).await
    }

    pub async fn get_balance(&self, address: &Address) -> anyhow::Result<Amount> {
        let s: String = self.call("ecocred_getBalance", [address.to_hex()]).await?;
        parse_amount_str(&s)
    }

    pub async fn get_native_balance(&self, address: &Address) -> anyhow::Result<Amount> {
        let s: String = self.call("ecocred_getNativeBalance", [address.to_hex()]).await?;
        parse_amount_str(&s)
    }

    pub async fn get_role(&self, address: &Address) -> anyhow::Result<String> {
        self.call("ecocred_getRole", [address.to_hex()]).await
    }

    pub async fn get_action(&self, id: u64) -> anyhow::Result<Option<RpcAction>> {
        self.call("ecocred_getAction", [id]).await
    }

    pub async fn get_active_listings(&self) -> anyhow::Result<Vec<RpcListing>> {
        self.call("ecocred_getActiveListings", [(); 0]).await
    }

    pub async fn get_stakes(&self, address: &Address) -> anyhow::Result<Vec<RpcStake>> {
        self.call("ecocred_getStakes", [address.to_hex()]).await
    }

    pub async fn get_proposal(&self, id: u64) -> anyhow::Result<Option<RpcProposal>> {
        self.call("ecocred_getProposal", [id]).await
    }

    pub async fn get_leaderboard(&self, limit: usize) -> anyhow::Result<Vec<RpcLeaderboardEntry>> {
        self.call("ecocred_getLeaderboard", [limit]).await
    }

    pub async fn get_platform_stats(&self) -> anyhow::Result<RpcPlatformStats> {
        self.call("ecocred_getPlatformStats", [(); 0]).await
    }

    pub async fn get_events(&self, from_seq: u64, limit: usize) -> anyhow::Result<Vec<EventEnvelope>> {
        self.call("ecocred_getEvents", (from_seq, limit)).await
    }

    pub async fn get_config(&self) -> anyhow::Result<RpcConfig> {
        self.call("ecocred_getConfig", [(); 0]).await
    }

    pub async fn get_info(&self) -> anyhow::Result<RpcInfo> {
        self.call("ecocred_getInfo", [(); 0]).await
    }
}
