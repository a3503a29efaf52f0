//! Smoke test for the ecocred-node binary.
//!
//! Spawns a node on a free port with a fresh data directory, then drives a
//! verification round trip over JSON-RPC.
//!
//! Run with:
//!   cargo test -p ecocred-node --test smoke

use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use ecocred_core::config::LedgerConfig;
use ecocred_core::constants::CREDIT_UNIT;
use ecocred_core::transaction::{Action, Transaction};
use ecocred_core::types::Address;
use ecocred_genesis::{Allocation, GenesisParams};

// ── Node lifecycle ────────────────────────────────────────────────────────────

struct NodeGuard {
    child: Child,
    data_dir: PathBuf,
}

impl Drop for NodeGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_dir_all(&self.data_dir);
    }
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port()
}

// ── RPC helpers ───────────────────────────────────────────────────────────────

/// Full JSON-RPC response: either `result` or `error` is set.
async fn rpc_call(client: &reqwest::Client, url: &str, method: &str, params: serde_json::Value) -> serde_json::Value {
    let body = serde_json::json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": 1
    });
    let resp = client.post(url).json(&body).send().await.expect("rpc request");
    resp.json().await.expect("rpc response json")
}

async fn rpc_result(client: &reqwest::Client, url: &str, method: &str, params: serde_json::Value) -> serde_json::Value {
    let json = rpc_call(client, url, method, params).await;
    if let Some(err) = json.get("error") {
        panic!("RPC call {method} failed: {err}");
    }
    json["result"].clone()
}

async fn wait_for_rpc(client: &reqwest::Client, url: &str, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    let body = serde_json::json!({"jsonrpc": "2.0", "method": "ecocred_getInfo", "params": [], "id": 0});
    while Instant::now() < deadline {
        if let Ok(resp) = client.post(url).json(&body).send().await {
            if resp.status().is_success() {
                return true;
            }
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
    false
}

fn tx_hex(caller: Address, action: Action) -> String {
    hex::encode(bincode::serialize(&Transaction::new(caller, action)).expect("serialize tx"))
}

// ── Smoke test ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn smoke_verification_round_trip() {
    // ── 1. Genesis params ─────────────────────────────────────────────────────
    let data_dir = std::env::temp_dir().join(format!("ecocred_e2e_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&data_dir);
    std::fs::create_dir_all(&data_dir).unwrap();

    let owner = Address::derive(b"smoke-owner");
    let verifier = Address::derive(b"smoke-verifier");
    let company = Address::derive(b"smoke-company");
    let mut params = GenesisParams::new(owner);
    params.verifiers.push(verifier);
    params.config = LedgerConfig { verification_threshold: 1, ..Default::default() };
    params.credit_allocations.push(Allocation { address: owner, amount: 25 * CREDIT_UNIT });
    let params_path = data_dir.join("genesis-params.json");
    std::fs::write(&params_path, serde_json::to_string(&params).unwrap()).unwrap();

    // ── 2. Start node ─────────────────────────────────────────────────────────
    let rpc_port = free_port();
    let rpc_url = format!("http://127.0.0.1:{rpc_port}");
    let child = Command::new(env!("CARGO_BIN_EXE_ecocred-node"))
        .args([
            "--data-dir",
            data_dir.join("state").to_str().unwrap(),
            "--rpc-addr",
            &format!("127.0.0.1:{rpc_port}"),
            "--genesis-params",
            params_path.to_str().unwrap(),
        ])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to spawn ecocred-node");
    let _guard = NodeGuard { child, data_dir };

    let http = reqwest::Client::new();
    assert!(
        wait_for_rpc(&http, &rpc_url, Duration::from_secs(20)).await,
        "ecocred-node did not become ready within 20 seconds"
    );

    // ── 3. Genesis state ──────────────────────────────────────────────────────
    let balance = rpc_result(&http, &rpc_url, "ecocred_getBalance", serde_json::json!([owner.to_hex()])).await;
    assert_eq!(balance.as_str().unwrap(), (25 * CREDIT_UNIT).to_string());
    let info = rpc_result(&http, &rpc_url, "ecocred_getInfo", serde_json::json!([])).await;
    assert_eq!(info["tx_count"], 1);
    assert_eq!(info["accepts_transactions"], true);

    // ── 4. Log and verify an action ───────────────────────────────────────────
    let log = Action::LogEcoAction {
        title: "Methane capture".into(),
        description: "Landfill gas flare".into(),
        estimated_credits: 120,
        location: "Porto".into(),
        category: "waste".into(),
    };
    let receipt =
        rpc_result(&http, &rpc_url, "ecocred_sendTransaction", serde_json::json!([tx_hex(company, log)])).await;
    assert_eq!(receipt["created_id"], 1);
    assert_eq!(receipt["events"][0]["event"]["type"], "EcoActionLogged");

    let verify = Action::VerifyAction { action_id: 1, approved: true, actual_credits: 120, comments: None };
    let receipt =
        rpc_result(&http, &rpc_url, "ecocred_sendTransaction", serde_json::json!([tx_hex(verifier, verify)])).await;
    let kinds: Vec<&str> = receipt["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["event"]["type"].as_str().unwrap())
        .collect();
    assert!(kinds.contains(&"ActionFullyVerified"));
    assert!(kinds.contains(&"BadgeTransfer"));

    let company_view =
        rpc_result(&http, &rpc_url, "ecocred_getCompany", serde_json::json!([company.to_hex()])).await;
    assert_eq!(company_view["balance"].as_str().unwrap(), (120 * CREDIT_UNIT).to_string());
    assert_eq!(company_view["badges"], 1);
    assert_eq!(company_view["rank"], 1);

    // ── 5. Rejections carry typed error codes ─────────────────────────────────
    let again = Action::VerifyAction { action_id: 1, approved: true, actual_credits: 120, comments: None };
    let resp = rpc_call(&http, &rpc_url, "ecocred_sendTransaction", serde_json::json!([tx_hex(verifier, again)])).await;
    assert_eq!(resp["error"]["code"], -32005);

    let events = rpc_result(&http, &rpc_url, "ecocred_getEvents", serde_json::json!([1, 500])).await;
    let last = events.as_array().unwrap().last().unwrap().clone();
    assert_eq!(last["event"]["type"], "LeaderboardUpdated");
    assert_eq!(last["version"], 1);
}
