//! ecocred-node: single-writer EcoCred ledger node.
//!
//! Startup sequence:
//!   1. Open (or initialise) the state database
//!   2. Apply genesis if the DB is fresh
//!   3. Start the JSON-RPC 2.0 server
//!   4. Run the apply loop: one transaction at a time, reply with the receipt

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use ecocred_core::types::Address;
use ecocred_genesis::{apply_genesis, GenesisParams};
use ecocred_rpc::{RpcServer, RpcServerState, TxSubmission};
use ecocred_state::{LedgerView, StateDb, StateEngine};

#[derive(Parser, Debug)]
#[command(
    name = "ecocred-node",
    version,
    about = "EcoCred ledger node: verified environmental actions, carbon credits and their market"
)]
struct Args {
    /// Directory for the persistent state database.
    #[arg(long, default_value = "~/.ecocred/data")]
    data_dir: PathBuf,

    /// JSON-RPC listen address.
    #[arg(long, default_value = "127.0.0.1:8645")]
    rpc_addr: SocketAddr,

    /// Path to genesis params JSON (only read on first run).
    #[arg(long)]
    genesis_params: Option<PathBuf>,

    /// Capacity of the inbound transaction queue.
    #[arg(long, default_value_t = 512)]
    queue_size: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,ecocred=debug")),
        )
        .init();

    let args = Args::parse();
    info!("EcoCred node starting");

    // ── State database ────────────────────────────────────────────────────────
    let data_dir = expand_tilde(&args.data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;

    let db = Arc::new(StateDb::open(&data_dir).context("opening state database")?);

    // ── Genesis if fresh ──────────────────────────────────────────────────────
    if !db.is_initialized().context("reading genesis marker")? {
        info!("fresh database, applying genesis");
        let params = load_or_default_genesis_params(args.genesis_params.as_deref())?;
        let now = chrono::Utc::now().timestamp();
        apply_genesis(&db, &params, now).context("applying genesis")?;
    } else {
        info!(
            transactions = db.tx_count().unwrap_or(0),
            events = db.event_count().unwrap_or(0),
            "existing database found, skipping genesis"
        );
    }

    // ── State engine ──────────────────────────────────────────────────────────
    let engine = StateEngine::new(Arc::clone(&db));

    // ── Inbound transaction queue ─────────────────────────────────────────────
    let (tx_sender, mut tx_receiver) = tokio::sync::mpsc::channel::<TxSubmission>(args.queue_size);

    // ── RPC server ────────────────────────────────────────────────────────────
    let rpc_state = Arc::new(RpcServerState { db: Arc::clone(&db), tx_sender: Some(tx_sender) });
    let rpc_handle = RpcServer::new(rpc_state)
        .start(args.rpc_addr)
        .await
        .context("starting RPC server")?;

    // ── Main loop: apply in arrival order ─────────────────────────────────────
    info!("node ready");
    loop {
        tokio::select! {
            next = tx_receiver.recv() => {
                let Some((tx, reply)) = next else { break };
                let now = chrono::Utc::now().timestamp();
                let outcome = engine.apply(&tx, now);
                if let Err(e) = &outcome {
                    warn!(caller = %tx.caller, module = %tx.action.module(), code = e.code(), error = %e, "transaction rejected");
                }
                // the submitter may have gone away; the outcome is already durable
                let _ = reply.send(outcome);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                break;
            }
        }
    }

    let _ = rpc_handle.stop();
    db.flush().context("flushing state database")?;
    info!("node stopped");
    Ok(())
}

/// Load genesis parameters from a JSON file, or fall back to a development
/// genesis owned by a well-known derived address.
fn load_or_default_genesis_params(path: Option<&Path>) -> anyhow::Result<GenesisParams> {
    if let Some(p) = path {
        let json = std::fs::read_to_string(p)
            .with_context(|| format!("reading genesis params from {}", p.display()))?;
        return serde_json::from_str(&json).context("parsing genesis params JSON");
    }
    let owner = Address::derive(b"ecocred.dev.owner");
    warn!(%owner, "no --genesis-params provided, using a development genesis. DO NOT USE IN PRODUCTION.");
    let mut params = GenesisParams::new(owner);
    params.admins.push(owner);
    Ok(params)
}

/// Expand a leading `~` to the user's home directory (`HOME` or `USERPROFILE`).
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}
