//! ecocred-cli
//!
//! Operator CLI for EcoCred. Builds ledger transactions from subcommands and
//! submits them to a running node via JSON-RPC. The node trusts the caller
//! named with `--from`; run the CLI only against a node you operate.
//!
//! Usage:
//!   ecocred-cli address        --seed <text>
//!   ecocred-cli info           [--rpc <url>]
//!   ecocred-cli balance        [--address <0x..>] [--from <0x..>]
//!   ecocred-cli transfer       --to <0x..> --amount <credits> --from <0x..>
//!   ecocred-cli log-action     --title <t> --estimated <n> --from <0x..>
//!   ecocred-cli verify         --action-id <id> --credits <n> [--reject] --from <0x..>
//!   ecocred-cli list           --amount <credits> --price <native> --from <0x..>
//!   ecocred-cli buy            --listing <id> --amount <credits> --payment <native> --from <0x..>
//!   ecocred-cli stake          --amount <credits> --days <n> --from <0x..>
//!   ecocred-cli retire         --amount <credits> --certificate <id> --from <0x..>
//!   ecocred-cli propose-config --param <name> --value <v> --description <text> --from <0x..>
//!   ecocred-cli genesis-params --owner <0x..> [--out <path>]

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};

use ecocred_core::config::{ConfigUpdate, LedgerConfig, ReputationModel};
use ecocred_core::transaction::{Action, Transaction};
use ecocred_core::types::{Address, Amount, Module, Role};
use ecocred_core::units::{format_amount, parse_amount};
use ecocred_genesis::GenesisParams;
use ecocred_rpc::RpcReceipt;

mod rpc_client;
use rpc_client::CliRpcClient;

// ── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "ecocred-cli", version, about = "EcoCred operator CLI: build and submit ledger transactions")]
struct Args {
    /// Node RPC endpoint.
    #[arg(long, global = true, default_value = "http://127.0.0.1:8645")]
    rpc: String,

    /// Caller address for submitted transactions.
    #[arg(long, global = true)]
    from: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Derive a deterministic address from a seed string (offline).
    Address {
        #[arg(long)]
        seed: String,
    },

    /// Print node and ledger summary.
    Info,

    /// Print the current ledger configuration.
    Config,

    /// Print platform-wide statistics.
    Stats,

    /// Print the company leaderboard.
    Leaderboard {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Print credit and native balances. Defaults to `--from`.
    Balance {
        #[arg(long)]
        address: Option<String>,
    },

    /// Print events starting at a sequence number.
    Events {
        #[arg(long, default_value_t = 1)]
        from_seq: u64,
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },

    // ── Credit ledger ─────────────────────────────────────────────────────────
    /// Transfer credits.
    Transfer {
        #[arg(long)]
        to: String,
        /// Credits, decimal (e.g. 12.5).
        #[arg(long)]
        amount: String,
    },

    /// Set an allowance. `spender` may be an address or a module name
    /// (marketplace, staking, ...).
    Approve {
        #[arg(long)]
        spender: String,
        #[arg(long)]
        amount: String,
    },

    /// Burn credits.
    Burn {
        #[arg(long)]
        amount: String,
    },

    /// Transfer native currency.
    TransferNative {
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: String,
    },

    // ── Access control ────────────────────────────────────────────────────────
    /// Grant a role (admin, verifier, moderator).
    GrantRole {
        #[arg(long)]
        account: String,
        #[arg(long)]
        role: String,
    },

    RevokeRole {
        #[arg(long)]
        account: String,
    },

    // ── Verification ──────────────────────────────────────────────────────────
    /// Submit an environmental action for verification.
    LogAction {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Whole credits claimed.
        #[arg(long)]
        estimated: u64,
        #[arg(long, default_value = "")]
        location: String,
        #[arg(long, default_value = "")]
        category: String,
    },

    /// Record a verdict on an action.
    Verify {
        #[arg(long)]
        action_id: u64,
        /// Whole credits to award.
        #[arg(long, default_value_t = 0)]
        credits: u64,
        #[arg(long, default_value_t = false)]
        reject: bool,
        #[arg(long)]
        comments: Option<String>,
    },

    /// Show an action.
    Action {
        #[arg(long)]
        id: u64,
    },

    // ── Marketplace ───────────────────────────────────────────────────────────
    /// List credits for sale (requires an allowance to the marketplace).
    List {
        #[arg(long)]
        amount: String,
        /// Native currency per whole credit, decimal.
        #[arg(long)]
        price: String,
    },

    Buy {
        #[arg(long)]
        listing: u64,
        #[arg(long)]
        amount: String,
        /// Maximum native payment, decimal.
        #[arg(long)]
        payment: String,
    },

    CancelListing {
        #[arg(long)]
        listing: u64,
    },

    /// Show active listings.
    Listings,

    // ── Staking ───────────────────────────────────────────────────────────────
    /// Lock credits (requires an allowance to the staking module).
    Stake {
        #[arg(long)]
        amount: String,
        #[arg(long)]
        days: u32,
    },

    Unstake {
        #[arg(long)]
        index: u32,
    },

    /// Show stakes. Defaults to `--from`.
    Stakes {
        #[arg(long)]
        address: Option<String>,
    },

    // ── Retirement ────────────────────────────────────────────────────────────
    Retire {
        #[arg(long)]
        amount: String,
        #[arg(long, default_value = "")]
        reason: String,
        #[arg(long)]
        certificate: String,
    },

    // ── Governance ────────────────────────────────────────────────────────────
    /// Propose a configuration change.
    ProposeConfig {
        #[arg(long)]
        param: String,
        #[arg(long)]
        value: String,
        #[arg(long)]
        description: String,
    },

    /// Propose an arbitrary pre-encoded call.
    Propose {
        #[arg(long)]
        description: String,
        /// Module the call belongs to.
        #[arg(long)]
        target: String,
        /// Hex of the bincode-encoded action.
        #[arg(long)]
        payload: String,
    },

    Vote {
        #[arg(long)]
        proposal: u64,
        #[arg(long, default_value_t = false)]
        against: bool,
    },

    Execute {
        #[arg(long)]
        proposal: u64,
    },

    /// Show a proposal.
    Proposal {
        #[arg(long)]
        id: u64,
    },

    /// Write a genesis parameters template for a new ledger.
    GenesisParams {
        #[arg(long)]
        owner: String,
        #[arg(long, default_value = "genesis-params.json")]
        out: PathBuf,
    },
}

// ── Main ─────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("warn,ecocred_cli=info").init();

    let args = Args::parse();
    let client = CliRpcClient::new(&args.rpc);
    let from = args.from.as_deref().map(parse_address).transpose()?;
    let caller = || from.ok_or_else(|| anyhow!("--from <address> is required for this command"));

    match args.command {
        Command::Address { seed } => {
            println!("{}", Address::derive(seed.as_bytes()));
            Ok(())
        }

        Command::Info => {
            let info = client.get_info().await?;
            println!("Node version:   {}", info.node_version);
            println!("Transactions:   {}", info.tx_count);
            println!("Events:         {} (schema v{})", info.event_count, info.event_schema_version);
            println!("Token owner:    {}", info.token_owner);
            println!("Genesis hash:   {}", info.genesis_hash.unwrap_or_else(|| "-".into()));
            for (module, address) in info.modules {
                println!("  {:<14} {}", module.name(), address);
            }
            Ok(())
        }

        Command::Config => {
            let cfg = client.get_config().await?;
            println!("{}", serde_json::to_string_pretty(&cfg)?);
            Ok(())
        }

        Command::Stats => {
            let stats = client.get_platform_stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }

        Command::Leaderboard { limit } => {
            for e in client.get_leaderboard(limit).await? {
                println!(
                    "{:>3}. {}  {} credits  reputation {}",
                    e.rank,
                    e.company,
                    format_amount(e.credits.parse()?),
                    e.reputation_score
                );
            }
            Ok(())
        }

        Command::Balance { address } => {
            let addr = match address {
                Some(a) => parse_address(&a)?,
                None => caller()?,
            };
            let credits = client.get_balance(&addr).await?;
            let native = client.get_native_balance(&addr).await?;
            println!("Address:  {addr}");
            println!("Credits:  {}", format_amount(credits));
            println!("Native:   {}", format_amount(native));
            println!("Role:     {}", client.get_role(&addr).await?);
            Ok(())
        }

        Command::Events { from_seq, limit } => {
            for e in client.get_events(from_seq, limit).await? {
                println!("{}", serde_json::to_string(&e)?);
            }
            Ok(())
        }

        Command::Transfer { to, amount } => {
            let action = Action::Transfer { to: parse_address(&to)?, amount: parse_amount(&amount)? };
            submit(&client, caller()?, action).await
        }

        Command::Approve { spender, amount } => {
            let action = Action::Approve { spender: parse_target(&spender)?, amount: parse_amount(&amount)? };
            submit(&client, caller()?, action).await
        }

        Command::Burn { amount } => submit(&client, caller()?, Action::Burn { amount: parse_amount(&amount)? }).await,

        Command::TransferNative { to, amount } => {
            let action = Action::TransferNative { to: parse_address(&to)?, amount: parse_amount(&amount)? };
            submit(&client, caller()?, action).await
        }

        Command::GrantRole { account, role } => {
            let role = Role::from_str(&role).map_err(|e| anyhow!(e))?;
            submit(&client, caller()?, Action::GrantRole { account: parse_address(&account)?, role }).await
        }

        Command::RevokeRole { account } => {
            submit(&client, caller()?, Action::RevokeRole { account: parse_address(&account)? }).await
        }

        Command::LogAction { title, description, estimated, location, category } => {
            let action = Action::LogEcoAction { title, description, estimated_credits: estimated, location, category };
            submit(&client, caller()?, action).await
        }

        Command::Verify { action_id, credits, reject, comments } => {
            let action = Action::VerifyAction { action_id, approved: !reject, actual_credits: credits, comments };
            submit(&client, caller()?, action).await
        }

        Command::Action { id } => {
            let Some(a) = client.get_action(id).await? else { bail!("action {id} not found") };
            println!("Action #{}: {}", a.id, a.title);
            println!("  Company:   {}", a.company);
            println!("  Status:    {:?} ({} approvals, {} rejections)", a.status, a.approval_count, a.rejection_count);
            println!("  Estimated: {} credits", a.estimated_credits);
            println!("  Awarded:   {} credits", format_amount(a.awarded_credits.parse()?));
            Ok(())
        }

        Command::List { amount, price } => {
            let action = Action::CreateListing { amount: parse_amount(&amount)?, price_per_credit: parse_amount(&price)? };
            submit(&client, caller()?, action).await
        }

        Command::Buy { listing, amount, payment } => {
            let action = Action::Purchase {
                listing_id: listing,
                amount: parse_amount(&amount)?,
                payment: parse_amount(&payment)?,
            };
            submit(&client, caller()?, action).await
        }

        Command::CancelListing { listing } => {
            submit(&client, caller()?, Action::CancelListing { listing_id: listing }).await
        }

        Command::Listings => {
            for l in client.get_active_listings().await? {
                println!(
                    "#{:<4} {}  {} credits left at {} native/credit",
                    l.id,
                    l.seller,
                    format_amount(l.remaining.parse()?),
                    format_amount(l.price_per_credit.parse()?)
                );
            }
            Ok(())
        }

        Command::Stake { amount, days } => {
            submit(&client, caller()?, Action::Stake { amount: parse_amount(&amount)?, lock_days: days }).await
        }

        Command::Unstake { index } => submit(&client, caller()?, Action::Unstake { stake_index: index }).await,

        Command::Stakes { address } => {
            let addr = match address {
                Some(a) => parse_address(&a)?,
                None => caller()?,
            };
            for s in client.get_stakes(&addr).await? {
                println!(
                    "[{}] stake #{}: {} credits, {} days, unlocks {}, reward {}{}",
                    s.index,
                    s.id,
                    format_amount(s.amount.parse()?),
                    s.lock_days,
                    s.end_time,
                    format_amount(s.reward.parse()?),
                    if s.claimed { " (claimed)" } else { "" }
                );
            }
            Ok(())
        }

        Command::Retire { amount, reason, certificate } => {
            let action = Action::RetireCredits { amount: parse_amount(&amount)?, reason, certificate_id: certificate };
            submit(&client, caller()?, action).await
        }

        Command::ProposeConfig { param, value, description } => {
            let update = parse_config_update(&param, &value)?;
            let payload = Action::UpdateConfig { update }.encode();
            submit(&client, caller()?, Action::CreateProposal { description, target: Module::Ledger, payload }).await
        }

        Command::Propose { description, target, payload } => {
            let target = Module::from_str(&target).map_err(|e| anyhow!(e))?;
            let payload = hex::decode(payload.trim_start_matches("0x")).context("decoding payload hex")?;
            submit(&client, caller()?, Action::CreateProposal { description, target, payload }).await
        }

        Command::Vote { proposal, against } => {
            submit(&client, caller()?, Action::Vote { proposal_id: proposal, support: !against }).await
        }

        Command::Execute { proposal } => {
            submit(&client, caller()?, Action::ExecuteProposal { proposal_id: proposal }).await
        }

        Command::Proposal { id } => {
            let Some(p) = client.get_proposal(id).await? else { bail!("proposal {id} not found") };
            println!("{}", serde_json::to_string_pretty(&p)?);
            Ok(())
        }

        Command::GenesisParams { owner, out } => cmd_genesis_params(&parse_address(&owner)?, &out),
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

async fn submit(client: &CliRpcClient, caller: Address, action: Action) -> anyhow::Result<()> {
    let tx = Transaction::new(caller, action);
    let receipt = client.send_transaction(&tx).await?;
    print_receipt(&receipt);
    Ok(())
}

fn print_receipt(r: &RpcReceipt) {
    println!("Applied:  tx #{} ({})", r.seq, r.tx_id);
    if let Some(id) = r.created_id {
        println!("Created:  id {id}");
    }
    for e in &r.events {
        println!("  event #{} {}", e.seq, e.event.kind());
    }
}

fn cmd_genesis_params(owner: &Address, out: &PathBuf) -> anyhow::Result<()> {
    if out.exists() {
        bail!("{} already exists. Delete it first to avoid overwriting a previous genesis.", out.display());
    }
    let mut params = GenesisParams::new(*owner);
    params.admins.push(*owner);
    params.config = LedgerConfig::default();
    std::fs::write(out, serde_json::to_string_pretty(&params)?)
        .with_context(|| format!("writing {}", out.display()))?;
    println!("genesis-params.json written to: {}", out.display());
    println!("Add verifiers and allocations, then pass it to ecocred-node --genesis-params.");
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn parse_address(s: &str) -> anyhow::Result<Address> {
    Address::from_str(s).map_err(|e| anyhow!("invalid address {s:?}: {e}"))
}

/// An address, or the principal of a named module.
fn parse_target(s: &str) -> anyhow::Result<Address> {
    match Module::from_str(s) {
        Ok(module) => Ok(module.address()),
        Err(_) => parse_address(s),
    }
}

fn parse_config_update(param: &str, value: &str) -> anyhow::Result<ConfigUpdate> {
    let int = |v: &str| -> anyhow::Result<u64> { v.parse().with_context(|| format!("{param} expects an integer")) };
    let amount = |v: &str| -> anyhow::Result<Amount> { Ok(parse_amount(v)?) };
    let update = match param {
        "verification_threshold" => ConfigUpdate::VerificationThreshold(u32::try_from(int(value)?)?),
        "badge_threshold" => ConfigUpdate::BadgeThreshold(amount(value)?),
        "platform_fee_bps" => ConfigUpdate::PlatformFeeBps(u16::try_from(int(value)?)?),
        "fee_recipient" => ConfigUpdate::FeeRecipient(match value {
            "owner" => None,
            v => Some(parse_address(v)?),
        }),
        "reward_rate_bps" => ConfigUpdate::RewardRateBps(u32::try_from(int(value)?)?),
        "lock_bounds" => {
            let (min, max) = value.split_once("..").context("lock_bounds expects MIN..MAX")?;
            ConfigUpdate::LockBounds {
                min_days: u32::try_from(int(min)?)?,
                max_days: u32::try_from(int(max.trim_start_matches('='))?)?,
            }
        }
        "proposal_threshold" => ConfigUpdate::ProposalThreshold(amount(value)?),
        "voting_period_secs" => ConfigUpdate::VotingPeriodSecs(i64::try_from(int(value)?)?),
        "quorum" => ConfigUpdate::Quorum(amount(value)?),
        "reputation" => ConfigUpdate::Reputation(match value {
            "flat" => ReputationModel::Flat,
            "tiered" => ReputationModel::Tiered,
            other => bail!("unknown reputation model {other:?}"),
        }),
        other => bail!("unknown config parameter {other:?}"),
    };
    Ok(update)
}
