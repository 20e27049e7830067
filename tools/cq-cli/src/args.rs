//! Command-line arguments.

use clap::{Args, Parser, Subcommand};
use cross_query::{
    CrossQueryRequest, EndorsementPolicy, Endorser, InvokeRequest, QueryConfig, TxStatusRequest,
};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Cross-Query: endorsed reads from another chain
#[derive(Parser, Debug)]
#[command(name = "cross-query")]
#[command(about = "Query another chain through an m-of-n quorum of signing endorsers")]
pub struct Cli {
    /// Endorser as `host:port,pub_key,address` (repeat for each endorser)
    #[arg(short, long = "endorser", value_parser = parse_endorser, required = true)]
    pub endorsers: Vec<Endorser>,

    /// Minimum number of agreeing, validly signed endorsements
    #[arg(short, long)]
    pub min_endorsements: u32,

    /// Remote chain family
    #[arg(long, default_value = "xuper")]
    pub chain_type: String,

    /// Per-endorser timeout in milliseconds (default: CQ_ENDORSER_TIMEOUT_MS or 6000)
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Log filter directive (overrides CQ_LOG_LEVEL)
    #[arg(long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Query to run.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Pre-execute a contract method on the remote chain
    Contract(ContractArgs),
    /// Look up a transaction on the remote chain
    Tx(TxArgs),
}

/// `contract` subcommand.
#[derive(Args, Debug)]
pub struct ContractArgs {
    /// Remote chain name
    #[arg(long)]
    pub bcname: String,

    /// Contract name
    #[arg(long)]
    pub contract: String,

    /// Method name
    #[arg(long)]
    pub method: String,

    /// Contract argument as `key=value` (repeatable)
    #[arg(long = "arg", value_parser = parse_key_value)]
    pub args: Vec<(String, String)>,

    /// Contract VM module
    #[arg(long, default_value = "wasm")]
    pub module: String,

    /// Initiating account
    #[arg(long, default_value = "")]
    pub initiator: String,

    /// Account whose authorization is required (repeatable)
    #[arg(long)]
    pub auth_require: Vec<String>,

    /// Request timestamp in Unix nanoseconds (default: now)
    #[arg(long)]
    pub timestamp: Option<i64>,
}

/// `tx` subcommand.
#[derive(Args, Debug)]
pub struct TxArgs {
    /// Remote chain name
    #[arg(long)]
    pub bcname: String,

    /// Transaction id in hex
    #[arg(long, value_parser = parse_hex)]
    pub txid: HexBytes,
}

/// Bytes given on the command line as hex.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HexBytes(pub Vec<u8>);

impl Cli {
    /// Endorsement policy from the endorser flags.
    pub fn policy(&self) -> EndorsementPolicy {
        EndorsementPolicy::new(
            self.chain_type.clone(),
            self.endorsers.clone(),
            self.min_endorsements,
        )
    }

    /// Query configuration: environment first, then flags.
    pub fn query_config(&self) -> QueryConfig {
        let config = QueryConfig::from_env();
        match self.timeout_ms {
            Some(ms) => config.with_endorser_timeout(Duration::from_millis(ms)),
            None => config,
        }
    }
}

impl ContractArgs {
    /// Build the contract pre-execution request.
    pub fn to_request(&self) -> CrossQueryRequest {
        let mut invoke = InvokeRequest::wasm(
            self.contract.clone(),
            self.method.clone(),
            self.args.iter().map(|(k, v)| (k.clone(), v.as_str())),
        );
        invoke.module_name = self.module.clone();

        CrossQueryRequest {
            bcname: self.bcname.clone(),
            timestamp: self.timestamp.unwrap_or_else(now_nanos),
            initiator: self.initiator.clone(),
            auth_require: self.auth_require.clone(),
            request: invoke,
        }
    }
}

impl TxArgs {
    /// Build the transaction status request.
    pub fn to_request(&self) -> TxStatusRequest {
        TxStatusRequest {
            bcname: self.bcname.clone(),
            txid: self.txid.0.clone(),
        }
    }
}

fn now_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_nanos()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Parse `host:port,pub_key,address`.
pub fn parse_endorser(value: &str) -> Result<Endorser, String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [host, pub_key, address] if !host.is_empty() && !pub_key.is_empty() => {
            Ok(Endorser::new(*host, *pub_key, *address))
        }
        _ => Err(format!(
            "expected `host:port,pub_key,address`, got `{}`",
            value
        )),
    }
}

/// Parse `key=value`.
pub fn parse_key_value(value: &str) -> Result<(String, String), String> {
    value
        .split_once('=')
        .filter(|(k, _)| !k.is_empty())
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected `key=value`, got `{}`", value))
}

fn parse_hex(value: &str) -> Result<HexBytes, String> {
    hex::decode(value.trim_start_matches("0x"))
        .map(HexBytes)
        .map_err(|e| e.to_string())
}
