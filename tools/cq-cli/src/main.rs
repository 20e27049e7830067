//! Cross-Query CLI
//!
//! Runs one endorsed query against another chain and prints the verified
//! result as JSON. Logs go to stderr.

mod args;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use cross_query::{CrossQueryApi, CrossQueryService};
use query_telemetry::{init_logging, TelemetryConfig};
use serde::Serialize;
use tracing::info;

use args::{Cli, Command};
use output::{ContractReport, TxReport};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut telemetry = TelemetryConfig::from_env();
    if let Some(level) = &cli.log_level {
        telemetry = telemetry.with_log_level(level.clone());
    }
    init_logging(&telemetry).context("Failed to initialize logging")?;

    let policy = cli.policy();
    let config = cli.query_config();
    info!(
        endorsers = policy.endorsers.len(),
        min_endorsements = policy.min_endorsements,
        timeout_ms = config.endorser_timeout.as_millis() as u64,
        "Starting cross-query client v{}",
        cross_query::VERSION
    );
    let service = CrossQueryService::tcp(config);

    match &cli.command {
        Command::Contract(args) => {
            let info = service
                .cross_query(args.to_request(), &policy)
                .await
                .context("Contract query was not endorsed")?;
            info!(
                signatures = info.signs.len(),
                status = info.response.response.status,
                "Contract query endorsed"
            );
            print_json(&ContractReport::from(&info))
        }
        Command::Tx(args) => {
            let info = service
                .tx_query(args.to_request(), &policy)
                .await
                .context("Transaction query was not endorsed")?;
            info!(signatures = info.signs.len(), "Transaction query endorsed");
            print_json(&TxReport::from(&info))
        }
    }
}

fn print_json<T: Serialize>(report: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to encode report")?;
    println!("{}", json);
    Ok(())
}
