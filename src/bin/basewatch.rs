#![forbid(unsafe_code)]
//! Command-line view of the latest block, a transaction or a wallet.

use basewatch::address::short_address;
use basewatch::config::{load_config, Config};
use basewatch::error::{FailureKind, RpcFailure};
use basewatch::ledger::{clamp_limit, filter_transactions, Direction, LedgerService, Transaction};
use basewatch::rpc::{EndpointPool, RpcClient};
use basewatch::units::{calculate_fee, format_gas_price_gwei, wei_to_eth};
use clap::{Parser, Subcommand};
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Color as TableColor;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Shows transactions from the latest block
    Latest {
        /// Only show transactions involving this address
        #[arg(long)]
        address: Option<String>,
        /// Maximum number of transactions
        #[arg(long)]
        limit: Option<String>,
    },
    /// Shows one transaction with its receipt
    Tx {
        /// 0x-prefixed transaction hash
        hash: String,
    },
    /// Shows balance and recent activity of an address
    Wallet {
        /// 0x-prefixed address
        address: String,
        /// Maximum number of transactions
        #[arg(long)]
        limit: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "❌ Config error:".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    let result = match connect(&config) {
        Ok(ledger) => run(&cli.command, &config, &ledger).await,
        Err(failure) => Err(failure),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            eprintln!("{} {}", "❌".red(), failure.user_message().red().bold());
            ExitCode::FAILURE
        }
    }
}

fn connect(config: &Config) -> Result<LedgerService, RpcFailure> {
    let pool = Arc::new(EndpointPool::new(&config.rpc.endpoints)?);
    let client = RpcClient::new(pool, config.rpc.options())?;
    Ok(LedgerService::new(client))
}

async fn run(command: &Commands, config: &Config, ledger: &LedgerService) -> Result<(), RpcFailure> {
    match command {
        Commands::Latest { address, limit } => {
            let limit = clamp_limit(
                limit.as_deref(),
                config.api.default_limit,
                config.api.max_limit,
            );
            let block = ledger.latest_block_with_transactions().await?;
            let txs = filter_transactions(&block.transactions, address.as_deref(), limit);

            println!(
                "{}",
                format!(
                    "🧱 Block #{} ({} transactions)",
                    block.number,
                    block.transactions.len()
                )
                .bright_cyan()
                .bold()
            );
            print_transfers(&txs);
        }
        Commands::Tx { hash } => {
            let details = ledger.transaction_by_hash(hash).await?;
            let tx = &details.transaction;
            let fee = calculate_fee(tx.gas_price, details.gas_used())
                .map_err(|e| RpcFailure::new(FailureKind::Unknown, e.to_string(), 0))?;

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic);
            let rows = [
                ("Hash", tx.hash.clone()),
                ("From", tx.from.clone()),
                (
                    "To",
                    tx.to.clone().unwrap_or_else(|| "contract creation".to_string()),
                ),
                ("Value", format!("{} ETH", wei_to_eth(tx.value_wei))),
                ("Gas price", format_gas_price_gwei(tx.gas_price)),
                ("Gas used", format!("{} / {}", details.gas_used(), tx.gas_limit)),
                ("Fee", format!("{} ETH", fee)),
                ("Nonce", tx.nonce.to_string()),
                ("Status", details.status().as_str().to_string()),
                (
                    "Block",
                    tx.block_number
                        .map(|n| format!("#{}", n))
                        .unwrap_or_else(|| "pending".to_string()),
                ),
                ("Confirmations", details.confirmations.to_string()),
            ];
            for (label, value) in rows {
                table.add_row(vec![
                    Cell::new(label)
                        .fg(TableColor::Cyan)
                        .add_attribute(Attribute::Bold),
                    Cell::new(value).fg(TableColor::White),
                ]);
            }
            println!("{}", table);
        }
        Commands::Wallet { address, limit } => {
            let limit = clamp_limit(
                limit.as_deref(),
                config.api.default_limit,
                config.api.max_limit,
            );
            let snapshot = ledger.wallet_snapshot(address, limit).await?;

            println!("{}", format!("📍 Address: {}", snapshot.address).cyan());
            println!(
                "{}",
                format!("💰 Balance: {} ETH", wei_to_eth(snapshot.balance_wei))
                    .green()
                    .bold()
            );
            if snapshot.is_contract {
                println!("{}", "📜 Contract account".yellow());
            }
            println!();

            if snapshot.recent_transactions.is_empty() {
                println!("{}", "📭 No transactions in the latest block".yellow());
                return Ok(());
            }

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(header(&["Direction", "Hash", "Counterparty", "Value (ETH)"]));
            for entry in &snapshot.recent_transactions {
                let tx = &entry.transaction;
                let (label, color, other) = match entry.direction {
                    Direction::Outgoing => {
                        ("📤 Sent", TableColor::Red, tx.to.as_deref())
                    }
                    Direction::Incoming => {
                        ("📥 Received", TableColor::Green, Some(tx.from.as_str()))
                    }
                };
                table.add_row(vec![
                    Cell::new(label).fg(color),
                    Cell::new(short_address(&tx.hash)).fg(TableColor::White),
                    Cell::new(other.map(short_address).unwrap_or_else(|| "-".to_string()))
                        .fg(TableColor::White),
                    Cell::new(wei_to_eth(tx.value_wei)).fg(color),
                ]);
            }
            println!("{}", table);
        }
    }

    Ok(())
}

fn header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| {
            Cell::new(label)
                .fg(TableColor::Cyan)
                .add_attribute(Attribute::Bold)
        })
        .collect()
}

fn print_transfers(txs: &[Transaction]) {
    if txs.is_empty() {
        println!("{}", "📭 No matching transactions".yellow());
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(&["Hash", "From", "To", "Value (ETH)"]));

    for tx in txs {
        table.add_row(vec![
            Cell::new(short_address(&tx.hash)).fg(TableColor::White),
            Cell::new(short_address(&tx.from)).fg(TableColor::White),
            Cell::new(
                tx.to
                    .as_deref()
                    .map(short_address)
                    .unwrap_or_else(|| "contract creation".to_string()),
            )
            .fg(TableColor::Grey),
            Cell::new(wei_to_eth(tx.value_wei)).fg(TableColor::Green),
        ]);
    }

    println!("{}", table);
}
