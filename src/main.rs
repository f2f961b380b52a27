//! Reward wallet CLI
//!
//! Replays a JSONL script of wallet requests against a fresh in-memory wallet
//! and prints the per-account report as CSV.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- script.jsonl > report.csv
//! cargo run -- --strategy sync script.jsonl > report.csv
//! cargo run -- --config wallet.toml --batch-size 500 --worker-threads 4 script.jsonl > report.csv
//! RUST_LOG=debug cargo run -- script.jsonl > report.csv
//! ```
//!
//! Logs go to stderr; the report is the only thing written to stdout.
//!
//! # Exit Codes
//!
//! - 0: Success (individual failed steps included)
//! - 1: Error (unreadable script, invalid configuration, report failure)

use reward_wallet::cli;
use reward_wallet::config::WalletConfig;
use reward_wallet::strategy;
use std::process;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() {
    let args = cli::parse_args();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => match WalletConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                error!("{}", e);
                process::exit(1);
            }
        },
        None => WalletConfig::default(),
    };

    let batch = if args.strategy == cli::StrategyType::Async {
        Some(args.to_batch_config())
    } else {
        None
    };
    let strategy = strategy::create_strategy(args.strategy.clone(), config, batch);

    let mut output = std::io::stdout();
    if let Err(e) = strategy.process(&args.script, &mut output) {
        error!("{}", e);
        process::exit(1);
    }
}
