use crate::strategy::BatchConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Replay a reward-wallet script and report the resulting accounts
#[derive(Parser, Debug)]
#[command(name = "reward-wallet")]
#[command(about = "Replay a reward-wallet request script and print the account report", long_about = None)]
pub struct CliArgs {
    /// JSONL script of wallet requests
    #[arg(value_name = "SCRIPT", help = "Path to the JSONL request script")]
    pub script: PathBuf,

    /// Replay strategy
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Replay strategy: 'sync' for sequential or 'async' for concurrent batches"
    )]
    pub strategy: StrategyType,

    /// Number of script steps per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of script steps per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Number of runtime worker threads (async mode only)
    #[arg(
        long = "worker-threads",
        value_name = "COUNT",
        help = "Number of runtime worker threads replaying steps (default: CPU cores)"
    )]
    pub worker_threads: Option<usize>,

    /// Wallet configuration file
    #[arg(
        long = "config",
        value_name = "FILE",
        help = "TOML wallet configuration (default: built-in settings)"
    )]
    pub config: Option<PathBuf>,
}

/// Available replay strategies
#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    /// Build a BatchConfig from the CLI arguments, falling back to defaults
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_none() && self.worker_threads.is_none() {
            return BatchConfig::default();
        }

        let default = BatchConfig::default();
        BatchConfig::new(
            self.batch_size.unwrap_or(default.batch_size),
            self.worker_threads
                .unwrap_or(default.worker_threads),
        )
    }
}
