//! Processing strategy module for script replay
//!
//! This module defines the Strategy pattern for complete replay pipelines,
//! covering script reading, step execution against a fresh `WalletService`
//! and the final account report. Implementations (sequential, concurrent
//! batches) are selected at runtime.

use crate::cli::StrategyType;
use crate::config::WalletConfig;
use crate::io::csv_format::write_report_csv;
use crate::replay::ScriptRunner;
use std::io::Write;
use std::path::Path;
use tracing::info;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Processing strategy trait for complete replay pipelines
pub trait ProcessingStrategy: Send + Sync {
    /// Replay the script at `input_path` and write the account report to `output`
    ///
    /// # Returns
    ///
    /// * `Ok(())` if the replay completed (failed steps included)
    /// * `Err(String)` if a fatal error occurred
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The script cannot be opened
    /// - The wallet service cannot be built from the configuration
    /// - The report cannot be written
    ///
    /// Individual step failures are logged and counted; they do not stop the
    /// replay.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String>;
}

/// Create a processing strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of processing strategy to create (Sync or Async)
/// * `config` - Wallet configuration for the service each replay builds
/// * `batch` - Optional batch configuration (ignored for sync)
pub fn create_strategy(
    strategy_type: StrategyType,
    config: WalletConfig,
    batch: Option<BatchConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(config)),
        StrategyType::Async => Box::new(AsyncProcessingStrategy::new(
            config,
            batch.unwrap_or_default(),
        )),
    }
}

/// Log the replay summary and write the account report
fn finish(runner: &ScriptRunner, output: &mut dyn Write) -> Result<(), String> {
    let summary = runner.summary();
    info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        "replay finished"
    );

    let report = runner
        .service()
        .account_report()
        .map_err(|e| format!("Failed to build account report: {}", e))?;
    write_report_csv(&report, output)
}
