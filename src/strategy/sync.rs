//! Synchronous processing strategy
//!
//! Replays the script one step at a time on the calling thread:
//! - Script reading is delegated to `SyncReader` (iterator interface)
//! - Step execution to `ScriptRunner`
//! - Report output to `csv_format::write_report_csv`
//!
//! Steps are streamed; memory grows with the number of accounts and
//! transactions, not with the script length.

use crate::api::WalletService;
use crate::config::WalletConfig;
use crate::io::sync_reader::SyncReader;
use crate::replay::ScriptRunner;
use crate::strategy::{finish, ProcessingStrategy};
use std::io::Write;
use std::path::Path;
use tracing::warn;

/// Sequential replay strategy
///
/// ```no_run
/// use reward_wallet::config::WalletConfig;
/// use reward_wallet::strategy::{ProcessingStrategy, SyncProcessingStrategy};
/// use std::path::Path;
///
/// let strategy = SyncProcessingStrategy::new(WalletConfig::default());
/// let mut output = std::io::stdout();
///
/// strategy
///     .process(Path::new("script.jsonl"), &mut output)
///     .expect("Replay failed");
/// ```
#[derive(Debug, Clone)]
pub struct SyncProcessingStrategy {
    config: WalletConfig,
}

impl SyncProcessingStrategy {
    pub fn new(config: WalletConfig) -> Self {
        Self { config }
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String> {
        let reader = SyncReader::new(input_path)?;
        let service = WalletService::new(&self.config)
            .map_err(|e| format!("Failed to start wallet service: {}", e))?;
        let runner = ScriptRunner::new(service);

        for result in reader {
            match result {
                Ok(step) => {
                    runner.run_step(&step);
                }
                Err(e) => {
                    warn!("skipping script line: {}", e);
                    runner.record_unparsable();
                }
            }
        }

        finish(&runner, output)
    }
}
