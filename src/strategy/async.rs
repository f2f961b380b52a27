//! Asynchronous batch processing strategy
//!
//! Replays the script in batches on a multi-threaded tokio runtime.
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, worker_threads)
//!     ├── AsyncReader (batch script reading)
//!     └── BatchProcessor (actor partitioning + tokio tasks)
//!         └── ScriptRunner -> WalletService
//! ```
//!
//! Batches are replayed one after another. Within a batch, steps of
//! different users run in parallel while each user's steps keep script order
//! and global steps (signup, login, admin) act as barriers. The final report
//! is therefore identical to the sequential strategy's.

use crate::api::WalletService;
use crate::config::WalletConfig;
use crate::io::async_reader::AsyncReader;
use crate::replay::{BatchProcessor, ScriptRunner};
use crate::strategy::{finish, ProcessingStrategy};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Configuration for batch processing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of script steps per batch
    pub batch_size: usize,
    /// Number of runtime worker threads
    pub worker_threads: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            worker_threads: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a BatchConfig; zero values fall back to the defaults
    pub fn new(batch_size: usize, worker_threads: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                "invalid batch_size ({}), using default ({})",
                batch_size, default.batch_size
            );
            default.batch_size
        } else {
            batch_size
        };

        let worker_threads = if worker_threads == 0 {
            warn!(
                "invalid worker_threads ({}), using default ({})",
                worker_threads, default.worker_threads
            );
            default.worker_threads
        } else {
            worker_threads
        };

        Self {
            batch_size,
            worker_threads,
        }
    }
}

/// Concurrent batch replay strategy
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: WalletConfig,
    batch: BatchConfig,
}

impl AsyncProcessingStrategy {
    pub fn new(config: WalletConfig, batch: BatchConfig) -> Self {
        Self { config, batch }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.batch.worker_threads)
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        runtime.block_on(async {
            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| format!("Failed to open file '{}': {}", input_path.display(), e))?;
            let mut reader = AsyncReader::new(tokio::io::BufReader::new(file));

            let service = WalletService::new(&self.config)
                .map_err(|e| format!("Failed to start wallet service: {}", e))?;
            let runner = Arc::new(ScriptRunner::new(service));
            let processor = BatchProcessor::new(Arc::clone(&runner));

            loop {
                let batch = reader.read_batch(self.batch.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                // The next batch is read only after this one has completed
                processor.process_batch(batch).await;
            }

            finish(&runner, output)
        })
    }
}
