//! Script replay
//!
//! - `runner` - Executes single steps against a `WalletService`
//! - `batch_processor` - Concurrent replay partitioned by actor

pub mod batch_processor;
pub mod runner;

pub use batch_processor::BatchProcessor;
pub use runner::{ReplaySummary, ScriptRunner, StepOutcome};
