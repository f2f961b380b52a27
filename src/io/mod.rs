//! I/O module
//!
//! Handles replay script parsing and report output.
//!
//! # Components
//!
//! - `script_format` - JSON-lines step format (pure parsing, no I/O)
//! - `sync_reader` - Synchronous script reader with iterator interface
//! - `async_reader` - Asynchronous script reader with batch reading interface
//! - `csv_format` - Account report CSV output

pub mod async_reader;
pub mod csv_format;
pub mod script_format;
pub mod sync_reader;

pub use async_reader::AsyncReader;
pub use csv_format::write_report_csv;
pub use script_format::{parse_step, ScriptStep, StepScope, WithdrawalRef};
pub use sync_reader::SyncReader;
