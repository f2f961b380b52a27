//! Synchronous replay script reader with iterator interface
//!
//! Streams steps from a script file one line at a time. Delegates the line
//! format to the `script_format` module.
//!
//! ```no_run
//! use reward_wallet::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::new(Path::new("script.jsonl")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(step) => println!("step {} on line {}", step.op, step.line),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found) are returned from `new()`
//! - Malformed lines and read errors are yielded as `Err` items with line numbers

use crate::io::script_format::{parse_step, ScriptStep};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

#[derive(Debug)]
pub struct SyncReader {
    lines: Lines<BufReader<File>>,
    line_num: usize,
}

impl SyncReader {
    /// Open a script file for streaming iteration
    ///
    /// # Errors
    ///
    /// Returns `Err(String)` if the file cannot be opened.
    pub fn new(path: &Path) -> Result<Self, String> {
        let file = File::open(path)
            .map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;

        Ok(Self {
            lines: BufReader::with_capacity(8 * 1024, file).lines(),
            line_num: 0,
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<ScriptStep, String>;

    /// Next step, skipping blank lines and comments
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_num += 1;

            let text = match line {
                Ok(text) => text,
                Err(e) => return Some(Err(format!("Line {}: read error: {}", self.line_num, e))),
            };

            match parse_step(self.line_num, &text) {
                Ok(Some(step)) => return Some(Ok(step)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
