//! Asynchronous replay script reader with batch interface
//!
//! Reads script lines through tokio's buffered async I/O and hands them out
//! in batches for the concurrent replay. Malformed lines are logged and
//! skipped.

use crate::io::script_format::{parse_step, ScriptStep};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::warn;

pub struct AsyncReader<R> {
    lines: Lines<R>,
    line_num: usize,
}

impl<R: AsyncBufRead + Unpin> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_num: 0,
        }
    }

    /// Read up to `batch_size` steps
    ///
    /// Returns an empty vector at end of input. A read error ends the input
    /// after being logged.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<ScriptStep> {
        let mut batch = Vec::with_capacity(batch_size);

        while batch.len() < batch_size {
            let text = match self.lines.next_line().await {
                Ok(Some(text)) => text,
                Ok(None) => break,
                Err(e) => {
                    warn!(line = self.line_num + 1, "script read error: {}", e);
                    break;
                }
            };
            self.line_num += 1;

            match parse_step(self.line_num, &text) {
                Ok(Some(step)) => batch.push(step),
                Ok(None) => {}
                Err(e) => warn!("skipping script line: {}", e),
            }
        }

        batch
    }
}
