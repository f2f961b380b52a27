//! Account report output
//!
//! Writes the end-of-run account report as CSV with columns
//! `email,full_name,role,balance,total_earned,ads_watched,transactions,reconciled`.
//! Rows are sorted by email for deterministic output.

use crate::api::AccountReport;
use std::io::Write;

/// Write account report rows to CSV
///
/// # Errors
///
/// Returns `Err(String)` if a write error occurred.
pub fn write_report_csv(rows: &[AccountReport], output: &mut dyn Write) -> Result<(), String> {
    let mut writer = csv::Writer::from_writer(output);

    let mut sorted: Vec<&AccountReport> = rows.iter().collect();
    sorted.sort_by(|a, b| a.email.cmp(&b.email));

    if sorted.is_empty() {
        writer
            .write_record([
                "email",
                "full_name",
                "role",
                "balance",
                "total_earned",
                "ads_watched",
                "transactions",
                "reconciled",
            ])
            .map_err(|e| format!("Failed to write CSV header: {}", e))?;
    }

    for row in sorted {
        writer
            .serialize(row)
            .map_err(|e| format!("Failed to write account record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}
