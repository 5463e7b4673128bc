//! Records commands for listing, exporting and deleting raw taps.

use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use att_core::AttendanceEvent;
use att_db::{Database, RecordFilter};

/// Lists taps matching `filter`, as a table or JSON.
pub fn list<W: Write>(writer: &mut W, db: &Database, filter: &RecordFilter, json: bool) -> Result<()> {
    let records = db.search_records(filter)?;
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&records)?)?;
    } else {
        write!(writer, "{}", format_records(&records))?;
    }
    Ok(())
}

/// Format taps for human-readable output.
pub fn format_records(records: &[AttendanceEvent]) -> String {
    let mut output = String::new();
    if records.is_empty() {
        writeln!(output, "No records found.").unwrap();
        return output;
    }

    writeln!(output, "{:<6}  {:<19}  {:<12}  Kind", "ID", "Timestamp", "Card ID").unwrap();
    for record in records {
        writeln!(
            output,
            "{:<6}  {:<19}  {:<12}  {}",
            record.id,
            record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            record.card_id.as_str(),
            record.kind
        )
        .unwrap();
    }
    output
}

pub fn export<W: Write>(
    writer: &mut W,
    db: &Database,
    year: i32,
    month: Option<u32>,
    path: &Path,
) -> Result<()> {
    let rows = db
        .export_records_csv(year, month, path)
        .with_context(|| format!("failed to export records to {}", path.display()))?;
    let period = month.map_or_else(|| year.to_string(), |month| format!("{year}-{month:02}"));
    writeln!(writer, "Exported {rows} record(s) for {period} to {}", path.display())?;
    Ok(())
}

pub fn delete<W: Write>(writer: &mut W, db: &mut Database, id: i64) -> Result<()> {
    if !db.delete_record(id)? {
        anyhow::bail!("no record with id {id}");
    }
    tracing::info!(id, "deleted record");
    writeln!(writer, "Deleted record #{id}")?;
    Ok(())
}
