//! Tap command for appending a clock-in or clock-out to the log.

use std::io::Write;

use anyhow::{Context, Result};
use att_core::{CardId, EventKind};
use att_db::Database;
use chrono::NaiveDateTime;

pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    card_id: &CardId,
    kind: EventKind,
    timestamp: NaiveDateTime,
) -> Result<()> {
    let id = db
        .add_record(card_id, kind, timestamp)
        .with_context(|| format!("failed to record tap for {card_id}"))?;

    let holder = db.get_holder(card_id)?;
    match holder {
        Some(holder) => writeln!(
            writer,
            "Recorded {kind} for {} ({card_id}) at {} [#{id}]",
            holder.name,
            timestamp.format("%Y-%m-%d %H:%M:%S")
        )?,
        None => {
            tracing::warn!(card_id = %card_id, "tap recorded for unregistered card");
            writeln!(
                writer,
                "Recorded {kind} for unregistered card {card_id} at {} [#{id}]",
                timestamp.format("%Y-%m-%d %H:%M:%S")
            )?;
        }
    }
    Ok(())
}
