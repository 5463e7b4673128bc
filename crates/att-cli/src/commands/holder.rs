//! Holder commands for registering card holders and listing them.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use att_core::CardHolder;
use att_db::{Database, HolderUpdate};

/// Registers or updates a holder and prints the stored record.
pub fn set<W: Write>(writer: &mut W, db: &mut Database, update: HolderUpdate) -> Result<()> {
    let card_id = update.card_id.clone();
    let holder = db
        .upsert_holder(update)
        .with_context(|| format!("failed to save holder {card_id}"))?;
    writeln!(writer, "Saved {}", describe(&holder))?;
    Ok(())
}

/// Lists every holder, as a table or JSON.
pub fn list<W: Write>(writer: &mut W, db: &Database, json: bool) -> Result<()> {
    let holders = db.list_holders()?;
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&holders)?)?;
    } else {
        write!(writer, "{}", format_holders(&holders))?;
    }
    Ok(())
}

fn describe(holder: &CardHolder) -> String {
    let mut text = format!("{} ({})", holder.name, holder.card_id);
    if holder.is_admin {
        text.push_str(" admin");
    }
    if let Some(number) = &holder.student_number {
        write!(text, " student {number}").unwrap();
    }
    if holder.offset_hours != 0.0 {
        write!(text, " offset {:+.2}H", holder.offset_hours).unwrap();
    }
    text
}

/// Format holders for human-readable output.
pub fn format_holders(holders: &[CardHolder]) -> String {
    let mut output = String::new();

    if holders.is_empty() {
        writeln!(output, "No card holders registered.").unwrap();
        writeln!(output).unwrap();
        writeln!(
            output,
            "Hint: Run 'att holder set <card> --name <name>' to register one."
        )
        .unwrap();
        return output;
    }

    writeln!(
        output,
        "{:<15} {:<12} {:<10} {:>5} {:>7}",
        "Name", "Card ID", "Student", "Admin", "Offset"
    )
    .unwrap();
    writeln!(output, "{}", "-".repeat(53)).unwrap();
    for holder in holders {
        writeln!(
            output,
            "{:<15} {:<12} {:<10} {:>5} {:>6.2}H",
            holder.name,
            holder.card_id.as_str(),
            holder.student_number.as_deref().unwrap_or("-"),
            if holder.is_admin { "yes" } else { "no" },
            holder.offset_hours
        )
        .unwrap();
    }
    output
}
