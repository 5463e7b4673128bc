//! Confirm command: one holder's hours for both halves of the fiscal year.

use std::io::Write;

use anyhow::{Context, Result};
use att_core::{CardHolder, CardId, OffsetPolicy, RecordStore, ReportFacade, fiscal_year_halves};
use chrono::NaiveDate;

/// Name shown for a card with no registry entry.
const UNKNOWN_HOLDER: &str = "Unknown";

pub fn run<W: Write, S: RecordStore>(
    writer: &mut W,
    facade: &ReportFacade<S>,
    card_id: &CardId,
    today: NaiveDate,
) -> Result<()> {
    let holder = facade
        .store()
        .get_holder(card_id)
        .with_context(|| format!("failed to look up {card_id}"))?
        .unwrap_or_else(|| CardHolder::new(card_id.clone(), UNKNOWN_HOLDER));

    writeln!(writer, "Name: {} ({})", holder.name, holder.card_id)?;
    let halves = fiscal_year_halves(today);
    // The offset is a per-year correction, so it lands on the first half only.
    let policy = match facade.offset_policy() {
        OffsetPolicy::ReportTotal => OffsetPolicy::Anchored {
            date: halves[0].first_day(),
        },
        other => *other,
    };

    writeln!(writer, "{:<16} {:>10} {:>10}", "Period", "9-17", "Other")?;
    for half in halves {
        let window = half.window()?;
        let report = facade.holder_report_with_policy(&holder, &window, &policy)?;
        writeln!(
            writer,
            "{:<16} {:>9.2}H {:>9.2}H",
            half.to_string(),
            report.totals.business_hours(),
            report.totals.other_hours()
        )?;
    }
    Ok(())
}
