//! Report command for business and other hours per holder.
//!
//! Implements `att report`, which prints a summary table, writes a CSV file,
//! or emits JSON for every registered holder over a date window.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use att_core::{
    BatchReport, FiscalHalf, HolderFailure, HolderReport, PairingDiagnostics, RecordStore,
    ReportFacade, ReportWindow, format_summary,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// How the report is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output<'a> {
    Summary { weekly: bool },
    Json,
    Csv(&'a Path),
}

/// Resolves the report window.
///
/// A missing start means the first day of the fiscal half containing `today`;
/// a missing end means `today`.
pub fn resolve_window(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<ReportWindow> {
    let start = start.unwrap_or_else(|| FiscalHalf::containing(today).first_day());
    let end = end.unwrap_or(today);
    ReportWindow::for_dates(start, end).context("invalid report window")
}

pub fn run<W: Write, S: RecordStore>(
    writer: &mut W,
    facade: &ReportFacade<S>,
    window: &ReportWindow,
    output: Output<'_>,
) -> Result<()> {
    match output {
        Output::Csv(path) => {
            let batch = facade
                .export_csv(window.start(), window.end(), path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            writeln!(
                writer,
                "Wrote {} holder(s) for {} to {}",
                batch.reports.len(),
                batch.window,
                path.display()
            )?;
            for failure in &batch.failures {
                writeln!(
                    writer,
                    "Skipped {} ({}): {}",
                    failure.name, failure.card_id, failure.error
                )?;
            }
        }
        Output::Json => {
            let batch = facade.generate_report(window.start(), window.end())?;
            let json = serde_json::to_string_pretty(&ReportJson::from(&batch))?;
            writeln!(writer, "{json}")?;
        }
        Output::Summary { weekly } => {
            let batch = facade.generate_report(window.start(), window.end())?;
            write!(writer, "{}", format_summary(&batch, weekly))?;
        }
    }
    Ok(())
}

// ========== JSON Output ==========

/// JSON view of a batch report, hours as floating point.
#[derive(Debug, Serialize)]
pub struct ReportJson<'a> {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub holders: Vec<HolderJson<'a>>,
    pub failures: &'a [HolderFailure],
}

#[derive(Debug, Serialize)]
pub struct HolderJson<'a> {
    pub card_id: &'a str,
    pub name: &'a str,
    pub business_hours: f64,
    pub other_hours: f64,
    pub total_hours: f64,
    pub offset_hours: f64,
    pub weekly: Vec<DayJson>,
    pub diagnostics: PairingDiagnostics,
}

#[derive(Debug, Serialize)]
pub struct DayJson {
    pub day: String,
    pub business_hours: f64,
    pub other_hours: f64,
}

impl<'a> From<&'a BatchReport> for ReportJson<'a> {
    fn from(batch: &'a BatchReport) -> Self {
        Self {
            start: batch.window.start(),
            end: batch.window.end(),
            holders: batch.reports.iter().map(HolderJson::from).collect(),
            failures: &batch.failures,
        }
    }
}

impl<'a> From<&'a HolderReport> for HolderJson<'a> {
    fn from(report: &'a HolderReport) -> Self {
        let totals = &report.totals;
        Self {
            card_id: report.holder.card_id.as_str(),
            name: &report.holder.name,
            business_hours: totals.business_hours(),
            other_hours: totals.other_hours(),
            total_hours: totals.total_hours(),
            offset_hours: totals.offset_hours(),
            weekly: report
                .weekly
                .iter()
                .map(|(day, bucket)| DayJson {
                    day: day.to_string(),
                    business_hours: bucket.business_hours(),
                    other_hours: bucket.other_hours(),
                })
                .collect(),
            diagnostics: report.diagnostics,
        }
    }
}
