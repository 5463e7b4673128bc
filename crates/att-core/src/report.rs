//! Report facade: drives pairing, splitting and aggregation per holder.
//!
//! The facade owns an injected [`RecordStore`] handle and recomputes every
//! report from the raw event log on each call. Nothing is cached and nothing
//! is written back to the store.
//!
//! # Pipeline
//!
//! 1. Validate the window (`end >= start`) before any query.
//! 2. List holders, then fetch each holder's events. A holder whose fetch
//!    fails is recorded as a [`HolderFailure`] and the batch continues.
//! 3. Pair, split and aggregate every holder in parallel.
//! 4. Add the holder offset to the business total per [`OffsetPolicy`].

use std::fmt::Write as _;
use std::io;
use std::path::Path;

use chrono::{NaiveDateTime, TimeDelta};
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

use crate::event::AttendanceEvent;
use crate::holder::CardHolder;
use crate::offset::OffsetPolicy;
use crate::pairing::{PairingDiagnostics, pair_events};
use crate::period::ReportWindow;
use crate::split::{BusinessHours, hours, seconds};
use crate::store::RecordStore;
use crate::types::CardId;
use crate::weekly::{WEEKDAYS, WeeklyReport, aggregate_pairs};

/// Report errors.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The window ends before it starts.
    #[error("malformed report window: end {end} is before start {start}")]
    MalformedWindow {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    /// The holder registry could not be read.
    #[error("record store unavailable: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// Writing the CSV report failed.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    /// An I/O error while writing a report.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Totals for one holder, in exact durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportTotals {
    /// Business time including the applied offset.
    pub business: TimeDelta,
    pub other: TimeDelta,
    /// The offset folded into `business`.
    pub offset: TimeDelta,
}

impl ReportTotals {
    #[must_use]
    pub fn business_seconds(&self) -> f64 {
        seconds(self.business)
    }

    #[must_use]
    pub fn other_seconds(&self) -> f64 {
        seconds(self.other)
    }

    #[must_use]
    pub fn business_hours(&self) -> f64 {
        hours(self.business)
    }

    #[must_use]
    pub fn other_hours(&self) -> f64 {
        hours(self.other)
    }

    #[must_use]
    pub fn offset_hours(&self) -> f64 {
        hours(self.offset)
    }

    #[must_use]
    pub fn total_hours(&self) -> f64 {
        self.business_hours() + self.other_hours()
    }
}

/// The computed report of one holder.
#[derive(Debug, Clone, PartialEq)]
pub struct HolderReport {
    pub holder: CardHolder,
    pub weekly: WeeklyReport,
    pub totals: ReportTotals,
    pub diagnostics: PairingDiagnostics,
}

/// A holder whose events could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HolderFailure {
    pub card_id: CardId,
    pub name: String,
    pub error: String,
}

/// Reports for every holder that could be computed, plus the ones that could not.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub window: ReportWindow,
    pub reports: Vec<HolderReport>,
    pub failures: Vec<HolderFailure>,
}

impl BatchReport {
    /// Sum of business and other hours across all computed holders.
    #[must_use]
    pub fn grand_total(&self) -> ReportTotals {
        let zero = ReportTotals {
            business: TimeDelta::zero(),
            other: TimeDelta::zero(),
            offset: TimeDelta::zero(),
        };
        self.reports.iter().fold(zero, |acc, report| ReportTotals {
            business: acc.business + report.totals.business,
            other: acc.other + report.totals.other,
            offset: acc.offset + report.totals.offset,
        })
    }
}

/// Runs the pipeline over one holder's events.
///
/// Pure: the same events, window, holder and policy always give the same report.
pub fn compute_holder_report(
    holder: &CardHolder,
    events: &[AttendanceEvent],
    window: &ReportWindow,
    business_hours: &BusinessHours,
    policy: &OffsetPolicy,
) -> HolderReport {
    let outcome = pair_events(events);
    let aggregate = aggregate_pairs(&outcome.pairs, business_hours);

    let diagnostics = PairingDiagnostics {
        invalid_pairs: aggregate.invalid_pairs,
        ..outcome.diagnostics
    };
    if !diagnostics.is_clean() {
        tracing::debug!(
            card_id = %holder.card_id,
            unmatched_clock_in = diagnostics.unmatched_clock_in,
            unmatched_clock_out = diagnostics.unmatched_clock_out,
            invalid_pairs = diagnostics.invalid_pairs,
            "dropped taps that did not pair"
        );
    }

    let flat = aggregate.weekly.total();
    let offset = policy.offset_for(holder, window);

    HolderReport {
        holder: holder.clone(),
        weekly: aggregate.weekly,
        totals: ReportTotals {
            business: flat.business + offset,
            other: flat.other,
            offset,
        },
        diagnostics,
    }
}

/// Builds attendance reports from an injected record store.
#[derive(Debug, Clone)]
pub struct ReportFacade<S> {
    store: S,
    business_hours: BusinessHours,
    offset_policy: OffsetPolicy,
}

impl<S: RecordStore> ReportFacade<S> {
    /// Creates a facade with 09:00-17:00 business hours and the default offset policy.
    pub fn new(store: S) -> Self {
        Self {
            store,
            business_hours: BusinessHours::default(),
            offset_policy: OffsetPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_business_hours(mut self, business_hours: BusinessHours) -> Self {
        self.business_hours = business_hours;
        self
    }

    #[must_use]
    pub fn with_offset_policy(mut self, offset_policy: OffsetPolicy) -> Self {
        self.offset_policy = offset_policy;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub const fn offset_policy(&self) -> &OffsetPolicy {
        &self.offset_policy
    }

    /// Report for a single holder over `window`.
    pub fn holder_report(
        &self,
        holder: &CardHolder,
        window: &ReportWindow,
    ) -> Result<HolderReport, ReportError> {
        self.holder_report_with_policy(holder, window, &self.offset_policy)
    }

    /// Like [`Self::holder_report`], but with `policy` overriding the configured one.
    pub fn holder_report_with_policy(
        &self,
        holder: &CardHolder,
        window: &ReportWindow,
        policy: &OffsetPolicy,
    ) -> Result<HolderReport, ReportError> {
        let events = self
            .store
            .fetch(&holder.card_id, window.start(), window.end())
            .map_err(|e| ReportError::Store(Box::new(e)))?;
        Ok(compute_holder_report(
            holder,
            &events,
            window,
            &self.business_hours,
            policy,
        ))
    }

    /// Reports for every registered holder over `[start, end]`.
    pub fn generate_report(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<BatchReport, ReportError> {
        let window = ReportWindow::new(start, end)?;
        self.report_for_window(&window)
    }

    /// Reports for every registered holder over an already validated window.
    pub fn report_for_window(&self, window: &ReportWindow) -> Result<BatchReport, ReportError> {
        let holders = self
            .store
            .list_holders()
            .map_err(|e| ReportError::Store(Box::new(e)))?;
        tracing::debug!(holder_count = holders.len(), %window, "generating report");

        // The store handle need not be shareable across threads, so reads stay here.
        let mut fetched = Vec::with_capacity(holders.len());
        let mut failures = Vec::new();
        for holder in holders {
            match self.store.fetch(&holder.card_id, window.start(), window.end()) {
                Ok(events) => fetched.push((holder, events)),
                Err(err) => {
                    tracing::warn!(
                        card_id = %holder.card_id,
                        error = %err,
                        "skipping holder: record store unavailable"
                    );
                    failures.push(HolderFailure {
                        card_id: holder.card_id,
                        name: holder.name,
                        error: err.to_string(),
                    });
                }
            }
        }

        let business_hours = &self.business_hours;
        let policy = &self.offset_policy;
        let reports: Vec<HolderReport> = fetched
            .par_iter()
            .map(|(holder, events)| {
                compute_holder_report(holder, events, window, business_hours, policy)
            })
            .collect();

        Ok(BatchReport {
            window: *window,
            reports,
            failures,
        })
    }

    /// Generates the report and writes it as CSV to `path`, replacing any existing file.
    pub fn export_csv(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        path: &Path,
    ) -> Result<BatchReport, ReportError> {
        let batch = self.generate_report(start, end)?;
        let writer = csv::Writer::from_path(path)?;
        write_csv(&batch.reports, writer)?;
        tracing::info!(path = %path.display(), rows = batch.reports.len(), "wrote csv report");
        Ok(batch)
    }
}

/// CSV header: totals followed by business/other per weekday.
pub fn csv_header() -> Vec<String> {
    let mut header: Vec<String> = [
        "name",
        "card_id",
        "business_hours",
        "other_hours",
        "total_hours",
    ]
    .iter()
    .map(ToString::to_string)
    .collect();
    for day in WEEKDAYS {
        let day = day.to_string().to_lowercase();
        header.push(format!("{day}_business"));
        header.push(format!("{day}_other"));
    }
    header
}

/// Writes one row per holder, hour values with two decimals.
pub fn write_csv<W: io::Write>(
    reports: &[HolderReport],
    mut writer: csv::Writer<W>,
) -> Result<(), ReportError> {
    writer.write_record(csv_header())?;
    for report in reports {
        let totals = &report.totals;
        let mut row = vec![
            report.holder.name.clone(),
            report.holder.card_id.to_string(),
            format!("{:.2}", totals.business_hours()),
            format!("{:.2}", totals.other_hours()),
            format!("{:.2}", totals.total_hours()),
        ];
        for (_, bucket) in report.weekly.iter() {
            row.push(format!("{:.2}", bucket.business_hours()));
            row.push(format!("{:.2}", bucket.other_hours()));
        }
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Width of the summary table.
const SUMMARY_WIDTH: usize = 52;

/// Human-readable summary: one row per holder and a grand total, hours with one decimal.
pub fn format_summary(batch: &BatchReport, weekly_detail: bool) -> String {
    let mut output = String::new();
    let rule = "-".repeat(SUMMARY_WIDTH);

    writeln!(output, "=== Attendance report ({}) ===", batch.window).unwrap();
    writeln!(output).unwrap();
    writeln!(
        output,
        "{:<15} {:<12} {:>7} {:>7} {:>7}",
        "Name", "Card ID", "9-17", "Other", "Total"
    )
    .unwrap();
    writeln!(output, "{rule}").unwrap();

    for report in &batch.reports {
        let totals = &report.totals;
        writeln!(
            output,
            "{:<15} {:<12} {:>6.1}H {:>6.1}H {:>6.1}H",
            report.holder.name,
            report.holder.card_id.as_str(),
            totals.business_hours(),
            totals.other_hours(),
            totals.total_hours()
        )
        .unwrap();
        if weekly_detail {
            for (day, bucket) in report.weekly.iter().filter(|(_, b)| !b.is_empty()) {
                writeln!(
                    output,
                    "    {day}: 9-17 {:.1}H, other {:.1}H",
                    bucket.business_hours(),
                    bucket.other_hours()
                )
                .unwrap();
            }
        }
    }

    let grand = batch.grand_total();
    writeln!(output, "{rule}").unwrap();
    writeln!(
        output,
        "{:<15} {:<12} {:>6.1}H {:>6.1}H {:>6.1}H",
        "Total",
        "",
        grand.business_hours(),
        grand.other_hours(),
        grand.total_hours()
    )
    .unwrap();

    if !batch.failures.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "Skipped {} holder(s):", batch.failures.len()).unwrap();
        for failure in &batch.failures {
            writeln!(
                output,
                "  {} ({}): {}",
                failure.name, failure.card_id, failure.error
            )
            .unwrap();
        }
    }

    output
}
