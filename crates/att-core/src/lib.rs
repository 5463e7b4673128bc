//! Core domain logic for card-tap attendance.
//!
//! This crate contains the fundamental types and logic for:
//! - Pairing: reconciling CLOCK_OUT taps with the CLOCK_IN they close
//! - Splitting: dividing each pair into business-hours and other time
//! - Aggregation: bucketing split pairs by weekday
//! - Reporting: per-holder reports over a window, offsets, CSV output

pub mod event;
pub mod holder;
pub mod offset;
pub mod pairing;
pub mod period;
pub mod report;
pub mod split;
pub mod store;
pub mod types;
pub mod weekly;

pub use event::{AttendanceEvent, EventKind};
pub use holder::CardHolder;
pub use offset::{OFFSET_POLICY_VERSION, OffsetPolicy};
pub use pairing::{Pair, PairingDiagnostics, PairingOutcome, pair_events};
pub use period::{FiscalHalf, Half, ReportWindow, default_window, fiscal_year_halves};
pub use report::{
    BatchReport, HolderFailure, HolderReport, ReportError, ReportFacade, ReportTotals,
    compute_holder_report, format_summary, write_csv,
};
pub use split::{BusinessHours, DaySplit, split_interval};
pub use store::RecordStore;
pub use types::{CardId, ValidationError};
pub use weekly::{DayBucket, WEEKDAYS, WeeklyReport, aggregate_pairs};
