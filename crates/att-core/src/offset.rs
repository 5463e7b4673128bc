//! Holder offset policy.
//!
//! A holder's offset is a manual correction in hours that is added to one
//! aggregate business-hours total. It is never spread across weekday buckets
//! and never touches other hours. Which report receives it is decided by an
//! explicit [`OffsetPolicy`] rather than by the caller.

use chrono::{NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::holder::CardHolder;
use crate::period::ReportWindow;

/// Revision of the offset semantics implemented by [`OffsetPolicy`].
pub const OFFSET_POLICY_VERSION: u32 = 1;

/// Largest correction accepted, in hours (about 114 years).
const MAX_OFFSET_HOURS: f64 = 1_000_000.0;

/// Where a holder's offset is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum OffsetPolicy {
    /// Added to the business total of every report.
    #[default]
    ReportTotal,
    /// Added only to the report whose window contains `date`.
    Anchored { date: NaiveDate },
    /// Offsets are ignored.
    None,
}

impl OffsetPolicy {
    #[must_use]
    pub const fn version(&self) -> u32 {
        OFFSET_POLICY_VERSION
    }

    /// Whether a report over `window` receives the offset.
    #[must_use]
    pub fn applies_to(&self, window: &ReportWindow) -> bool {
        match self {
            Self::ReportTotal => true,
            Self::Anchored { date } => window.contains_date(*date),
            Self::None => false,
        }
    }

    /// The correction to add to the holder's business total for `window`.
    #[must_use]
    pub fn offset_for(&self, holder: &CardHolder, window: &ReportWindow) -> TimeDelta {
        if !self.applies_to(window) {
            return TimeDelta::zero();
        }
        offset_delta(holder.offset_hours).unwrap_or_else(|| {
            tracing::warn!(
                card_id = %holder.card_id,
                offset_hours = holder.offset_hours,
                "ignoring out-of-range offset"
            );
            TimeDelta::zero()
        })
    }
}

/// Converts an offset in hours to an exact duration at microsecond resolution.
///
/// Returns `None` for NaN, infinite or absurdly large offsets.
#[allow(clippy::cast_possible_truncation)]
pub fn offset_delta(hours: f64) -> Option<TimeDelta> {
    if !hours.is_finite() || hours.abs() > MAX_OFFSET_HOURS {
        return None;
    }
    Some(TimeDelta::microseconds((hours * 3_600_000_000.0).round() as i64))
}
