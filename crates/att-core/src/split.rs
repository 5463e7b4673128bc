//! Interval splitter: divides a presence interval into business and other time.

use std::fmt;

use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::pairing::Pair;
use crate::types::ValidationError;

/// The daily business window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BusinessHours {
    start: NaiveTime,
    end: NaiveTime,
}

impl<'de> Deserialize<'de> for BusinessHours {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            start: NaiveTime,
            end: NaiveTime,
        }

        let raw = Raw::deserialize(deserializer)?;
        Self::new(raw.start, raw.end).map_err(serde::de::Error::custom)
    }
}

impl BusinessHours {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, ValidationError> {
        if start >= end {
            return Err(ValidationError::InvalidBusinessHours {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    #[must_use]
    pub const fn start(&self) -> NaiveTime {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> NaiveTime {
        self.end
    }
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(9, 0, 0).expect("09:00 is a valid time"),
            end: NaiveTime::from_hms_opt(17, 0, 0).expect("17:00 is a valid time"),
        }
    }
}

impl fmt::Display for BusinessHours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

/// Business and other time of a single pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaySplit {
    pub business: TimeDelta,
    pub other: TimeDelta,
}

impl Default for DaySplit {
    fn default() -> Self {
        Self {
            business: TimeDelta::zero(),
            other: TimeDelta::zero(),
        }
    }
}

impl DaySplit {
    #[must_use]
    pub fn total(&self) -> TimeDelta {
        self.business + self.other
    }

    #[must_use]
    pub fn business_seconds(&self) -> f64 {
        seconds(self.business)
    }

    #[must_use]
    pub fn other_seconds(&self) -> f64 {
        seconds(self.other)
    }
}

/// Converts a duration to floating-point seconds without going through milliseconds.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn seconds(delta: TimeDelta) -> f64 {
    delta.num_seconds() as f64 + f64::from(delta.subsec_nanos()) / 1e9
}

/// Converts a duration to floating-point hours.
pub(crate) fn hours(delta: TimeDelta) -> f64 {
    seconds(delta) / 3600.0
}

/// Splits `[t_in, t_out)` at the business-hours boundaries of `t_in`'s date.
///
/// Returns `None` when the interval runs backwards or crosses midnight; such
/// a pair is invalid and contributes nothing. `t_in == t_out` yields a zero
/// split. For valid input `business + other == t_out - t_in` exactly.
pub fn split_interval(
    t_in: NaiveDateTime,
    t_out: NaiveDateTime,
    hours: &BusinessHours,
) -> Option<DaySplit> {
    if t_out < t_in || t_in.date() != t_out.date() {
        return None;
    }

    let day = t_in.date();
    let open = day.and_time(hours.start);
    let close = day.and_time(hours.end);

    let mut split = DaySplit::default();
    let mut cur = t_in;
    while cur < t_out {
        let (next, in_business) = if cur < open {
            (open.min(t_out), false)
        } else if cur < close {
            (close.min(t_out), true)
        } else {
            (t_out, false)
        };

        let span = next - cur;
        if in_business {
            split.business += span;
        } else {
            split.other += span;
        }
        cur = next;
    }

    Some(split)
}

/// Splits a reconciled pair.
pub fn split_pair(pair: &Pair<'_>, hours: &BusinessHours) -> Option<DaySplit> {
    split_interval(pair.check_in.timestamp, pair.check_out.timestamp, hours)
}
