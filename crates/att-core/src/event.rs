//! Card-tap events and the event kind enum.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::types::{CardId, ValidationError};

/// Whether a tap starts or ends a presence interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ClockIn,
    ClockOut,
}

impl EventKind {
    /// Integer code used by the attendance table.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::ClockIn => 1,
            Self::ClockOut => 2,
        }
    }

    /// Inverse of [`EventKind::code`].
    pub fn from_code(code: i64) -> Result<Self, ValidationError> {
        match code {
            1 => Ok(Self::ClockIn),
            2 => Ok(Self::ClockOut),
            other => Err(ValidationError::InvalidEventKind {
                value: other.to_string(),
            }),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClockIn => "clock_in",
            Self::ClockOut => "clock_out",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clock_in" | "in" => Ok(Self::ClockIn),
            "clock_out" | "out" => Ok(Self::ClockOut),
            _ => Err(ValidationError::InvalidEventKind {
                value: s.to_string(),
            }),
        }
    }
}

impl Serialize for EventKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A single card tap as recorded by the reader.
///
/// Timestamps are local wall-clock time; the system assumes one implicit
/// zone for every reader and report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceEvent {
    /// Insertion id assigned by the store. Breaks timestamp ties.
    pub id: i64,
    pub card_id: CardId,
    pub kind: EventKind,
    pub timestamp: NaiveDateTime,
}

impl AttendanceEvent {
    /// Calendar date the tap happened on.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// Sort key used everywhere events are ordered: timestamp, then insertion id.
    #[must_use]
    pub const fn order_key(&self) -> (NaiveDateTime, i64) {
        (self.timestamp, self.id)
    }
}
