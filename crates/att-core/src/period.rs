//! Report windows and fiscal half-year periods.
//!
//! The fiscal year starts on April 1 and is reported in two halves:
//! April–September and October–March.

use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::report::ReportError;

/// An inclusive `[start, end]` reporting window in local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl ReportWindow {
    /// Rejects windows that end before they start.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, ReportError> {
        if end < start {
            return Err(ReportError::MalformedWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Window from the first to the last instant of the given dates.
    pub fn for_dates(start: NaiveDate, end: NaiveDate) -> Result<Self, ReportError> {
        Self::new(start.and_time(NaiveTime::MIN), end_of_day(end))
    }

    #[must_use]
    pub const fn start(&self) -> NaiveDateTime {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> NaiveDateTime {
        self.end
    }

    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.start.date() <= date && date <= self.end.date()
    }
}

impl fmt::Display for ReportWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ~ {}", self.start.date(), self.end.date())
    }
}

fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999).unwrap_or(NaiveTime::MIN))
}

/// Which half of the fiscal year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Half {
    /// April to September.
    First,
    /// October to March of the next calendar year.
    Second,
}

/// A fiscal half-year, identified by the calendar year its fiscal year starts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FiscalHalf {
    pub fiscal_year: i32,
    pub half: Half,
}

impl FiscalHalf {
    /// The fiscal half that `date` falls in.
    #[must_use]
    pub fn containing(date: NaiveDate) -> Self {
        let year = date.year();
        match date.month() {
            4..=9 => Self {
                fiscal_year: year,
                half: Half::First,
            },
            10..=12 => Self {
                fiscal_year: year,
                half: Half::Second,
            },
            _ => Self {
                fiscal_year: year - 1,
                half: Half::Second,
            },
        }
    }

    /// First day of the half.
    #[must_use]
    pub fn first_day(&self) -> NaiveDate {
        let (year, month) = match self.half {
            Half::First => (self.fiscal_year, 4),
            Half::Second => (self.fiscal_year, 10),
        };
        NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Last day of the half.
    #[must_use]
    pub fn last_day(&self) -> NaiveDate {
        let (year, month, day) = match self.half {
            Half::First => (self.fiscal_year, 9, 30),
            Half::Second => (self.fiscal_year + 1, 3, 31),
        };
        NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MAX)
    }

    /// The whole half as a report window.
    pub fn window(&self) -> Result<ReportWindow, ReportError> {
        ReportWindow::for_dates(self.first_day(), self.last_day())
    }
}

impl fmt::Display for FiscalHalf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let months = match self.half {
            Half::First => "Apr-Sep",
            Half::Second => "Oct-Mar",
        };
        write!(f, "FY{} {months}", self.fiscal_year)
    }
}

/// Both halves of the fiscal year containing `date`.
#[must_use]
pub fn fiscal_year_halves(date: NaiveDate) -> [FiscalHalf; 2] {
    let fiscal_year = FiscalHalf::containing(date).fiscal_year;
    [
        FiscalHalf {
            fiscal_year,
            half: Half::First,
        },
        FiscalHalf {
            fiscal_year,
            half: Half::Second,
        },
    ]
}

/// From the start of the current fiscal half to the end of `today`.
pub fn default_window(today: NaiveDate) -> Result<ReportWindow, ReportError> {
    ReportWindow::for_dates(FiscalHalf::containing(today).first_day(), today)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn reversed_window_is_malformed() {
        let result = ReportWindow::for_dates(date(2025, 6, 2), date(2025, 6, 1));
        assert!(matches!(result, Err(ReportError::MalformedWindow { .. })));
    }

    #[test]
    fn single_day_window_covers_whole_day() {
        let window = ReportWindow::for_dates(date(2025, 6, 2), date(2025, 6, 2)).unwrap();
        assert_eq!(window.start(), date(2025, 6, 2).and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(
            window.end(),
            date(2025, 6, 2).and_hms_micro_opt(23, 59, 59, 999_999).unwrap()
        );
        assert_eq!(window.to_string(), "2025-06-02 ~ 2025-06-02");
    }

    #[test]
    fn fiscal_half_boundaries() {
        assert_eq!(
            FiscalHalf::containing(date(2025, 4, 1)),
            FiscalHalf {
                fiscal_year: 2025,
                half: Half::First
            }
        );
        assert_eq!(
            FiscalHalf::containing(date(2025, 9, 30)).half,
            Half::First
        );
        assert_eq!(
            FiscalHalf::containing(date(2025, 10, 1)),
            FiscalHalf {
                fiscal_year: 2025,
                half: Half::Second
            }
        );
        assert_eq!(
            FiscalHalf::containing(date(2026, 3, 31)),
            FiscalHalf {
                fiscal_year: 2025,
                half: Half::Second
            }
        );
    }

    #[test]
    fn second_half_spans_new_year() {
        let half = FiscalHalf::containing(date(2026, 1, 15));
        assert_eq!(half.first_day(), date(2025, 10, 1));
        assert_eq!(half.last_day(), date(2026, 3, 31));
        assert_eq!(half.to_string(), "FY2025 Oct-Mar");
    }

    #[test]
    fn halves_of_fiscal_year_in_february() {
        let [first, second] = fiscal_year_halves(date(2026, 2, 10));
        assert_eq!(first.first_day(), date(2025, 4, 1));
        assert_eq!(first.last_day(), date(2025, 9, 30));
        assert_eq!(second.first_day(), date(2025, 10, 1));
    }

    #[test]
    fn default_window_runs_to_end_of_today() {
        let window = default_window(date(2025, 6, 15)).unwrap();
        assert_eq!(window.start().date(), date(2025, 4, 1));
        assert_eq!(window.end().date(), date(2025, 6, 15));
        assert!(window.contains_date(date(2025, 6, 15)));
        assert!(!window.contains_date(date(2025, 6, 16)));
    }
}
