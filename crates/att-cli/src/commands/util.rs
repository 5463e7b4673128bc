//! Shared utilities for CLI commands.

use anyhow::Context;
use att_core::CardId;
use chrono::NaiveDateTime;

/// Accepted layouts for a local tap time, most precise first.
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a local datetime such as `2025-06-02 08:30` or `2025-06-02T08:30:15`.
pub fn parse_datetime(s: &str) -> anyhow::Result<NaiveDateTime> {
    let s = s.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .with_context(|| {
            format!("Invalid datetime: {s}. Use YYYY-MM-DD HH:MM[:SS] (e.g., 2025-06-02 08:30)")
        })
}

/// Parse a card ID argument.
pub fn parse_card(s: &str) -> anyhow::Result<CardId> {
    CardId::new(s.trim()).context("invalid card ID")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn expected(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 2)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    #[test]
    fn parses_space_and_t_separated() {
        assert_eq!(parse_datetime("2025-06-02 08:30").unwrap(), expected(8, 30, 0));
        assert_eq!(parse_datetime("2025-06-02T08:30:15").unwrap(), expected(8, 30, 15));
        assert_eq!(parse_datetime(" 2025-06-02 17:00:00 ").unwrap(), expected(17, 0, 0));
    }

    #[test]
    fn rejects_other_layouts() {
        let err = parse_datetime("yesterday").unwrap_err();
        assert!(err.to_string().starts_with("Invalid datetime: yesterday"));
        assert!(parse_datetime("2025-06-02").is_err());
    }

    #[test]
    fn blank_card_is_rejected() {
        assert!(parse_card("  ").is_err());
        assert_eq!(parse_card(" card-a ").unwrap().as_str(), "card-a");
    }
}
